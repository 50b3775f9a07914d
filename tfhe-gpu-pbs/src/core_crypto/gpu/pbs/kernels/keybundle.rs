use super::{load_group_mask, RotationOperands, Slots};
use crate::core_crypto::algorithms::lwe_multi_bit_programmable_bootstrapping::multi_bit_monomial_degree;
use crate::core_crypto::algorithms::polynomial_algorithms::{
    polynomial_wrapping_add_assign, polynomial_wrapping_monic_monomial_mul_assign,
};
use crate::core_crypto::commons::parameters::{MonomialDegree, PolynomialSize};
use crate::core_crypto::gpu::pbs::plan::SlotLayout;
use tfhe_gpu_sim::{BlockContext, Kernel};

/// Keybundles `KB_t = sum_g X^{d_g} * GGSW_{t,g}` of the groups of one chunk.
///
/// Grid `(chunk length, level * glwe_size, batch)`, block `(t, jr, s)` writes the GGSW row
/// `(jr / glwe_size, jr % glwe_size)` of the keybundle of group `first_group + t` for `s`.
pub(crate) struct KeybundleKernel {
    pub operands: RotationOperands,
    pub slots: SlotLayout,
    pub first_group: usize,
}

impl Kernel for KeybundleKernel {
    fn name(&self) -> &'static str {
        "pbs_multi_bit_keybundle"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let (group_in_chunk, level_row, s) = ctx.block_idx();
        let (group_in_chunk, level_row, s) =
            (group_in_chunk as usize, level_row as usize, s as usize);
        let operands = &self.operands;
        let dims = &operands.dims;
        let n = dims.polynomial_size;
        let level_index = level_row / dims.glwe_size;
        let row = level_row % dims.glwe_size;
        let group = self.first_group + group_in_chunk;
        let ggsw_per_group = 1 << dims.grouping_factor;

        let mut mask = vec![0u64; dims.grouping_factor];
        load_group_mask(operands, s, group, &mut mask);
        let slots = Slots::new(ctx, &operands.scratch, self.slots, n);

        let mut sum = vec![0u64; n];
        let mut rotated = vec![0u64; n];
        let keybundle =
            (s * dims.lwe_chunk_size + group_in_chunk) * dims.ggsw_size();
        for column in 0..dims.glwe_size {
            let in_ggsw = dims.ggsw_polynomial_offset(level_index, row, column);
            // The first term always has a zero degree
            operands
                .bsk
                .load(group * ggsw_per_group * dims.ggsw_size() + in_ggsw, &mut sum);
            slots.store(0, &sum);
            for ggsw_index in 1..ggsw_per_group {
                let degree = multi_bit_monomial_degree(&mask, ggsw_index, PolynomialSize(n));
                operands.bsk.load(
                    (group * ggsw_per_group + ggsw_index) * dims.ggsw_size() + in_ggsw,
                    &mut rotated,
                );
                polynomial_wrapping_monic_monomial_mul_assign(&mut rotated, MonomialDegree(degree));
                slots.load(0, &mut sum);
                polynomial_wrapping_add_assign(&mut sum, &rotated);
                slots.store(0, &sum);
            }
            slots.load(0, &mut sum);
            operands.keybundle.store(keybundle + in_ggsw, &sum);
        }
    }
}
