//! Thread block cluster blind rotation: one cluster per ciphertext, partial products exchanged
//! through distributed shared memory.

use super::{decompose_polynomial_level, RotationOperands, RotationStep};
use crate::core_crypto::algorithms::polynomial_algorithms::{
    polynomial_wrapping_add_assign, polynomial_wrapping_mul,
};
use tfhe_gpu_sim::{BlockContext, Kernel};

/// Every step of a classical batch, or of a multi bit chunk, in one cluster launch.
///
/// Grid `(level, glwe_size, batch)` with clusters `(level, glwe_size, 1)`: one cluster per
/// ciphertext, block `(j, r)` of rank `j + r * level`. Shared memory holds `1 + glwe_size`
/// polynomials. Slot 0 of block `(0, r)` keeps row `r` of the accumulator for the whole launch,
/// slot `1 + c` of every block receives its product for column `c`, read by block `(0, c)`
/// through distributed shared memory.
pub(crate) struct ClusterRotationKernel {
    pub operands: RotationOperands,
    pub steps: Vec<RotationStep>,
}

impl Kernel for ClusterRotationKernel {
    fn name(&self) -> &'static str {
        "pbs_cluster_rotation"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let (level_index, row, s) = ctx.block_idx();
        let (level_index, row, s) = (level_index as usize, row as usize, s as usize);
        let operands = &self.operands;
        let dims = &operands.dims;
        let n = dims.polynomial_size;
        let decomposer = dims.decomposer();
        let shared = ctx.shared();
        let rank_of = |level_index: usize, row: usize| level_index + row * dims.level_count;
        debug_assert_eq!(ctx.cluster_rank(), rank_of(level_index, row));

        let mut acc_row = vec![0u64; n];
        let mut polynomial = vec![0u64; n];
        let mut ggsw_polynomial = vec![0u64; n];

        if level_index == 0 {
            operands
                .accumulator
                .load(dims.accumulator_offset(s, row), &mut acc_row);
            shared.store(0, &acc_row);
        }
        ctx.cluster_sync();

        for &step in self.steps.iter() {
            let skipped = operands.skips(s, step);

            if !skipped {
                ctx.cluster_shared(rank_of(0, row)).load(0, &mut acc_row);
                operands.decomposition_input(s, step, &acc_row, &mut polynomial);
                decompose_polynomial_level(&decomposer, &polynomial, level_index, &mut acc_row);
                for column in 0..dims.glwe_size {
                    operands.load_ggsw_polynomial(
                        s,
                        step,
                        level_index,
                        row,
                        column,
                        &mut ggsw_polynomial,
                    );
                    polynomial_wrapping_mul(&mut polynomial, &ggsw_polynomial, &acc_row);
                    shared.store((1 + column) * n, &polynomial);
                }
            }
            ctx.cluster_sync();

            if !skipped && level_index == 0 {
                let column = row;
                let mut product = vec![0u64; n];
                for partial_row in 0..dims.glwe_size {
                    for partial_level in 0..dims.level_count {
                        ctx.cluster_shared(rank_of(partial_level, partial_row))
                            .load((1 + column) * n, &mut polynomial);
                        polynomial_wrapping_add_assign(&mut product, &polynomial);
                    }
                }
                shared.load(0, &mut acc_row);
                operands.fold_product(step, &mut acc_row, &product);
                shared.store(0, &acc_row);
            }
            ctx.cluster_sync();
        }

        if level_index == 0 {
            shared.load(0, &mut acc_row);
            operands
                .accumulator
                .store(dims.accumulator_offset(s, row), &acc_row);
        }
    }
}
