//! Cooperative blind rotation: one launch, grid barriers between the phases of a step.

use super::{decompose_polynomial_level, RotationOperands, RotationStep, Slots};
use crate::core_crypto::algorithms::polynomial_algorithms::{
    polynomial_wrapping_add_assign, polynomial_wrapping_mul,
};
use crate::core_crypto::gpu::pbs::plan::SlotLayout;
use tfhe_gpu_sim::{BlockContext, GpuVec, Kernel};

const ACCUMULATOR_SLOT: usize = 0;
const DIGITS_SLOT: usize = 1;

/// Every step of a classical batch, or of a multi bit chunk, in one cooperative launch.
///
/// Grid `(level, glwe_size, batch)`. For each step, block `(j, r, s)` writes the products of its
/// digit polynomial with the GGSW row `(j, r)` to `join[s][j][r]`, then after a grid barrier
/// block `(0, c, s)` sums column `c` of the join buffer into row `c` of the accumulator. A
/// second barrier closes the step. Every block reaches both barriers of every step, including
/// the steps a CMux skips.
pub(crate) struct CooperativeRotationKernel {
    pub operands: RotationOperands,
    pub join: GpuVec,
    pub slots: SlotLayout,
    pub steps: Vec<RotationStep>,
}

impl CooperativeRotationKernel {
    fn join_offset(&self, s: usize, level_index: usize, row: usize, column: usize) -> usize {
        let dims = &self.operands.dims;
        (((s * dims.level_count + level_index) * dims.glwe_size + row) * dims.glwe_size + column)
            * dims.polynomial_size
    }
}

impl Kernel for CooperativeRotationKernel {
    fn name(&self) -> &'static str {
        "pbs_cooperative_rotation"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let (level_index, row, s) = ctx.block_idx();
        let (level_index, row, s) = (level_index as usize, row as usize, s as usize);
        let operands = &self.operands;
        let dims = &operands.dims;
        let decomposer = dims.decomposer();
        let slots = Slots::new(ctx, &operands.scratch, self.slots, dims.polynomial_size);

        let mut acc_row = vec![0u64; dims.polynomial_size];
        let mut polynomial = vec![0u64; dims.polynomial_size];
        let mut ggsw_polynomial = vec![0u64; dims.polynomial_size];

        for &step in self.steps.iter() {
            let skipped = operands.skips(s, step);

            if !skipped {
                operands
                    .accumulator
                    .load(dims.accumulator_offset(s, row), &mut polynomial);
                slots.store(ACCUMULATOR_SLOT, &polynomial);
                slots.load(ACCUMULATOR_SLOT, &mut acc_row);
                operands.decomposition_input(s, step, &acc_row, &mut polynomial);
                decompose_polynomial_level(&decomposer, &polynomial, level_index, &mut acc_row);
                slots.store(DIGITS_SLOT, &acc_row);

                slots.load(DIGITS_SLOT, &mut polynomial);
                for column in 0..dims.glwe_size {
                    operands.load_ggsw_polynomial(
                        s,
                        step,
                        level_index,
                        row,
                        column,
                        &mut ggsw_polynomial,
                    );
                    polynomial_wrapping_mul(&mut acc_row, &ggsw_polynomial, &polynomial);
                    self.join
                        .store(self.join_offset(s, level_index, row, column), &acc_row);
                }
            }
            ctx.grid_sync();

            if !skipped && level_index == 0 {
                let column = row;
                let mut product = vec![0u64; dims.polynomial_size];
                for partial_level in 0..dims.level_count {
                    for partial_row in 0..dims.glwe_size {
                        self.join.load(
                            self.join_offset(s, partial_level, partial_row, column),
                            &mut polynomial,
                        );
                        polynomial_wrapping_add_assign(&mut product, &polynomial);
                    }
                }
                let acc_offset = dims.accumulator_offset(s, column);
                operands.accumulator.load(acc_offset, &mut acc_row);
                operands.fold_product(step, &mut acc_row, &product);
                operands.accumulator.store(acc_offset, &acc_row);
            }
            ctx.grid_sync();
        }
    }
}
