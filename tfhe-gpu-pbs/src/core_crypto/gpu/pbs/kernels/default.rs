//! Two launches per rotation step, ordered by the stream.

use super::{decompose_polynomial_level, RotationOperands, RotationStep, Slots};
use crate::core_crypto::algorithms::polynomial_algorithms::polynomial_wrapping_add_mul_assign;
use crate::core_crypto::gpu::pbs::plan::SlotLayout;
use tfhe_gpu_sim::{BlockContext, GpuVec, Kernel};

/// Decomposition of the step input.
///
/// Grid `(level, glwe_size, batch)`, block `(j, r, s)` writes the digit polynomial of level index
/// `j` of row `r` to `digits[s][r][j]`.
pub(crate) struct StepOneKernel {
    pub operands: RotationOperands,
    pub digits: GpuVec,
    pub slots: SlotLayout,
    pub step: RotationStep,
}

impl Kernel for StepOneKernel {
    fn name(&self) -> &'static str {
        "pbs_default_step_one"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let (level_index, row, s) = ctx.block_idx();
        let (level_index, row, s) = (level_index as usize, row as usize, s as usize);
        let operands = &self.operands;
        let dims = &operands.dims;
        if operands.skips(s, self.step) {
            return;
        }

        let slots = Slots::new(ctx, &operands.scratch, self.slots, dims.polynomial_size);
        let mut acc_row = vec![0u64; dims.polynomial_size];
        let mut polynomial = vec![0u64; dims.polynomial_size];
        operands
            .accumulator
            .load(dims.accumulator_offset(s, row), &mut acc_row);
        operands.decomposition_input(s, self.step, &acc_row, &mut polynomial);
        slots.store(0, &polynomial);

        slots.load(0, &mut acc_row);
        decompose_polynomial_level(&dims.decomposer(), &acc_row, level_index, &mut polynomial);
        let offset = ((s * dims.glwe_size + row) * dims.level_count + level_index)
            * dims.polynomial_size;
        self.digits.store(offset, &polynomial);
    }
}

/// Products of the digits with the GGSW and accumulation.
///
/// Grid `(glwe_size, batch)`, block `(c, s)` computes column `c` of the external product and
/// folds it into row `c` of the accumulator of `s`.
pub(crate) struct StepTwoKernel {
    pub operands: RotationOperands,
    pub digits: GpuVec,
    pub slots: SlotLayout,
    pub step: RotationStep,
}

impl Kernel for StepTwoKernel {
    fn name(&self) -> &'static str {
        "pbs_default_step_two"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let (column, s, _) = ctx.block_idx();
        let (column, s) = (column as usize, s as usize);
        let operands = &self.operands;
        let dims = &operands.dims;
        if operands.skips(s, self.step) {
            return;
        }

        let slots = Slots::new(ctx, &operands.scratch, self.slots, dims.polynomial_size);
        let mut digit = vec![0u64; dims.polynomial_size];
        let mut ggsw_polynomial = vec![0u64; dims.polynomial_size];
        let mut product = vec![0u64; dims.polynomial_size];
        for row in 0..dims.glwe_size {
            for level_index in 0..dims.level_count {
                let offset = ((s * dims.glwe_size + row) * dims.level_count + level_index)
                    * dims.polynomial_size;
                self.digits.load(offset, &mut digit);
                operands.load_ggsw_polynomial(
                    s,
                    self.step,
                    level_index,
                    row,
                    column,
                    &mut ggsw_polynomial,
                );
                polynomial_wrapping_add_mul_assign(&mut product, &ggsw_polynomial, &digit);
            }
        }
        slots.store(0, &product);

        let mut acc_row = vec![0u64; dims.polynomial_size];
        let acc_offset = dims.accumulator_offset(s, column);
        operands.accumulator.load(acc_offset, &mut acc_row);
        slots.load(0, &mut product);
        operands.fold_product(self.step, &mut acc_row, &product);
        operands.accumulator.store(acc_offset, &acc_row);
    }
}
