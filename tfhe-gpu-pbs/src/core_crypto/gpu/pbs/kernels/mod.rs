//! Block programs of the bootstrap.
//!
//! Device buffers are flat arrays of `u64`, laid out as follows (`s` is the position of a
//! ciphertext in the batch, `r` a GLWE row, `c` a GLWE column, `j` a decomposition level index,
//! level index 0 being level 1):
//!
//! ```text
//!  accumulator   [s][r][N]
//!  digits        [s][r][j][N]
//!  join          [s][j][r][c][N]
//!  keybundle     [s][group in chunk][j][r][c][N]
//!  bsk           [mask index][j][r][c][N]
//!  multi bit bsk [group][ggsw index][j][r][c][N]
//!  ksk           [input coefficient][j][n_out + 1]
//! ```

pub(crate) mod cluster;
pub(crate) mod cooperative;
pub(crate) mod default;
pub(crate) mod init;
pub(crate) mod keybundle;
pub(crate) mod keyswitch;
pub(crate) mod sample_extraction;
pub(crate) mod scatter;

use crate::core_crypto::algorithms::lwe_programmable_bootstrapping::pbs_modulus_switch;
use crate::core_crypto::algorithms::polynomial_algorithms::*;
use crate::core_crypto::commons::math::decomposition::SignedDecomposer;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::gpu::pbs::plan::{KernelGeometry, SlotLayout};
use std::sync::{Arc, PoisonError};
use tfhe_gpu_sim::{BlockContext, GpuVec, Kernel, LaunchMode, SharedMemory, Stream};

/// Enqueue `kernel` on `stream` with the launch geometry `geometry`.
///
/// Cooperative and cluster grids need every one of their blocks resident at once: such launches
/// take the exclusive launch slot of the device, so that two of them never share the device.
pub(crate) fn enqueue_kernel(stream: &Stream, geometry: &KernelGeometry, kernel: Arc<dyn Kernel>) {
    let config = geometry.launch_config();
    let mode = geometry.mode;
    match mode {
        LaunchMode::Regular => stream.launch(config, mode, kernel),
        LaunchMode::Cooperative | LaunchMode::Cluster { .. } => stream.enqueue(move |executor| {
            let slot = executor.device().exclusive_launch_slot();
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            executor.execute(&config, &mode, kernel.as_ref())
        }),
    }
}

/// Row major linear index of the block in its grid.
pub(crate) fn block_linear_index(ctx: &BlockContext<'_>) -> usize {
    let (x, y, z) = ctx.block_idx();
    let (grid_x, grid_y, _) = ctx.grid_dim();
    x as usize + grid_x as usize * (y as usize + grid_y as usize * z as usize)
}

/// Polynomial slots of a block, in shared memory or spilled to the global scratch buffer.
pub(crate) struct Slots<'a> {
    shared: &'a SharedMemory,
    scratch: &'a GpuVec,
    layout: SlotLayout,
    polynomial_size: usize,
    block: usize,
}

impl<'a> Slots<'a> {
    pub(crate) fn new(
        ctx: &'a BlockContext<'_>,
        scratch: &'a GpuVec,
        layout: SlotLayout,
        polynomial_size: usize,
    ) -> Self {
        Self {
            shared: ctx.shared(),
            scratch,
            layout,
            polynomial_size,
            block: block_linear_index(ctx),
        }
    }

    fn scratch_offset(&self, slot: usize) -> usize {
        (self.block * self.layout.total_slots + slot) * self.polynomial_size
    }

    pub(crate) fn load(&self, slot: usize, dst: &mut [u64]) {
        debug_assert!(slot < self.layout.total_slots);
        if slot < self.layout.shared_slots {
            self.shared.load(slot * self.polynomial_size, dst);
        } else {
            self.scratch.load(self.scratch_offset(slot), dst);
        }
    }

    pub(crate) fn store(&self, slot: usize, src: &[u64]) {
        debug_assert!(slot < self.layout.total_slots);
        if slot < self.layout.shared_slots {
            self.shared.store(slot * self.polynomial_size, src);
        } else {
            self.scratch.store(self.scratch_offset(slot), src);
        }
    }
}

/// Shapes shared by the kernels of a batch.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PbsDims {
    pub lwe_dimension: usize,
    pub glwe_size: usize,
    pub polynomial_size: usize,
    pub base_log: DecompositionBaseLog,
    pub level_count: usize,
    /// Zero for a classical key.
    pub grouping_factor: usize,
    /// Groups per multi bit chunk, the stride of the keybundle buffer.
    pub lwe_chunk_size: usize,
}

impl PbsDims {
    pub(crate) fn lwe_size(&self) -> usize {
        self.lwe_dimension + 1
    }

    pub(crate) fn glwe_words(&self) -> usize {
        self.glwe_size * self.polynomial_size
    }

    pub(crate) fn ggsw_size(&self) -> usize {
        self.level_count * self.glwe_size * self.glwe_words()
    }

    pub(crate) fn ggsw_polynomial_offset(&self, level_index: usize, row: usize, column: usize) -> usize {
        ((level_index * self.glwe_size + row) * self.glwe_size + column) * self.polynomial_size
    }

    pub(crate) fn accumulator_offset(&self, s: usize, row: usize) -> usize {
        (s * self.glwe_size + row) * self.polynomial_size
    }

    pub(crate) fn decomposer(&self) -> SignedDecomposer {
        SignedDecomposer::new(self.base_log, DecompositionLevelCount(self.level_count))
    }
}

/// One step of the blind rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RotationStep {
    /// CMux on the mask coefficient `mask_index`.
    Classical { mask_index: usize },
    /// External product with the keybundle `group_in_chunk` of the current chunk.
    MultiBit { group_in_chunk: usize },
}

/// The device memory the rotation kernels read and write.
#[derive(Clone, Debug)]
pub(crate) struct RotationOperands {
    pub dims: PbsDims,
    pub input: GpuVec,
    pub input_indexes: GpuVec,
    pub accumulator: GpuVec,
    pub bsk: GpuVec,
    pub keybundle: GpuVec,
    pub scratch: GpuVec,
}

impl RotationOperands {
    pub(crate) fn input_offset(&self, s: usize) -> usize {
        self.input_indexes.get(s) as usize * self.dims.lwe_size()
    }

    /// Switched mask coefficient of a CMux, `None` when it is zero and the step is skipped.
    pub(crate) fn cmux_degree(&self, s: usize, step: RotationStep) -> Option<usize> {
        match step {
            RotationStep::Classical { mask_index } => {
                let mask_element = self.input.get(self.input_offset(s) + mask_index);
                match pbs_modulus_switch(mask_element, PolynomialSize(self.dims.polynomial_size)) {
                    0 => None,
                    degree => Some(degree),
                }
            }
            RotationStep::MultiBit { .. } => None,
        }
    }

    /// True when `step` leaves the accumulator of `s` untouched.
    pub(crate) fn skips(&self, s: usize, step: RotationStep) -> bool {
        matches!(step, RotationStep::Classical { .. }) && self.cmux_degree(s, step).is_none()
    }

    /// Write to `out` the polynomial the step decomposes for an accumulator row of `s`:
    /// `acc * X^a - acc` for a CMux, the row itself for a keybundle product.
    pub(crate) fn decomposition_input(&self, s: usize, step: RotationStep, acc_row: &[u64], out: &mut [u64]) {
        match self.cmux_degree(s, step) {
            Some(degree) => polynomial_wrapping_monic_monomial_mul_and_subtract(
                out,
                acc_row,
                MonomialDegree(degree),
            ),
            None => out.copy_from_slice(acc_row),
        }
    }

    /// Polynomial `(level_index, row, column)` of the GGSW used by `step` for ciphertext `s`.
    pub(crate) fn load_ggsw_polynomial(
        &self,
        s: usize,
        step: RotationStep,
        level_index: usize,
        row: usize,
        column: usize,
        dst: &mut [u64],
    ) {
        let in_ggsw = self.dims.ggsw_polynomial_offset(level_index, row, column);
        match step {
            RotationStep::Classical { mask_index } => {
                self.bsk
                    .load(mask_index * self.dims.ggsw_size() + in_ggsw, dst);
            }
            RotationStep::MultiBit { group_in_chunk } => {
                let keybundle = s * self.dims.lwe_chunk_size + group_in_chunk;
                self.keybundle
                    .load(keybundle * self.dims.ggsw_size() + in_ggsw, dst);
            }
        }
    }

    /// Fold the external product `product` into an accumulator row: a CMux adds it, a keybundle
    /// product replaces the row.
    pub(crate) fn fold_product(&self, step: RotationStep, acc_row: &mut [u64], product: &[u64]) {
        match step {
            RotationStep::Classical { .. } => polynomial_wrapping_add_assign(acc_row, product),
            RotationStep::MultiBit { .. } => acc_row.copy_from_slice(product),
        }
    }
}

/// Digit polynomial of level index `level_index` of `polynomial`.
pub(crate) fn decompose_polynomial_level(
    decomposer: &SignedDecomposer,
    polynomial: &[u64],
    level_index: usize,
    digit_polynomial: &mut [u64],
) {
    let mut coefficient_digits = vec![0u64; decomposer.level_count().0];
    for (digit, &coefficient) in digit_polynomial.iter_mut().zip(polynomial.iter()) {
        decomposer.decompose_into(coefficient, &mut coefficient_digits);
        *digit = coefficient_digits[level_index];
    }
}

/// Mask elements of group `group` of the input of ciphertext `s`.
pub(crate) fn load_group_mask(operands: &RotationOperands, s: usize, group: usize, dst: &mut [u64]) {
    let grouping_factor = operands.dims.grouping_factor;
    operands
        .input
        .load(operands.input_offset(s) + group * grouping_factor, dst);
}
