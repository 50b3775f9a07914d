//! Device scratch memory of a bootstrap.

use crate::core_crypto::gpu::pbs::plan::{BufferLayout, ExecutionPlan};
use crate::core_crypto::gpu::GpuTarget;
use crate::error::Error;
use tfhe_gpu_sim::{GpuIndex, GpuVec};
use tracing::trace;

/// The device buffers a batch runs in, sized after a [`BufferLayout`].
///
/// A buffer is allocated by the engine for every call, or provisioned once by the caller with
/// [`PbsBuffer::new`] and reused for every batch whose plan it covers. A buffer serves one batch
/// at a time.
#[derive(Debug)]
pub struct PbsBuffer {
    layout: BufferLayout,
    gpu_index: GpuIndex,
    pub(crate) accumulator: GpuVec,
    pub(crate) digits: GpuVec,
    pub(crate) join: GpuVec,
    pub(crate) keybundle: GpuVec,
    pub(crate) scratch: GpuVec,
    pub(crate) extracted: GpuVec,
    pub(crate) keyswitched: GpuVec,
    pub(crate) input_indexes: GpuVec,
    pub(crate) output_indexes: GpuVec,
    pub(crate) lut_indexes: GpuVec,
}

impl PbsBuffer {
    /// Allocate the buffers of `plan` on the device of `target`.
    pub fn new(plan: &ExecutionPlan, target: &GpuTarget) -> Result<Self, Error> {
        Self::with_layout(plan.buffers, target)
    }

    pub fn with_layout(layout: BufferLayout, target: &GpuTarget) -> Result<Self, Error> {
        let device = target.device();
        let buffer = Self {
            layout,
            gpu_index: target.gpu_index(),
            accumulator: device.malloc(layout.accumulator)?,
            digits: device.malloc(layout.digits)?,
            join: device.malloc(layout.join)?,
            keybundle: device.malloc(layout.keybundle)?,
            scratch: device.malloc(layout.scratch)?,
            extracted: device.malloc(layout.extracted)?,
            keyswitched: device.malloc(layout.keyswitched)?,
            input_indexes: device.malloc(layout.indexes)?,
            output_indexes: device.malloc(layout.indexes)?,
            lut_indexes: device.malloc(layout.indexes)?,
        };
        trace!(bytes = layout.total_bytes(), "allocated bootstrap buffers");
        Ok(buffer)
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.gpu_index
    }

    pub fn size_bytes(&self) -> usize {
        self.layout.total_bytes()
    }

    /// Check that a batch planned as `plan` can run in this buffer on device `gpu_index`.
    pub(crate) fn check_fits(&self, plan: &ExecutionPlan, gpu_index: GpuIndex) -> Result<(), Error> {
        if self.gpu_index != gpu_index {
            return Err(Error::invalid_parameters(
                "buffer",
                format!(
                    "buffer lives on GPU {} but the batch runs on GPU {}",
                    self.gpu_index.0, gpu_index.0
                ),
            ));
        }
        if !self.layout.covers(&plan.buffers) {
            return Err(Error::invalid_parameters(
                "buffer",
                format!(
                    "buffer of {} bytes provisioned for {:?} is too small for {:?}",
                    self.size_bytes(),
                    self.layout,
                    plan.buffers
                ),
            ));
        }
        Ok(())
    }
}
