//! Sample extraction stage.

use crate::core_crypto::gpu::pbs::blind_rotation::pbs_dims;
use crate::core_crypto::gpu::pbs::buffer::PbsBuffer;
use crate::core_crypto::gpu::pbs::kernels::enqueue_kernel;
use crate::core_crypto::gpu::pbs::kernels::sample_extraction::SampleExtractionKernel;
use crate::core_crypto::gpu::pbs::plan::ExecutionPlan;
use std::sync::Arc;
use tfhe_gpu_sim::Stream;

/// Enqueue the extraction of the constant coefficient of every rotated accumulator of `buffer`
/// as an LWE ciphertext of dimension `k * N`.
pub(crate) fn enqueue_sample_extraction(stream: &Stream, plan: &ExecutionPlan, buffer: &PbsBuffer) {
    let kernel = SampleExtractionKernel {
        dims: pbs_dims(plan),
        accumulator: buffer.accumulator.clone(),
        extracted: buffer.extracted.clone(),
    };
    enqueue_kernel(stream, &plan.sample_extraction, Arc::new(kernel));
}
