//! Blind rotation stage: accumulator initialization, then every rotation step with the schedule
//! of the plan.

use crate::core_crypto::gpu::entities::{
    GpuBootstrapKey, GpuGlweCiphertextList, GpuLweCiphertextList,
};
use crate::core_crypto::gpu::pbs::buffer::PbsBuffer;
use crate::core_crypto::gpu::pbs::kernels::cluster::ClusterRotationKernel;
use crate::core_crypto::gpu::pbs::kernels::cooperative::CooperativeRotationKernel;
use crate::core_crypto::gpu::pbs::kernels::default::{StepOneKernel, StepTwoKernel};
use crate::core_crypto::gpu::pbs::kernels::init::InitAccumulatorKernel;
use crate::core_crypto::gpu::pbs::kernels::keybundle::KeybundleKernel;
use crate::core_crypto::gpu::pbs::kernels::{
    enqueue_kernel, PbsDims, RotationOperands, RotationStep,
};
use crate::core_crypto::gpu::pbs::plan::{ExecutionPlan, RotationSchedule};
use std::sync::Arc;
use tfhe_gpu_sim::Stream;
use tracing::trace;

pub(crate) fn pbs_dims(plan: &ExecutionPlan) -> PbsDims {
    let params = plan.params.params();
    PbsDims {
        lwe_dimension: params.lwe_dimension.0,
        glwe_size: plan.params.glwe_size().0,
        polynomial_size: params.polynomial_size.0,
        base_log: params.pbs_base_log,
        level_count: params.pbs_level.0,
        grouping_factor: params.grouping_factor.map_or(0, |factor| factor.0),
        lwe_chunk_size: plan.lwe_chunk_size.unwrap_or(0),
    }
}

fn enqueue_steps(
    stream: &Stream,
    plan: &ExecutionPlan,
    buffer: &PbsBuffer,
    operands: &RotationOperands,
    steps: Vec<RotationStep>,
) {
    match plan.rotation {
        RotationSchedule::Default { step_one, step_two } => {
            for step in steps {
                let one = StepOneKernel {
                    operands: operands.clone(),
                    digits: buffer.digits.clone(),
                    slots: step_one.slots,
                    step,
                };
                enqueue_kernel(stream, &step_one, Arc::new(one));
                let two = StepTwoKernel {
                    operands: operands.clone(),
                    digits: buffer.digits.clone(),
                    slots: step_two.slots,
                    step,
                };
                enqueue_kernel(stream, &step_two, Arc::new(two));
            }
        }
        RotationSchedule::Cooperative { rotation } => {
            let kernel = CooperativeRotationKernel {
                operands: operands.clone(),
                join: buffer.join.clone(),
                slots: rotation.slots,
                steps,
            };
            enqueue_kernel(stream, &rotation, Arc::new(kernel));
        }
        RotationSchedule::Cluster { rotation } => {
            let kernel = ClusterRotationKernel {
                operands: operands.clone(),
                steps,
            };
            enqueue_kernel(stream, &rotation, Arc::new(kernel));
        }
    }
}

/// Enqueue the initialization and the blind rotation of the batch, leaving the rotated
/// accumulators in `buffer`.
///
/// The index arrays of `buffer` must have been written before, on the same stream.
pub(crate) fn enqueue_blind_rotation(
    stream: &Stream,
    plan: &ExecutionPlan,
    buffer: &PbsBuffer,
    input: &GpuLweCiphertextList,
    luts: &GpuGlweCiphertextList,
    bsk: &GpuBootstrapKey,
) {
    let dims = pbs_dims(plan);
    let init = InitAccumulatorKernel {
        dims,
        input: input.d_vec.clone(),
        input_indexes: buffer.input_indexes.clone(),
        luts: luts.d_vec.clone(),
        lut_indexes: buffer.lut_indexes.clone(),
        accumulator: buffer.accumulator.clone(),
    };
    enqueue_kernel(stream, &plan.init, Arc::new(init));

    let operands = RotationOperands {
        dims,
        input: input.d_vec.clone(),
        input_indexes: buffer.input_indexes.clone(),
        accumulator: buffer.accumulator.clone(),
        bsk: bsk.d_vec().clone(),
        keybundle: buffer.keybundle.clone(),
        scratch: buffer.scratch.clone(),
    };

    match plan.keybundle {
        None => {
            let steps = (0..dims.lwe_dimension)
                .map(|mask_index| RotationStep::Classical { mask_index })
                .collect();
            enqueue_steps(stream, plan, buffer, &operands, steps);
        }
        Some(keybundle) => {
            for (first_group, group_count) in plan.multi_bit_chunks() {
                trace!(first_group, group_count, "enqueue multi bit chunk");
                let kernel = KeybundleKernel {
                    operands: operands.clone(),
                    slots: keybundle.slots,
                    first_group,
                };
                enqueue_kernel(
                    stream,
                    &keybundle.with_grid_x(group_count as u32),
                    Arc::new(kernel),
                );
                let steps = (0..group_count)
                    .map(|group_in_chunk| RotationStep::MultiBit { group_in_chunk })
                    .collect();
                enqueue_steps(stream, plan, buffer, &operands, steps);
            }
        }
    }
}
