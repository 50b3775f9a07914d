//! Key switch stage.

use crate::core_crypto::commons::math::decomposition::SignedDecomposer;
use crate::core_crypto::commons::parameters::{LweCiphertextCount, LweDimension};
use crate::core_crypto::gpu::entities::GpuLweKeyswitchKey;
use crate::core_crypto::gpu::pbs::kernels::enqueue_kernel;
use crate::core_crypto::gpu::pbs::kernels::keyswitch::KeyswitchKernel;
use crate::core_crypto::gpu::pbs::plan::{keyswitch_threads, KernelGeometry, SlotLayout};
use crate::error::{Error, Resource};
use std::sync::Arc;
use tfhe_gpu_sim::{DeviceProperties, GpuVec, LaunchMode, Stream};

/// Check that `ksk` switches ciphertexts of dimension `input_lwe_dimension` to ciphertexts of
/// dimension `output_lwe_dimension`.
pub(crate) fn check_keyswitch_dimensions(
    ksk: &GpuLweKeyswitchKey,
    input_lwe_dimension: LweDimension,
    output_lwe_dimension: LweDimension,
) -> Result<(), Error> {
    if ksk.input_key_lwe_dimension() != input_lwe_dimension {
        return Err(Error::dimension_mismatch(
            "keyswitch key input dimension",
            input_lwe_dimension.0,
            ksk.input_key_lwe_dimension().0,
        ));
    }
    if ksk.output_key_lwe_dimension() != output_lwe_dimension {
        return Err(Error::dimension_mismatch(
            "keyswitch key output dimension",
            output_lwe_dimension.0,
            ksk.output_key_lwe_dimension().0,
        ));
    }
    Ok(())
}

/// Launch geometry of a key switch of `count` ciphertexts outside of a bootstrap.
pub(crate) fn keyswitch_geometry(
    output_lwe_dimension: LweDimension,
    count: LweCiphertextCount,
    props: &DeviceProperties,
) -> Result<KernelGeometry, Error> {
    let max_count = props.max_grid_dim.1 as usize;
    if count.0 > max_count {
        return Err(Error::resource_exceeded(
            Resource::GridDimension,
            count.0,
            max_count,
        ));
    }
    let threads = keyswitch_threads(props);
    let outputs = output_lwe_dimension.to_lwe_size().0 as u32;
    Ok(KernelGeometry {
        grid_dim: (outputs.div_ceil(threads), count.0 as u32, 1),
        block_dim: (threads, 1, 1),
        shared_mem_bytes: 0,
        mode: LaunchMode::Regular,
        slots: SlotLayout::NONE,
    })
}

/// Enqueue the key switch of the ciphertexts of `input` into `output`, ciphertext `s` of the
/// output being the key switch of ciphertext `s` of the input.
pub(crate) fn enqueue_keyswitch(
    stream: &Stream,
    geometry: &KernelGeometry,
    ksk: &GpuLweKeyswitchKey,
    input: &GpuVec,
    output: &GpuVec,
) {
    let kernel = KeyswitchKernel {
        decomposer: SignedDecomposer::new(
            ksk.decomposition_base_log(),
            ksk.decomposition_level_count(),
        ),
        input_lwe_dimension: ksk.input_key_lwe_dimension().0,
        output_lwe_dimension: ksk.output_key_lwe_dimension().0,
        input: input.clone(),
        output: output.clone(),
        ksk: ksk.d_vec.clone(),
    };
    enqueue_kernel(stream, geometry, Arc::new(kernel));
}
