//! Module containing the definition of the [`GpuLweKeyswitchKey`].

use crate::core_crypto::gpu::GpuStreams;
use crate::core_crypto::prelude::{
    CiphertextModulus, Container, DecompositionBaseLog, DecompositionLevelCount, LweDimension,
    LweKeyswitchKey, LweSize,
};
use crate::error::Error;
use tfhe_gpu_sim::{GpuIndex, GpuVec};

/// A key switching key on the GPU, in the host layout: for every input key coefficient,
/// `level_count` LWE ciphertexts under the output key, level 1 first.
#[derive(Debug)]
pub struct GpuLweKeyswitchKey {
    pub(crate) d_vec: GpuVec,
    input_lwe_size: LweSize,
    output_lwe_size: LweSize,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    ciphertext_modulus: CiphertextModulus,
}

impl GpuLweKeyswitchKey {
    pub fn from_lwe_keyswitch_key<C: Container>(
        h_ksk: &LweKeyswitchKey<C>,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        let d_vec = streams.target().device().malloc(h_ksk.as_ref().len())?;
        let stream = streams.main_stream();
        stream.copy_to_gpu_async(&d_vec, 0, h_ksk.as_ref());
        stream.synchronize()?;

        Ok(Self {
            d_vec,
            input_lwe_size: h_ksk.input_key_lwe_dimension().to_lwe_size(),
            output_lwe_size: h_ksk.output_key_lwe_dimension().to_lwe_size(),
            decomp_base_log: h_ksk.decomposition_base_log(),
            decomp_level_count: h_ksk.decomposition_level_count(),
            ciphertext_modulus: h_ksk.ciphertext_modulus(),
        })
    }

    pub fn input_key_lwe_dimension(&self) -> LweDimension {
        self.input_lwe_size.to_lwe_dimension()
    }

    pub fn output_key_lwe_dimension(&self) -> LweDimension {
        self.output_lwe_size.to_lwe_dimension()
    }

    pub fn decomposition_base_log(&self) -> DecompositionBaseLog {
        self.decomp_base_log
    }

    pub fn decomposition_level_count(&self) -> DecompositionLevelCount {
        self.decomp_level_count
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.d_vec.gpu_index()
    }
}
