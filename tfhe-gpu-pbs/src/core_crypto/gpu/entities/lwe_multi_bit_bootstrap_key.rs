use crate::core_crypto::gpu::GpuStreams;
use crate::core_crypto::prelude::{
    CiphertextModulus, Container, DecompositionBaseLog, DecompositionLevelCount, GlweDimension,
    LweBskGroupingFactor, LweDimension, LweMultiBitBootstrapKey, PolynomialSize,
};
use crate::error::Error;
use tfhe_gpu_sim::{GpuIndex, GpuVec};

/// A multi bit bootstrap key on the GPU: for every group of `grouping_factor` input mask
/// coefficients, `2^grouping_factor` GGSW ciphertexts.
#[derive(Debug)]
pub struct GpuLweMultiBitBootstrapKey {
    pub(crate) d_vec: GpuVec,
    input_lwe_dimension: LweDimension,
    glwe_dimension: GlweDimension,
    polynomial_size: PolynomialSize,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    grouping_factor: LweBskGroupingFactor,
    ciphertext_modulus: CiphertextModulus,
}

impl GpuLweMultiBitBootstrapKey {
    pub fn from_lwe_multi_bit_bootstrap_key<C: Container>(
        bsk: &LweMultiBitBootstrapKey<C>,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        let d_vec = streams.target().device().malloc(bsk.as_ref().len())?;
        let stream = streams.main_stream();
        stream.copy_to_gpu_async(&d_vec, 0, bsk.as_ref());
        stream.synchronize()?;

        Ok(Self {
            d_vec,
            input_lwe_dimension: bsk.input_lwe_dimension(),
            glwe_dimension: bsk.glwe_size().to_glwe_dimension(),
            polynomial_size: bsk.polynomial_size(),
            decomp_base_log: bsk.decomposition_base_log(),
            decomp_level_count: bsk.decomposition_level_count(),
            grouping_factor: bsk.grouping_factor(),
            ciphertext_modulus: bsk.ciphertext_modulus(),
        })
    }

    pub fn input_lwe_dimension(&self) -> LweDimension {
        self.input_lwe_dimension
    }

    pub fn glwe_dimension(&self) -> GlweDimension {
        self.glwe_dimension
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        self.polynomial_size
    }

    pub fn output_lwe_dimension(&self) -> LweDimension {
        self.glwe_dimension
            .to_equivalent_lwe_dimension(self.polynomial_size)
    }

    pub fn decomp_base_log(&self) -> DecompositionBaseLog {
        self.decomp_base_log
    }

    pub fn decomp_level_count(&self) -> DecompositionLevelCount {
        self.decomp_level_count
    }

    pub fn grouping_factor(&self) -> LweBskGroupingFactor {
        self.grouping_factor
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.d_vec.gpu_index()
    }
}
