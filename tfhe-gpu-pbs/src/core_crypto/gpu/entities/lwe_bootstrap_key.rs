use crate::core_crypto::gpu::{GpuLweMultiBitBootstrapKey, GpuStreams};
use crate::core_crypto::prelude::{
    CiphertextModulus, Container, DecompositionBaseLog, DecompositionLevelCount, GlweDimension,
    GlweSize, LweBootstrapKey, LweBskGroupingFactor, LweDimension, PolynomialSize,
};
use crate::error::Error;
use tfhe_gpu_sim::{GpuIndex, GpuVec};

/// A classical bootstrap key on the GPU, one GGSW ciphertext per input mask coefficient.
///
/// The key is read only once uploaded, every bootstrap reading it gets its own handle on the
/// device memory.
#[derive(Debug)]
pub struct GpuLweBootstrapKey {
    pub(crate) d_vec: GpuVec,
    input_lwe_dimension: LweDimension,
    glwe_dimension: GlweDimension,
    polynomial_size: PolynomialSize,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    ciphertext_modulus: CiphertextModulus,
}

impl GpuLweBootstrapKey {
    pub fn from_lwe_bootstrap_key<C: Container>(
        bsk: &LweBootstrapKey<C>,
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

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.d_vec.gpu_index()
    }
}

/// A bootstrap key of either shape, the shape decides which bootstrap type can use it.
#[derive(Debug)]
pub enum GpuBootstrapKey {
    Classical(GpuLweBootstrapKey),
    MultiBit(GpuLweMultiBitBootstrapKey),
}

impl From<GpuLweBootstrapKey> for GpuBootstrapKey {
    fn from(bsk: GpuLweBootstrapKey) -> Self {
        Self::Classical(bsk)
    }
}

impl From<GpuLweMultiBitBootstrapKey> for GpuBootstrapKey {
    fn from(bsk: GpuLweMultiBitBootstrapKey) -> Self {
        Self::MultiBit(bsk)
    }
}

impl GpuBootstrapKey {
    pub(crate) fn d_vec(&self) -> &GpuVec {
        match self {
            Self::Classical(bsk) => &bsk.d_vec,
            Self::MultiBit(bsk) => &bsk.d_vec,
        }
    }

    pub fn input_lwe_dimension(&self) -> LweDimension {
        match self {
            Self::Classical(bsk) => bsk.input_lwe_dimension(),
            Self::MultiBit(bsk) => bsk.input_lwe_dimension(),
        }
    }

    pub fn glwe_dimension(&self) -> GlweDimension {
        match self {
            Self::Classical(bsk) => bsk.glwe_dimension(),
            Self::MultiBit(bsk) => bsk.glwe_dimension(),
        }
    }

    pub fn glwe_size(&self) -> GlweSize {
        self.glwe_dimension().to_glwe_size()
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        match self {
            Self::Classical(bsk) => bsk.polynomial_size(),
            Self::MultiBit(bsk) => bsk.polynomial_size(),
        }
    }

    pub fn output_lwe_dimension(&self) -> LweDimension {
        self.glwe_dimension()
            .to_equivalent_lwe_dimension(self.polynomial_size())
    }

    pub fn decomp_base_log(&self) -> DecompositionBaseLog {
        match self {
            Self::Classical(bsk) => bsk.decomp_base_log(),
            Self::MultiBit(bsk) => bsk.decomp_base_log(),
        }
    }

    pub fn decomp_level_count(&self) -> DecompositionLevelCount {
        match self {
            Self::Classical(bsk) => bsk.decomp_level_count(),
            Self::MultiBit(bsk) => bsk.decomp_level_count(),
        }
    }

    /// The grouping factor of a multi bit key, `None` for a classical key.
    pub fn grouping_factor(&self) -> Option<LweBskGroupingFactor> {
        match self {
            Self::Classical(_) => None,
            Self::MultiBit(bsk) => Some(bsk.grouping_factor()),
        }
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        match self {
            Self::Classical(bsk) => bsk.ciphertext_modulus(),
            Self::MultiBit(bsk) => bsk.ciphertext_modulus(),
        }
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.d_vec().gpu_index()
    }
}
