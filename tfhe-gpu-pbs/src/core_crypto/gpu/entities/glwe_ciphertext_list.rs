use crate::core_crypto::gpu::GpuStreams;
use crate::core_crypto::prelude::{
    CiphertextModulus, Container, GlweCiphertext, GlweCiphertextCount, GlweCiphertextList,
    GlweDimension, GlweSize, PolynomialSize,
};
use crate::error::Error;
use tfhe_gpu_sim::{GpuIndex, GpuVec};

/// A structure representing a vector of GLWE ciphertexts with 64 bits of precision on the GPU.
///
/// Look-up tables of a bootstrap are given as such a list.
#[derive(Debug)]
pub struct GpuGlweCiphertextList {
    pub(crate) d_vec: GpuVec,
    glwe_ciphertext_count: GlweCiphertextCount,
    glwe_dimension: GlweDimension,
    polynomial_size: PolynomialSize,
    ciphertext_modulus: CiphertextModulus,
}

impl GpuGlweCiphertextList {
    pub fn from_glwe_ciphertext_list<C: Container>(
        h_ct: &GlweCiphertextList<C>,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        Self::from_host_words(
            h_ct.as_ref(),
            h_ct.glwe_ciphertext_count(),
            h_ct.glwe_size().to_glwe_dimension(),
            h_ct.polynomial_size(),
            h_ct.ciphertext_modulus(),
            streams,
        )
    }

    pub fn from_glwe_ciphertext<C: Container>(
        h_ct: &GlweCiphertext<C>,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        Self::from_host_words(
            h_ct.as_ref(),
            GlweCiphertextCount(1),
            h_ct.glwe_size().to_glwe_dimension(),
            h_ct.polynomial_size(),
            h_ct.ciphertext_modulus(),
            streams,
        )
    }

    fn from_host_words(
        words: &[u64],
        glwe_ciphertext_count: GlweCiphertextCount,
        glwe_dimension: GlweDimension,
        polynomial_size: PolynomialSize,
        ciphertext_modulus: CiphertextModulus,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        let d_vec = streams.target().device().malloc(words.len())?;
        let stream = streams.main_stream();
        stream.copy_to_gpu_async(&d_vec, 0, words);
        stream.synchronize()?;

        Ok(Self {
            d_vec,
            glwe_ciphertext_count,
            glwe_dimension,
            polynomial_size,
            ciphertext_modulus,
        })
    }

    pub fn to_glwe_ciphertext_list(
        &self,
        streams: &GpuStreams,
    ) -> Result<GlweCiphertextList<Vec<u64>>, Error> {
        let mut container = vec![0u64; self.d_vec.len()];
        streams
            .main_stream()
            .copy_to_cpu(&self.d_vec, 0, &mut container)?;
        Ok(GlweCiphertextList::from_container(
            container,
            self.glwe_size(),
            self.polynomial_size,
            self.ciphertext_modulus,
        ))
    }

    pub fn glwe_ciphertext_count(&self) -> GlweCiphertextCount {
        self.glwe_ciphertext_count
    }

    pub fn glwe_dimension(&self) -> GlweDimension {
        self.glwe_dimension
    }

    pub fn glwe_size(&self) -> GlweSize {
        self.glwe_dimension.to_glwe_size()
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        self.polynomial_size
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.d_vec.gpu_index()
    }
}
