use crate::core_crypto::gpu::GpuStreams;
use crate::core_crypto::prelude::{
    CiphertextModulus, Container, LweCiphertext, LweCiphertextCount, LweCiphertextList,
    LweCiphertextListOwned, LweCiphertextOwned, LweDimension, LweSize,
};
use crate::error::Error;
use tfhe_gpu_sim::{GpuIndex, GpuVec};

/// A structure representing a vector of LWE ciphertexts with 64 bits of precision on the GPU.
#[derive(Debug)]
pub struct GpuLweCiphertextList {
    pub(crate) d_vec: GpuVec,
    lwe_dimension: LweDimension,
    lwe_ciphertext_count: LweCiphertextCount,
    ciphertext_modulus: CiphertextModulus,
}

impl GpuLweCiphertextList {
    /// Allocate a list of zeroed ciphertexts on the device.
    pub fn new(
        lwe_dimension: LweDimension,
        lwe_ciphertext_count: LweCiphertextCount,
        ciphertext_modulus: CiphertextModulus,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        let d_vec = streams
            .target()
            .device()
            .malloc(lwe_dimension.to_lwe_size().0 * lwe_ciphertext_count.0)?;

        Ok(Self {
            d_vec,
            lwe_dimension,
            lwe_ciphertext_count,
            ciphertext_modulus,
        })
    }

    pub fn from_lwe_ciphertext_list<C: Container>(
        h_ct: &LweCiphertextList<C>,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        let lwe_dimension = h_ct.lwe_size().to_lwe_dimension();
        let lwe_ciphertext_count = h_ct.lwe_ciphertext_count();

        // Copy to the GPU
        let list = Self::new(
            lwe_dimension,
            lwe_ciphertext_count,
            h_ct.ciphertext_modulus(),
            streams,
        )?;
        let stream = streams.main_stream();
        stream.copy_to_gpu_async(&list.d_vec, 0, h_ct.as_ref());
        stream.synchronize()?;
        Ok(list)
    }

    pub fn from_lwe_ciphertext<C: Container>(
        h_ct: &LweCiphertext<C>,
        streams: &GpuStreams,
    ) -> Result<Self, Error> {
        let list = Self::new(
            h_ct.lwe_size().to_lwe_dimension(),
            LweCiphertextCount(1),
            h_ct.ciphertext_modulus(),
            streams,
        )?;
        let stream = streams.main_stream();
        stream.copy_to_gpu_async(&list.d_vec, 0, h_ct.as_ref());
        stream.synchronize()?;
        Ok(list)
    }

    pub fn to_lwe_ciphertext_list(&self, streams: &GpuStreams) -> Result<LweCiphertextListOwned, Error> {
        let mut container = vec![0u64; self.d_vec.len()];
        streams
            .main_stream()
            .copy_to_cpu(&self.d_vec, 0, &mut container)?;

        Ok(LweCiphertextList::from_container(
            container,
            self.lwe_size(),
            self.ciphertext_modulus,
        ))
    }

    /// Copy the ciphertext of index `index` back to the host.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of the list.
    pub fn to_lwe_ciphertext(
        &self,
        index: usize,
        streams: &GpuStreams,
    ) -> Result<LweCiphertextOwned, Error> {
        assert!(index < self.lwe_ciphertext_count.0);
        let lwe_size = self.lwe_size().0;
        let mut container = vec![0u64; lwe_size];
        streams
            .main_stream()
            .copy_to_cpu(&self.d_vec, index * lwe_size, &mut container)?;

        Ok(LweCiphertext::from_container(
            container,
            self.ciphertext_modulus,
        ))
    }

    /// Allocate a new list on the device holding a copy of this one.
    pub fn duplicate(&self, streams: &GpuStreams) -> Result<Self, Error> {
        let copy = Self::new(
            self.lwe_dimension,
            self.lwe_ciphertext_count,
            self.ciphertext_modulus,
            streams,
        )?;
        let stream = streams.main_stream();
        stream.copy_gpu_to_gpu_async(&copy.d_vec, 0, &self.d_vec, 0, self.d_vec.len());
        stream.synchronize()?;
        Ok(copy)
    }

    pub fn lwe_dimension(&self) -> LweDimension {
        self.lwe_dimension
    }

    pub fn lwe_size(&self) -> LweSize {
        self.lwe_dimension.to_lwe_size()
    }

    pub fn lwe_ciphertext_count(&self) -> LweCiphertextCount {
        self.lwe_ciphertext_count
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.d_vec.gpu_index()
    }
}
