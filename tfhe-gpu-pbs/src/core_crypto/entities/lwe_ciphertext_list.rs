//! Module containing the definition of the LweCiphertextList.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// A contiguous list containing [`LWE ciphertexts`](`LweCiphertext`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LweCiphertextList<C: Container> {
    data: C,
    lwe_size: LweSize,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for LweCiphertextList<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for LweCiphertextList<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> LweCiphertextList<C> {
    /// Create an [`LweCiphertextList`] from an existing container.
    ///
    /// # Panics
    ///
    /// Panics if the container length is not a multiple of `lwe_size`.
    pub fn from_container(
        container: C,
        lwe_size: LweSize,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        assert!(
            container.container_len() % lwe_size.0 == 0,
            "The provided container length is not valid. \
        It needs to be dividable by lwe_size. \
        Got container length: {} and lwe_size: {lwe_size:?}.",
            container.container_len()
        );
        Self {
            data: container,
            lwe_size,
            ciphertext_modulus,
        }
    }

    pub fn lwe_size(&self) -> LweSize {
        self.lwe_size
    }

    pub fn lwe_ciphertext_count(&self) -> LweCiphertextCount {
        LweCiphertextCount(self.data.container_len() / self.lwe_size.0)
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn get(&self, index: usize) -> LweCiphertextView<'_> {
        let size = self.lwe_size.0;
        LweCiphertext::from_container(
            &self.data.as_ref()[index * size..(index + 1) * size],
            self.ciphertext_modulus,
        )
    }

    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = LweCiphertextView<'_>> + ExactSizeIterator {
        let ciphertext_modulus = self.ciphertext_modulus;
        self.data
            .as_ref()
            .chunks_exact(self.lwe_size.0)
            .map(move |chunk| LweCiphertext::from_container(chunk, ciphertext_modulus))
    }

    pub fn into_container(self) -> C {
        self.data
    }
}

impl<C: ContainerMut> LweCiphertextList<C> {
    pub fn get_mut(&mut self, index: usize) -> LweCiphertextMutView<'_> {
        let size = self.lwe_size.0;
        let ciphertext_modulus = self.ciphertext_modulus;
        LweCiphertext::from_container(
            &mut self.data.as_mut()[index * size..(index + 1) * size],
            ciphertext_modulus,
        )
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = LweCiphertextMutView<'_>> {
        let ciphertext_modulus = self.ciphertext_modulus;
        let size = self.lwe_size.0;
        self.data
            .as_mut()
            .chunks_exact_mut(size)
            .map(move |chunk| LweCiphertext::from_container(chunk, ciphertext_modulus))
    }
}

pub type LweCiphertextListOwned = LweCiphertextList<Vec<u64>>;

impl LweCiphertextListOwned {
    /// Allocate a new list of `ciphertext_count` ciphertexts filled with `fill_with`.
    pub fn new(
        fill_with: u64,
        lwe_size: LweSize,
        ciphertext_count: LweCiphertextCount,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        Self::from_container(
            vec![fill_with; lwe_size.0 * ciphertext_count.0],
            lwe_size,
            ciphertext_modulus,
        )
    }
}
