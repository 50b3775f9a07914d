//! Module containing the definition of the LweCiphertext.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;

/// An [`LWE ciphertext`](`LweCiphertext`).
///
/// The ciphertext is the mask $(a\_0, \ldots, a\_{n-1})$ followed by the body
/// $b = \sum\_{i} a\_i s\_i + \Delta m + e$.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LweCiphertext<C: Container> {
    data: C,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for LweCiphertext<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for LweCiphertext<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> LweCiphertext<C> {
    /// Create an [`LweCiphertext`] from an existing container.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty.
    pub fn from_container(container: C, ciphertext_modulus: CiphertextModulus) -> Self {
        assert!(
            container.container_len() > 0,
            "Got an empty container to create an LweCiphertext"
        );
        Self {
            data: container,
            ciphertext_modulus,
        }
    }

    pub fn lwe_size(&self) -> LweSize {
        LweSize(self.data.container_len())
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn get_mask(&self) -> &[u64] {
        let data = self.data.as_ref();
        &data[..data.len() - 1]
    }

    pub fn get_body(&self) -> u64 {
        let data = self.data.as_ref();
        data[data.len() - 1]
    }

    pub fn as_view(&self) -> LweCiphertext<&[u64]> {
        LweCiphertext::from_container(self.data.as_ref(), self.ciphertext_modulus)
    }

    pub fn into_container(self) -> C {
        self.data
    }
}

impl<C: ContainerMut> LweCiphertext<C> {
    pub fn get_mut_mask_and_body(&mut self) -> (&mut [u64], &mut u64) {
        let data = self.data.as_mut();
        let body_index = data.len() - 1;
        let (mask, body) = data.split_at_mut(body_index);
        (mask, &mut body[0])
    }

    pub fn as_mut_view(&mut self) -> LweCiphertext<&mut [u64]> {
        let ciphertext_modulus = self.ciphertext_modulus;
        LweCiphertext::from_container(self.data.as_mut(), ciphertext_modulus)
    }
}

pub type LweCiphertextOwned = LweCiphertext<Vec<u64>>;
pub type LweCiphertextView<'data> = LweCiphertext<&'data [u64]>;
pub type LweCiphertextMutView<'data> = LweCiphertext<&'data mut [u64]>;

impl LweCiphertextOwned {
    /// Allocate a new [`LweCiphertext`] filled with `fill_with`.
    pub fn new(fill_with: u64, lwe_size: LweSize, ciphertext_modulus: CiphertextModulus) -> Self {
        Self::from_container(vec![fill_with; lwe_size.0], ciphertext_modulus)
    }
}
