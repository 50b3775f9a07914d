//! Module containing the definition of the GlweCiphertext.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;

/// Number of words of a GLWE ciphertext.
pub fn glwe_ciphertext_size(glwe_size: GlweSize, polynomial_size: PolynomialSize) -> usize {
    glwe_size.0 * polynomial_size.0
}

/// A [`GLWE ciphertext`](`GlweCiphertext`).
///
/// The ciphertext is made of `k` mask polynomials followed by the body polynomial, each one of
/// `polynomial_size` coefficients, all stored contiguously.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlweCiphertext<C: Container> {
    data: C,
    polynomial_size: PolynomialSize,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for GlweCiphertext<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for GlweCiphertext<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> GlweCiphertext<C> {
    /// Create a [`GlweCiphertext`] from an existing container.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty or its length is not a multiple of `polynomial_size`.
    pub fn from_container(
        container: C,
        polynomial_size: PolynomialSize,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        assert!(
            container.container_len() > 0,
            "Got an empty container to create a GlweCiphertext"
        );
        assert!(
            container.container_len() % polynomial_size.0 == 0,
            "The provided container length is not valid. \
        It needs to be dividable by polynomial_size. \
        Got container length: {} and polynomial_size: {polynomial_size:?}.",
            container.container_len()
        );
        Self {
            data: container,
            polynomial_size,
            ciphertext_modulus,
        }
    }

    pub fn glwe_size(&self) -> GlweSize {
        GlweSize(self.data.container_len() / self.polynomial_size.0)
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        self.polynomial_size
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    /// Polynomial `index` of the ciphertext, the body being the last one.
    pub fn get_polynomial(&self, index: usize) -> &[u64] {
        let n = self.polynomial_size.0;
        &self.data.as_ref()[index * n..(index + 1) * n]
    }

    pub fn get_mask(&self) -> &[u64] {
        let data = self.data.as_ref();
        &data[..data.len() - self.polynomial_size.0]
    }

    pub fn get_body(&self) -> &[u64] {
        let data = self.data.as_ref();
        &data[data.len() - self.polynomial_size.0..]
    }

    pub fn as_view(&self) -> GlweCiphertext<&[u64]> {
        GlweCiphertext::from_container(
            self.data.as_ref(),
            self.polynomial_size,
            self.ciphertext_modulus,
        )
    }

    pub fn into_container(self) -> C {
        self.data
    }
}

impl<C: ContainerMut> GlweCiphertext<C> {
    pub fn get_mut_polynomial(&mut self, index: usize) -> &mut [u64] {
        let n = self.polynomial_size.0;
        &mut self.data.as_mut()[index * n..(index + 1) * n]
    }

    pub fn get_mut_mask_and_body(&mut self) -> (&mut [u64], &mut [u64]) {
        let n = self.polynomial_size.0;
        let data = self.data.as_mut();
        let mask_len = data.len() - n;
        data.split_at_mut(mask_len)
    }

    pub fn as_mut_view(&mut self) -> GlweCiphertext<&mut [u64]> {
        let polynomial_size = self.polynomial_size;
        let ciphertext_modulus = self.ciphertext_modulus;
        GlweCiphertext::from_container(self.data.as_mut(), polynomial_size, ciphertext_modulus)
    }
}

pub type GlweCiphertextOwned = GlweCiphertext<Vec<u64>>;
pub type GlweCiphertextView<'data> = GlweCiphertext<&'data [u64]>;
pub type GlweCiphertextMutView<'data> = GlweCiphertext<&'data mut [u64]>;

impl GlweCiphertextOwned {
    pub fn new(
        fill_with: u64,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        Self::from_container(
            vec![fill_with; glwe_ciphertext_size(glwe_size, polynomial_size)],
            polynomial_size,
            ciphertext_modulus,
        )
    }
}
