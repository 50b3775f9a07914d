//! Module containing the definition of the GlweSecretKey.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// A [`GLWE secret key`](`GlweSecretKey`): `k` binary polynomials stored contiguously.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlweSecretKey<C: Container> {
    data: C,
    polynomial_size: PolynomialSize,
}

impl<C: Container> AsRef<[u64]> for GlweSecretKey<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for GlweSecretKey<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> GlweSecretKey<C> {
    /// # Panics
    ///
    /// Panics if the container is empty or its length is not a multiple of `polynomial_size`.
    pub fn from_container(container: C, polynomial_size: PolynomialSize) -> Self {
        assert!(
            container.container_len() > 0,
            "Got an empty container to create a GlweSecretKey"
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
        }
    }

    pub fn glwe_dimension(&self) -> GlweDimension {
        GlweDimension(self.data.container_len() / self.polynomial_size.0)
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        self.polynomial_size
    }

    pub fn get_polynomial(&self, index: usize) -> &[u64] {
        let n = self.polynomial_size.0;
        &self.data.as_ref()[index * n..(index + 1) * n]
    }

    /// View the key as the LWE secret key of the samples extracted from GLWE ciphertexts
    /// encrypted under it.
    pub fn as_lwe_secret_key(&self) -> LweSecretKeyView<'_> {
        LweSecretKey::from_container(self.data.as_ref())
    }

    pub fn into_lwe_secret_key(self) -> LweSecretKey<C> {
        LweSecretKey::from_container(self.data)
    }
}

pub type GlweSecretKeyOwned = GlweSecretKey<Vec<u64>>;

impl GlweSecretKeyOwned {
    pub fn new_empty_key(
        value: u64,
        glwe_dimension: GlweDimension,
        polynomial_size: PolynomialSize,
    ) -> Self {
        Self::from_container(vec![value; glwe_dimension.0 * polynomial_size.0], polynomial_size)
    }
}
