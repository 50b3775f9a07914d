//! Module containing the definition of the GlweCiphertextList.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// A contiguous list containing [`GLWE ciphertexts`](`GlweCiphertext`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlweCiphertextList<C: Container> {
    data: C,
    glwe_size: GlweSize,
    polynomial_size: PolynomialSize,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for GlweCiphertextList<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for GlweCiphertextList<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> GlweCiphertextList<C> {
    /// Create a [`GlweCiphertextList`] from an existing container.
    ///
    /// # Panics
    ///
    /// Panics if the container length is not a multiple of the size of a GLWE ciphertext.
    pub fn from_container(
        container: C,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        assert!(
            container.container_len() % glwe_ciphertext_size(glwe_size, polynomial_size) == 0,
            "The provided container length is not valid. \
        It needs to be dividable by glwe_size * polynomial_size. \
        Got container length: {} and glwe_size: {glwe_size:?}, \
        polynomial_size: {polynomial_size:?}.",
            container.container_len()
        );
        Self {
            data: container,
            glwe_size,
            polynomial_size,
            ciphertext_modulus,
        }
    }

    pub fn glwe_size(&self) -> GlweSize {
        self.glwe_size
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        self.polynomial_size
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn glwe_ciphertext_count(&self) -> GlweCiphertextCount {
        GlweCiphertextCount(
            self.data.container_len() / glwe_ciphertext_size(self.glwe_size, self.polynomial_size),
        )
    }

    pub fn get(&self, index: usize) -> GlweCiphertextView<'_> {
        let size = glwe_ciphertext_size(self.glwe_size, self.polynomial_size);
        GlweCiphertext::from_container(
            &self.data.as_ref()[index * size..(index + 1) * size],
            self.polynomial_size,
            self.ciphertext_modulus,
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = GlweCiphertextView<'_>> {
        let polynomial_size = self.polynomial_size;
        let ciphertext_modulus = self.ciphertext_modulus;
        self.data
            .as_ref()
            .chunks_exact(glwe_ciphertext_size(self.glwe_size, polynomial_size))
            .map(move |chunk| {
                GlweCiphertext::from_container(chunk, polynomial_size, ciphertext_modulus)
            })
    }

    pub fn into_container(self) -> C {
        self.data
    }
}

impl<C: ContainerMut> GlweCiphertextList<C> {
    pub fn get_mut(&mut self, index: usize) -> GlweCiphertextMutView<'_> {
        let size = glwe_ciphertext_size(self.glwe_size, self.polynomial_size);
        let polynomial_size = self.polynomial_size;
        let ciphertext_modulus = self.ciphertext_modulus;
        GlweCiphertext::from_container(
            &mut self.data.as_mut()[index * size..(index + 1) * size],
            polynomial_size,
            ciphertext_modulus,
        )
    }
}

pub type GlweCiphertextListOwned = GlweCiphertextList<Vec<u64>>;

impl GlweCiphertextListOwned {
    pub fn new(
        fill_with: u64,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        ciphertext_count: GlweCiphertextCount,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        Self::from_container(
            vec![fill_with; glwe_ciphertext_size(glwe_size, polynomial_size) * ciphertext_count.0],
            glwe_size,
            polynomial_size,
            ciphertext_modulus,
        )
    }
}
