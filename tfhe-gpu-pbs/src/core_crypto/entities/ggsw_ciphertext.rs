//! Module containing the definition of the GgswCiphertext.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Number of words of one level matrix of a GGSW ciphertext.
pub fn ggsw_level_matrix_size(glwe_size: GlweSize, polynomial_size: PolynomialSize) -> usize {
    // GlweSize GlweCiphertext(s) per level
    glwe_size.0 * glwe_ciphertext_size(glwe_size, polynomial_size)
}

/// Number of words of a GGSW ciphertext.
pub fn ggsw_ciphertext_size(
    glwe_size: GlweSize,
    polynomial_size: PolynomialSize,
    decomp_level_count: DecompositionLevelCount,
) -> usize {
    decomp_level_count.0 * ggsw_level_matrix_size(glwe_size, polynomial_size)
}

/// A [`GGSW ciphertext`](`GgswCiphertext`).
///
/// The ciphertext is made of `level_count` level matrices, the first one being the level 1
/// (most significant). Each level matrix holds `glwe_size` GLWE ciphertexts: row $r$ of level
/// $j$ is a GLWE encryption of zero with $m \cdot q / B^j$ added to its polynomial $r$, where
/// $m$ is the encrypted polynomial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GgswCiphertext<C: Container> {
    data: C,
    glwe_size: GlweSize,
    polynomial_size: PolynomialSize,
    decomp_base_log: DecompositionBaseLog,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for GgswCiphertext<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for GgswCiphertext<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> GgswCiphertext<C> {
    /// Create a [`GgswCiphertext`] from an existing container.
    ///
    /// # Panics
    ///
    /// Panics if the container is empty or not made of complete level matrices.
    pub fn from_container(
        container: C,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        decomp_base_log: DecompositionBaseLog,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        assert!(
            container.container_len() > 0,
            "Got an empty container to create a GgswCiphertext"
        );
        assert!(
            container.container_len() % ggsw_level_matrix_size(glwe_size, polynomial_size) == 0,
            "The provided container length is not valid. \
        It needs to be dividable by glwe_size * glwe_size * polynomial_size: {}. \
        Got container length: {} and glwe_size: {glwe_size:?}, \
        polynomial_size: {polynomial_size:?}.",
            ggsw_level_matrix_size(glwe_size, polynomial_size),
            container.container_len()
        );
        Self {
            data: container,
            glwe_size,
            polynomial_size,
            decomp_base_log,
            ciphertext_modulus,
        }
    }

    pub fn glwe_size(&self) -> GlweSize {
        self.glwe_size
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        self.polynomial_size
    }

    pub fn decomposition_base_log(&self) -> DecompositionBaseLog {
        self.decomp_base_log
    }

    pub fn decomposition_level_count(&self) -> DecompositionLevelCount {
        DecompositionLevelCount(
            self.data.container_len() / ggsw_level_matrix_size(self.glwe_size, self.polynomial_size),
        )
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    /// Row `row` of the level matrix of index `level_index` (the level `level_index + 1`).
    pub fn get_row(&self, level_index: usize, row: usize) -> GlweCiphertextView<'_> {
        let size = glwe_ciphertext_size(self.glwe_size, self.polynomial_size);
        let start = (level_index * self.glwe_size.0 + row) * size;
        GlweCiphertext::from_container(
            &self.data.as_ref()[start..start + size],
            self.polynomial_size,
            self.ciphertext_modulus,
        )
    }

    pub fn as_view(&self) -> GgswCiphertext<&[u64]> {
        GgswCiphertext::from_container(
            self.data.as_ref(),
            self.glwe_size,
            self.polynomial_size,
            self.decomp_base_log,
            self.ciphertext_modulus,
        )
    }
}

impl<C: ContainerMut> GgswCiphertext<C> {
    pub fn get_mut_row(&mut self, level_index: usize, row: usize) -> GlweCiphertextMutView<'_> {
        let size = glwe_ciphertext_size(self.glwe_size, self.polynomial_size);
        let start = (level_index * self.glwe_size.0 + row) * size;
        let polynomial_size = self.polynomial_size;
        let ciphertext_modulus = self.ciphertext_modulus;
        GlweCiphertext::from_container(
            &mut self.data.as_mut()[start..start + size],
            polynomial_size,
            ciphertext_modulus,
        )
    }
}

pub type GgswCiphertextOwned = GgswCiphertext<Vec<u64>>;
pub type GgswCiphertextView<'data> = GgswCiphertext<&'data [u64]>;
pub type GgswCiphertextMutView<'data> = GgswCiphertext<&'data mut [u64]>;

impl GgswCiphertextOwned {
    pub fn new(
        fill_with: u64,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        decomp_base_log: DecompositionBaseLog,
        decomp_level_count: DecompositionLevelCount,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        Self::from_container(
            vec![fill_with; ggsw_ciphertext_size(glwe_size, polynomial_size, decomp_level_count)],
            glwe_size,
            polynomial_size,
            decomp_base_log,
            ciphertext_modulus,
        )
    }
}
