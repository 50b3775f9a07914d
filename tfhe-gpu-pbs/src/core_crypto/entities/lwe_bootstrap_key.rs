//! Module containing the definition of the LweBootstrapKey.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// An [`LWE bootstrap key`](`LweBootstrapKey`).
///
/// One [`GgswCiphertext`] per coefficient of the input LWE secret key, each one encrypting that
/// coefficient under the output GLWE secret key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LweBootstrapKey<C: Container> {
    data: C,
    glwe_size: GlweSize,
    polynomial_size: PolynomialSize,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for LweBootstrapKey<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for LweBootstrapKey<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> LweBootstrapKey<C> {
    /// # Panics
    ///
    /// Panics if the container is empty or not made of complete GGSW ciphertexts.
    pub fn from_container(
        container: C,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        decomp_base_log: DecompositionBaseLog,
        decomp_level_count: DecompositionLevelCount,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        let ggsw_size = ggsw_ciphertext_size(glwe_size, polynomial_size, decomp_level_count);
        assert!(
            container.container_len() > 0,
            "Got an empty container to create an LweBootstrapKey"
        );
        assert!(
            container.container_len() % ggsw_size == 0,
            "The provided container length is not valid. \
        It needs to be dividable by the size of a GGSW ciphertext: {ggsw_size}. \
        Got container length: {}.",
            container.container_len()
        );
        Self {
            data: container,
            glwe_size,
            polynomial_size,
            decomp_base_log,
            decomp_level_count,
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
        self.decomp_level_count
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn ggsw_size(&self) -> usize {
        ggsw_ciphertext_size(self.glwe_size, self.polynomial_size, self.decomp_level_count)
    }

    pub fn input_lwe_dimension(&self) -> LweDimension {
        LweDimension(self.data.container_len() / self.ggsw_size())
    }

    pub fn output_lwe_dimension(&self) -> LweDimension {
        self.glwe_size
            .to_glwe_dimension()
            .to_equivalent_lwe_dimension(self.polynomial_size)
    }

    pub fn get_ggsw(&self, index: usize) -> GgswCiphertextView<'_> {
        let size = self.ggsw_size();
        GgswCiphertext::from_container(
            &self.data.as_ref()[index * size..(index + 1) * size],
            self.glwe_size,
            self.polynomial_size,
            self.decomp_base_log,
            self.ciphertext_modulus,
        )
    }
}

impl<C: ContainerMut> LweBootstrapKey<C> {
    pub fn ggsw_iter_mut(&mut self) -> impl Iterator<Item = GgswCiphertextMutView<'_>> {
        let size = self.ggsw_size();
        let glwe_size = self.glwe_size;
        let polynomial_size = self.polynomial_size;
        let decomp_base_log = self.decomp_base_log;
        let ciphertext_modulus = self.ciphertext_modulus;
        self.data.as_mut().chunks_exact_mut(size).map(move |chunk| {
            GgswCiphertext::from_container(
                chunk,
                glwe_size,
                polynomial_size,
                decomp_base_log,
                ciphertext_modulus,
            )
        })
    }
}

pub type LweBootstrapKeyOwned = LweBootstrapKey<Vec<u64>>;

impl LweBootstrapKeyOwned {
    pub fn new(
        fill_with: u64,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        decomp_base_log: DecompositionBaseLog,
        decomp_level_count: DecompositionLevelCount,
        input_lwe_dimension: LweDimension,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        Self::from_container(
            vec![
                fill_with;
                input_lwe_dimension.0
                    * ggsw_ciphertext_size(glwe_size, polynomial_size, decomp_level_count)
            ],
            glwe_size,
            polynomial_size,
            decomp_base_log,
            decomp_level_count,
            ciphertext_modulus,
        )
    }
}
