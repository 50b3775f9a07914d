//! Module containing the definition of the LweMultiBitBootstrapKey.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// An [`LWE multi bit bootstrap key`](`LweMultiBitBootstrapKey`).
///
/// The input key coefficients are processed by groups of `grouping_factor`. For each group the
/// key holds $2^g$ GGSW ciphertexts, the GGSW of index $j$ encrypting the product
/// $\prod\_k (s\_k \text{ or } 1 - s\_k)$ where bit `(j >> (g - 1 - k)) & 1` selects $s\_k$.
/// For a binary key exactly one of the $2^g$ products is one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LweMultiBitBootstrapKey<C: Container> {
    data: C,
    glwe_size: GlweSize,
    polynomial_size: PolynomialSize,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    grouping_factor: LweBskGroupingFactor,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for LweMultiBitBootstrapKey<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for LweMultiBitBootstrapKey<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> LweMultiBitBootstrapKey<C> {
    /// # Panics
    ///
    /// Panics if the container is empty or not made of complete GGSW groups.
    pub fn from_container(
        container: C,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        decomp_base_log: DecompositionBaseLog,
        decomp_level_count: DecompositionLevelCount,
        grouping_factor: LweBskGroupingFactor,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        let group_size = grouping_factor.ggsw_per_multi_bit_element().0
            * ggsw_ciphertext_size(glwe_size, polynomial_size, decomp_level_count);
        assert!(
            container.container_len() > 0,
            "Got an empty container to create an LweMultiBitBootstrapKey"
        );
        assert!(
            container.container_len() % group_size == 0,
            "The provided container length is not valid. \
        It needs to be dividable by 2^grouping_factor * the size of a GGSW ciphertext: \
        {group_size}. Got container length: {}.",
            container.container_len()
        );
        Self {
            data: container,
            glwe_size,
            polynomial_size,
            decomp_base_log,
            decomp_level_count,
            grouping_factor,
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

    pub fn grouping_factor(&self) -> LweBskGroupingFactor {
        self.grouping_factor
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn ggsw_size(&self) -> usize {
        ggsw_ciphertext_size(self.glwe_size, self.polynomial_size, self.decomp_level_count)
    }

    pub fn group_count(&self) -> usize {
        self.data.container_len()
            / (self.ggsw_size() * self.grouping_factor.ggsw_per_multi_bit_element().0)
    }

    pub fn input_lwe_dimension(&self) -> LweDimension {
        LweDimension(self.group_count() * self.grouping_factor.0)
    }

    pub fn output_lwe_dimension(&self) -> LweDimension {
        self.glwe_size
            .to_glwe_dimension()
            .to_equivalent_lwe_dimension(self.polynomial_size)
    }

    /// GGSW of index `ggsw_index` in `[0, 2^g)` of the group `group`.
    pub fn get_ggsw(&self, group: usize, ggsw_index: usize) -> GgswCiphertextView<'_> {
        let size = self.ggsw_size();
        let start =
            (group * self.grouping_factor.ggsw_per_multi_bit_element().0 + ggsw_index) * size;
        GgswCiphertext::from_container(
            &self.data.as_ref()[start..start + size],
            self.glwe_size,
            self.polynomial_size,
            self.decomp_base_log,
            self.ciphertext_modulus,
        )
    }
}

impl<C: ContainerMut> LweMultiBitBootstrapKey<C> {
    /// Iterate over every GGSW of the key, groups first.
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

pub type LweMultiBitBootstrapKeyOwned = LweMultiBitBootstrapKey<Vec<u64>>;

impl LweMultiBitBootstrapKeyOwned {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fill_with: u64,
        glwe_size: GlweSize,
        polynomial_size: PolynomialSize,
        decomp_base_log: DecompositionBaseLog,
        decomp_level_count: DecompositionLevelCount,
        input_lwe_dimension: LweDimension,
        grouping_factor: LweBskGroupingFactor,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        assert!(
            input_lwe_dimension.0 % grouping_factor.0 == 0,
            "Multi Bit BSK requires input LWE dimension ({}) to be a multiple of {}",
            input_lwe_dimension.0,
            grouping_factor.0
        );
        let ggsw_count = input_lwe_dimension.0 / grouping_factor.0
            * grouping_factor.ggsw_per_multi_bit_element().0;
        Self::from_container(
            vec![
                fill_with;
                ggsw_count * ggsw_ciphertext_size(glwe_size, polynomial_size, decomp_level_count)
            ],
            glwe_size,
            polynomial_size,
            decomp_base_log,
            decomp_level_count,
            grouping_factor,
            ciphertext_modulus,
        )
    }
}
