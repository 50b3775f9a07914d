//! Module containing the definition of the LweKeyswitchKey.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// An [`LWE keyswitch key`](`LweKeyswitchKey`).
///
/// For every coefficient $s\_i$ of the input key, `level_count` LWE encryptions under the output
/// key of $s\_i \cdot q / B^j$, level 1 first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LweKeyswitchKey<C: Container> {
    data: C,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    output_lwe_size: LweSize,
    ciphertext_modulus: CiphertextModulus,
}

impl<C: Container> AsRef<[u64]> for LweKeyswitchKey<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for LweKeyswitchKey<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

pub fn lwe_keyswitch_key_input_key_element_encrypted_size(
    decomp_level_count: DecompositionLevelCount,
    output_lwe_size: LweSize,
) -> usize {
    // One ciphertext per level encrypted under the output key
    decomp_level_count.0 * output_lwe_size.0
}

impl<C: Container> LweKeyswitchKey<C> {
    /// # Panics
    ///
    /// Panics if the container is empty or its length is not a multiple of
    /// `decomp_level_count * output_lwe_size`.
    pub fn from_container(
        container: C,
        decomp_base_log: DecompositionBaseLog,
        decomp_level_count: DecompositionLevelCount,
        output_lwe_size: LweSize,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        assert!(
            container.container_len() > 0,
            "Got an empty container to create an LweKeyswitchKey"
        );
        assert!(
            container.container_len() % (decomp_level_count.0 * output_lwe_size.0) == 0,
            "The provided container length is not valid. \
        It needs to be dividable by decomp_level_count * output_lwe_size: {}. \
        Got container length: {} and decomp_level_count: {decomp_level_count:?}, \
        output_lwe_size: {output_lwe_size:?}.",
            decomp_level_count.0 * output_lwe_size.0,
            container.container_len()
        );
        Self {
            data: container,
            decomp_base_log,
            decomp_level_count,
            output_lwe_size,
            ciphertext_modulus,
        }
    }

    pub fn decomposition_base_log(&self) -> DecompositionBaseLog {
        self.decomp_base_log
    }

    pub fn decomposition_level_count(&self) -> DecompositionLevelCount {
        self.decomp_level_count
    }

    pub fn input_key_lwe_dimension(&self) -> LweDimension {
        LweDimension(self.data.container_len() / self.input_key_element_encrypted_size())
    }

    pub fn output_key_lwe_dimension(&self) -> LweDimension {
        self.output_lwe_size.to_lwe_dimension()
    }

    pub fn output_lwe_size(&self) -> LweSize {
        self.output_lwe_size
    }

    pub fn ciphertext_modulus(&self) -> CiphertextModulus {
        self.ciphertext_modulus
    }

    pub fn input_key_element_encrypted_size(&self) -> usize {
        lwe_keyswitch_key_input_key_element_encrypted_size(
            self.decomp_level_count,
            self.output_lwe_size,
        )
    }

    /// The encryptions of input key element `index`, level 1 first.
    pub fn get(&self, index: usize) -> LweCiphertextList<&[u64]> {
        let size = self.input_key_element_encrypted_size();
        LweCiphertextList::from_container(
            &self.data.as_ref()[index * size..(index + 1) * size],
            self.output_lwe_size,
            self.ciphertext_modulus,
        )
    }
}

impl<C: ContainerMut> LweKeyswitchKey<C> {
    pub fn iter_mut(&mut self) -> impl Iterator<Item = LweCiphertextList<&mut [u64]>> {
        let size = self.input_key_element_encrypted_size();
        let output_lwe_size = self.output_lwe_size;
        let ciphertext_modulus = self.ciphertext_modulus;
        self.data.as_mut().chunks_exact_mut(size).map(move |chunk| {
            LweCiphertextList::from_container(chunk, output_lwe_size, ciphertext_modulus)
        })
    }
}

pub type LweKeyswitchKeyOwned = LweKeyswitchKey<Vec<u64>>;

impl LweKeyswitchKeyOwned {
    pub fn new(
        fill_with: u64,
        decomp_base_log: DecompositionBaseLog,
        decomp_level_count: DecompositionLevelCount,
        input_key_lwe_dimension: LweDimension,
        output_key_lwe_dimension: LweDimension,
        ciphertext_modulus: CiphertextModulus,
    ) -> Self {
        Self::from_container(
            vec![
                fill_with;
                input_key_lwe_dimension.0
                    * lwe_keyswitch_key_input_key_element_encrypted_size(
                        decomp_level_count,
                        output_key_lwe_dimension.to_lwe_size()
                    )
            ],
            decomp_base_log,
            decomp_level_count,
            output_key_lwe_dimension.to_lwe_size(),
            ciphertext_modulus,
        )
    }
}
