//! Module containing primitives pertaining to the generation of
//! [`LWE multi bit bootstrap keys`](`LweMultiBitBootstrapKey`).

use crate::core_crypto::algorithms::ggsw_encryption::*;
use crate::core_crypto::commons::dispersion::DispersionParameter;
use crate::core_crypto::commons::generators::EncryptionRandomGenerator;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;
use rayon::prelude::*;

fn assert_multi_bit_key_matches_secret_keys<InputKeyCont, OutputKeyCont, OutputCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    output: &LweMultiBitBootstrapKey<OutputCont>,
) where
    InputKeyCont: Container,
    OutputKeyCont: Container,
    OutputCont: Container,
{
    assert!(
        output.input_lwe_dimension() == input_lwe_secret_key.lwe_dimension(),
        "Mismatched LweDimension between input LWE secret key and LWE bootstrap key. \
        Input LWE secret key LweDimension: {:?}, LWE bootstrap key input LweDimension {:?}.",
        input_lwe_secret_key.lwe_dimension(),
        output.input_lwe_dimension()
    );

    assert!(
        output.glwe_size() == output_glwe_secret_key.glwe_dimension().to_glwe_size(),
        "Mismatched GlweSize between output GLWE secret key and LWE bootstrap key. \
        Output GLWE secret key GlweSize: {:?}, LWE bootstrap key GlweSize {:?}.",
        output_glwe_secret_key.glwe_dimension().to_glwe_size(),
        output.glwe_size()
    );

    assert!(
        output.polynomial_size() == output_glwe_secret_key.polynomial_size(),
        "Mismatched PolynomialSize between output GLWE secret key and LWE bootstrap key. \
        Output GLWE secret key PolynomialSize: {:?}, LWE bootstrap key PolynomialSize {:?}.",
        output_glwe_secret_key.polynomial_size(),
        output.polynomial_size()
    );
}

/// Product of the key bits of a group selected by `bit_selector` (in practice the GGSW index):
/// bit `g - 1 - k` of the selector picks $s\_k$ when set and $1 - s\_k$ otherwise.
///
/// GGSW 0 thus encrypts $\prod\_k (1 - s\_k)$, the term that is not rotated during the blind
/// rotation.
pub fn combine_key_bits(bit_selector: usize, input_key_elements: &[u64]) -> u64 {
    let mut key_bits_plaintext = 1u64;
    for (bit_idx, &key_bit) in input_key_elements.iter().enumerate() {
        let bit_position = input_key_elements.len() - (bit_idx + 1);
        let inversion_bit = (((bit_selector >> bit_position) & 1) ^ 1) as u64;
        let key_bit = key_bit ^ inversion_bit;
        key_bits_plaintext = key_bits_plaintext.wrapping_mul(key_bit);
    }
    key_bits_plaintext
}

/// Fill an [`LWE multi bit bootstrap key`](`LweMultiBitBootstrapKey`) with an actual
/// bootstrapping key constructed from an input key [`LWE secret key`](`LweSecretKey`) and an
/// output key [`GLWE secret key`](`GlweSecretKey`).
pub fn generate_lwe_multi_bit_bootstrap_key<InputKeyCont, OutputKeyCont, OutputCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    output: &mut LweMultiBitBootstrapKey<OutputCont>,
    noise_parameters: impl DispersionParameter,
    generator: &mut EncryptionRandomGenerator,
) where
    InputKeyCont: Container,
    OutputKeyCont: Container,
    OutputCont: ContainerMut,
{
    assert_multi_bit_key_matches_secret_keys(input_lwe_secret_key, output_glwe_secret_key, output);

    let grouping_factor = output.grouping_factor();
    let ggsw_per_multi_bit_element = grouping_factor.ggsw_per_multi_bit_element().0;
    let ggsw_count = output.group_count() * ggsw_per_multi_bit_element;
    let gen_iter = generator.fork_n(ggsw_count);

    for (ggsw_index, (mut ggsw, mut generator)) in
        output.ggsw_iter_mut().zip(gen_iter).enumerate()
    {
        let group = ggsw_index / ggsw_per_multi_bit_element;
        let input_key_elements = &input_lwe_secret_key.as_ref()
            [group * grouping_factor.0..(group + 1) * grouping_factor.0];
        let key_bits_plaintext =
            combine_key_bits(ggsw_index % ggsw_per_multi_bit_element, input_key_elements);

        encrypt_constant_ggsw_ciphertext(
            output_glwe_secret_key,
            &mut ggsw,
            Cleartext(key_bits_plaintext),
            noise_parameters,
            &mut generator,
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub fn allocate_and_generate_new_lwe_multi_bit_bootstrap_key<InputKeyCont, OutputKeyCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    grouping_factor: LweBskGroupingFactor,
    noise_parameters: impl DispersionParameter,
    ciphertext_modulus: CiphertextModulus,
    generator: &mut EncryptionRandomGenerator,
) -> LweMultiBitBootstrapKeyOwned
where
    InputKeyCont: Container,
    OutputKeyCont: Container,
{
    let mut bsk = LweMultiBitBootstrapKeyOwned::new(
        0,
        output_glwe_secret_key.glwe_dimension().to_glwe_size(),
        output_glwe_secret_key.polynomial_size(),
        decomp_base_log,
        decomp_level_count,
        input_lwe_secret_key.lwe_dimension(),
        grouping_factor,
        ciphertext_modulus,
    );

    generate_lwe_multi_bit_bootstrap_key(
        input_lwe_secret_key,
        output_glwe_secret_key,
        &mut bsk,
        noise_parameters,
        generator,
    );

    bsk
}

/// Parallel variant of [`generate_lwe_multi_bit_bootstrap_key`], producing the same key for the
/// same generator state.
pub fn par_generate_lwe_multi_bit_bootstrap_key<InputKeyCont, OutputKeyCont, OutputCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    output: &mut LweMultiBitBootstrapKey<OutputCont>,
    noise_parameters: impl DispersionParameter + Sync + Send,
    generator: &mut EncryptionRandomGenerator,
) where
    InputKeyCont: Container + Sync,
    OutputKeyCont: Container + Sync,
    OutputCont: ContainerMut,
{
    assert_multi_bit_key_matches_secret_keys(input_lwe_secret_key, output_glwe_secret_key, output);

    let grouping_factor = output.grouping_factor();
    let ggsw_per_multi_bit_element = grouping_factor.ggsw_per_multi_bit_element().0;
    let ggsw_count = output.group_count() * ggsw_per_multi_bit_element;
    let gen_iter = generator.fork_n(ggsw_count);
    let input_key = input_lwe_secret_key.as_ref();

    output
        .ggsw_iter_mut()
        .collect::<Vec<_>>()
        .into_par_iter()
        .zip(gen_iter.into_par_iter())
        .enumerate()
        .for_each(|(ggsw_index, (mut ggsw, mut generator))| {
            let group = ggsw_index / ggsw_per_multi_bit_element;
            let input_key_elements =
                &input_key[group * grouping_factor.0..(group + 1) * grouping_factor.0];
            let key_bits_plaintext =
                combine_key_bits(ggsw_index % ggsw_per_multi_bit_element, input_key_elements);

            encrypt_constant_ggsw_ciphertext(
                output_glwe_secret_key,
                &mut ggsw,
                Cleartext(key_bits_plaintext),
                noise_parameters,
                &mut generator,
            );
        })
}

#[allow(clippy::too_many_arguments)]
pub fn par_allocate_and_generate_new_lwe_multi_bit_bootstrap_key<InputKeyCont, OutputKeyCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    grouping_factor: LweBskGroupingFactor,
    noise_parameters: impl DispersionParameter + Sync + Send,
    ciphertext_modulus: CiphertextModulus,
    generator: &mut EncryptionRandomGenerator,
) -> LweMultiBitBootstrapKeyOwned
where
    InputKeyCont: Container + Sync,
    OutputKeyCont: Container + Sync,
{
    let mut bsk = LweMultiBitBootstrapKeyOwned::new(
        0,
        output_glwe_secret_key.glwe_dimension().to_glwe_size(),
        output_glwe_secret_key.polynomial_size(),
        decomp_base_log,
        decomp_level_count,
        input_lwe_secret_key.lwe_dimension(),
        grouping_factor,
        ciphertext_modulus,
    );

    par_generate_lwe_multi_bit_bootstrap_key(
        input_lwe_secret_key,
        output_glwe_secret_key,
        &mut bsk,
        noise_parameters,
        generator,
    );

    bsk
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exactly_one_combination_is_set() {
        for key in 0..8usize {
            let key_bits: Vec<u64> = (0..3).map(|k| ((key >> (2 - k)) & 1) as u64).collect();
            let combined: Vec<u64> = (0..8).map(|j| combine_key_bits(j, &key_bits)).collect();
            assert_eq!(combined.iter().sum::<u64>(), 1);
            // The selector equal to the key bits read msb first is the one set
            assert_eq!(combined[key], 1);
        }
    }
}
