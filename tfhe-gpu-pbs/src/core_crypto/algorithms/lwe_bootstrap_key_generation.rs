//! Module containing primitives pertaining to the generation of
//! [`LWE bootstrap keys`](`LweBootstrapKey`).

use crate::core_crypto::algorithms::ggsw_encryption::*;
use crate::core_crypto::commons::dispersion::DispersionParameter;
use crate::core_crypto::commons::generators::EncryptionRandomGenerator;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;
use rayon::prelude::*;

fn assert_bootstrap_key_matches_secret_keys<InputKeyCont, OutputKeyCont, OutputCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    output: &LweBootstrapKey<OutputCont>,
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

/// Fill an [`LWE bootstrap key`](`LweBootstrapKey`) with an actual bootstrapping key constructed
/// from an input key [`LWE secret key`](`LweSecretKey`) and an output key
/// [`GLWE secret key`](`GlweSecretKey`).
///
/// Consider using [`par_generate_lwe_bootstrap_key`] for better key generation times.
pub fn generate_lwe_bootstrap_key<InputKeyCont, OutputKeyCont, OutputCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    output: &mut LweBootstrapKey<OutputCont>,
    noise_parameters: impl DispersionParameter,
    generator: &mut EncryptionRandomGenerator,
) where
    InputKeyCont: Container,
    OutputKeyCont: Container,
    OutputCont: ContainerMut,
{
    assert_bootstrap_key_matches_secret_keys(input_lwe_secret_key, output_glwe_secret_key, output);

    let gen_iter = generator.fork_n(output.input_lwe_dimension().0);

    for ((mut ggsw, &input_key_element), mut generator) in output
        .ggsw_iter_mut()
        .zip(input_lwe_secret_key.as_ref().iter())
        .zip(gen_iter)
    {
        encrypt_constant_ggsw_ciphertext(
            output_glwe_secret_key,
            &mut ggsw,
            Cleartext(input_key_element),
            noise_parameters,
            &mut generator,
        );
    }
}

/// Allocate a new [`LWE bootstrap key`](`LweBootstrapKey`) and fill it with an actual
/// bootstrapping key constructed from an input key [`LWE secret key`](`LweSecretKey`) and an
/// output key [`GLWE secret key`](`GlweSecretKey`).
///
/// Consider using [`par_allocate_and_generate_new_lwe_bootstrap_key`] for better key generation
/// times.
pub fn allocate_and_generate_new_lwe_bootstrap_key<InputKeyCont, OutputKeyCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    noise_parameters: impl DispersionParameter,
    ciphertext_modulus: CiphertextModulus,
    generator: &mut EncryptionRandomGenerator,
) -> LweBootstrapKeyOwned
where
    InputKeyCont: Container,
    OutputKeyCont: Container,
{
    let mut bsk = LweBootstrapKeyOwned::new(
        0,
        output_glwe_secret_key.glwe_dimension().to_glwe_size(),
        output_glwe_secret_key.polynomial_size(),
        decomp_base_log,
        decomp_level_count,
        input_lwe_secret_key.lwe_dimension(),
        ciphertext_modulus,
    );

    generate_lwe_bootstrap_key(
        input_lwe_secret_key,
        output_glwe_secret_key,
        &mut bsk,
        noise_parameters,
        generator,
    );

    bsk
}

/// Parallel variant of [`generate_lwe_bootstrap_key`], it is recommended to use this function for
/// better key generation times as LWE bootstrapping keys can be quite large.
///
/// The generator is forked the same way in both versions, so they produce the same key.
pub fn par_generate_lwe_bootstrap_key<InputKeyCont, OutputKeyCont, OutputCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    output: &mut LweBootstrapKey<OutputCont>,
    noise_parameters: impl DispersionParameter + Sync + Send,
    generator: &mut EncryptionRandomGenerator,
) where
    InputKeyCont: Container + Sync,
    OutputKeyCont: Container + Sync,
    OutputCont: ContainerMut,
{
    assert_bootstrap_key_matches_secret_keys(input_lwe_secret_key, output_glwe_secret_key, output);

    let gen_iter = generator.fork_n(output.input_lwe_dimension().0);

    output
        .ggsw_iter_mut()
        .collect::<Vec<_>>()
        .into_par_iter()
        .zip(input_lwe_secret_key.as_ref().par_iter())
        .zip(gen_iter.into_par_iter())
        .for_each(|((mut ggsw, &input_key_element), mut generator)| {
            encrypt_constant_ggsw_ciphertext(
                output_glwe_secret_key,
                &mut ggsw,
                Cleartext(input_key_element),
                noise_parameters,
                &mut generator,
            );
        })
}

/// Parallel variant of [`allocate_and_generate_new_lwe_bootstrap_key`].
pub fn par_allocate_and_generate_new_lwe_bootstrap_key<InputKeyCont, OutputKeyCont>(
    input_lwe_secret_key: &LweSecretKey<InputKeyCont>,
    output_glwe_secret_key: &GlweSecretKey<OutputKeyCont>,
    decomp_base_log: DecompositionBaseLog,
    decomp_level_count: DecompositionLevelCount,
    noise_parameters: impl DispersionParameter + Sync + Send,
    ciphertext_modulus: CiphertextModulus,
    generator: &mut EncryptionRandomGenerator,
) -> LweBootstrapKeyOwned
where
    InputKeyCont: Container + Sync,
    OutputKeyCont: Container + Sync,
{
    let mut bsk = LweBootstrapKeyOwned::new(
        0,
        output_glwe_secret_key.glwe_dimension().to_glwe_size(),
        output_glwe_secret_key.polynomial_size(),
        decomp_base_log,
        decomp_level_count,
        input_lwe_secret_key.lwe_dimension(),
        ciphertext_modulus,
    );

    par_generate_lwe_bootstrap_key(
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
    use crate::core_crypto::algorithms::*;
    use crate::core_crypto::commons::dispersion::StandardDev;
    use crate::core_crypto::commons::generators::{SecretRandomGenerator, Seed};

    #[test]
    fn par_and_sequential_generation_agree() {
        let mut secret_generator = SecretRandomGenerator::new(Seed(1));
        let lwe_sk =
            allocate_and_generate_new_binary_lwe_secret_key(LweDimension(8), &mut secret_generator);
        let glwe_sk = allocate_and_generate_new_binary_glwe_secret_key(
            GlweDimension(1),
            PolynomialSize(256),
            &mut secret_generator,
        );
        let noise = StandardDev(2_f64.powi(-40));

        let sequential = allocate_and_generate_new_lwe_bootstrap_key(
            &lwe_sk,
            &glwe_sk,
            DecompositionBaseLog(10),
            DecompositionLevelCount(2),
            noise,
            CiphertextModulus::new_native(),
            &mut EncryptionRandomGenerator::new(Seed(2), Seed(3)),
        );
        let parallel = par_allocate_and_generate_new_lwe_bootstrap_key(
            &lwe_sk,
            &glwe_sk,
            DecompositionBaseLog(10),
            DecompositionLevelCount(2),
            noise,
            CiphertextModulus::new_native(),
            &mut EncryptionRandomGenerator::new(Seed(2), Seed(3)),
        );
        assert_eq!(sequential, parallel);

        for (index, &key_bit) in lwe_sk.as_ref().iter().enumerate() {
            assert_eq!(
                decrypt_constant_ggsw_ciphertext(&glwe_sk, &sequential.get_ggsw(index)),
                Cleartext(key_bit)
            );
        }
    }
}
