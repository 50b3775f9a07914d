//! Module containing primitives pertaining to [`LWE ciphertext`](`LweCiphertext`) encryption and
//! decryption.

use crate::core_crypto::algorithms::slice_algorithms::*;
use crate::core_crypto::commons::dispersion::DispersionParameter;
use crate::core_crypto::commons::generators::EncryptionRandomGenerator;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Encrypt an input plaintext in an output [`LWE ciphertext`](`LweCiphertext`).
///
/// The mask is drawn uniformly and the body is $b = \langle a, s \rangle + m + e$.
///
/// # Example
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::prelude::*;
///
/// // DISCLAIMER: these toy example parameters are not guaranteed to be secure or yield correct
/// // computations
/// let lwe_dimension = LweDimension(742);
/// let lwe_noise_std_dev = StandardDev(0.000007069849454709433);
///
/// let mut encryption_generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
/// let mut secret_generator = SecretRandomGenerator::new(new_seed());
///
/// let lwe_secret_key =
///     allocate_and_generate_new_binary_lwe_secret_key(lwe_dimension, &mut secret_generator);
///
/// let msg = 3u64;
/// let plaintext = Plaintext(msg << 60);
///
/// let mut lwe = LweCiphertext::new(
///     0u64,
///     lwe_dimension.to_lwe_size(),
///     CiphertextModulus::new_native(),
/// );
///
/// encrypt_lwe_ciphertext(
///     &lwe_secret_key,
///     &mut lwe,
///     plaintext,
///     lwe_noise_std_dev,
///     &mut encryption_generator,
/// );
///
/// let decrypted_plaintext = decrypt_lwe_ciphertext(&lwe_secret_key, &lwe);
///
/// // Round and remove encoding
/// let decomposer = SignedDecomposer::new(DecompositionBaseLog(4), DecompositionLevelCount(1));
/// let rounded = decomposer.closest_representable(decrypted_plaintext.0);
/// let cleartext = rounded >> 60;
///
/// assert_eq!(cleartext, msg);
/// ```
pub fn encrypt_lwe_ciphertext<KeyCont, OutputCont>(
    lwe_secret_key: &LweSecretKey<KeyCont>,
    output: &mut LweCiphertext<OutputCont>,
    encoded: Plaintext,
    noise_parameters: impl DispersionParameter,
    generator: &mut EncryptionRandomGenerator,
) where
    KeyCont: Container,
    OutputCont: ContainerMut,
{
    assert!(
        output.lwe_size().to_lwe_dimension() == lwe_secret_key.lwe_dimension(),
        "Mismatch between LweDimension of output ciphertext and input secret key. \
        Got {:?} in output, and {:?} in secret key.",
        output.lwe_size().to_lwe_dimension(),
        lwe_secret_key.lwe_dimension()
    );

    let (mask, body) = output.get_mut_mask_and_body();

    generator.fill_slice_with_random_mask(mask);

    // generate an error from the normal distribution described by std_dev
    *body = generator.random_noise(noise_parameters);

    // compute the multisum between the secret key and the mask
    *body = body.wrapping_add(slice_wrapping_dot_product(mask, lwe_secret_key.as_ref()));

    *body = body.wrapping_add(encoded.0);
}

/// Allocate a new [`LWE ciphertext`](`LweCiphertext`) and encrypt an input plaintext in it.
pub fn allocate_and_encrypt_new_lwe_ciphertext<KeyCont>(
    lwe_secret_key: &LweSecretKey<KeyCont>,
    encoded: Plaintext,
    noise_parameters: impl DispersionParameter,
    ciphertext_modulus: CiphertextModulus,
    generator: &mut EncryptionRandomGenerator,
) -> LweCiphertextOwned
where
    KeyCont: Container,
{
    let mut new_ct = LweCiphertextOwned::new(
        0,
        lwe_secret_key.lwe_dimension().to_lwe_size(),
        ciphertext_modulus,
    );

    encrypt_lwe_ciphertext(
        lwe_secret_key,
        &mut new_ct,
        encoded,
        noise_parameters,
        generator,
    );

    new_ct
}

/// Fill an [`LWE ciphertext`](`LweCiphertext`) with a trivial encryption of `encoded`: a zero mask
/// and the plaintext as body.
pub fn trivially_encrypt_lwe_ciphertext<OutputCont>(
    output: &mut LweCiphertext<OutputCont>,
    encoded: Plaintext,
) where
    OutputCont: ContainerMut,
{
    let (mask, body) = output.get_mut_mask_and_body();
    mask.fill(0);
    *body = encoded.0;
}

/// Decrypt an [`LWE ciphertext`](`LweCiphertext`) and return a noisy plaintext.
///
/// See [`encrypt_lwe_ciphertext`] for usage.
pub fn decrypt_lwe_ciphertext<KeyCont, InputCont>(
    lwe_secret_key: &LweSecretKey<KeyCont>,
    lwe_ciphertext: &LweCiphertext<InputCont>,
) -> Plaintext
where
    KeyCont: Container,
    InputCont: Container,
{
    assert!(
        lwe_ciphertext.lwe_size().to_lwe_dimension() == lwe_secret_key.lwe_dimension(),
        "Mismatch between LweDimension of output ciphertext and input secret key. \
        Got {:?} in output, and {:?} in secret key.",
        lwe_ciphertext.lwe_size().to_lwe_dimension(),
        lwe_secret_key.lwe_dimension()
    );

    Plaintext(
        lwe_ciphertext
            .get_body()
            .wrapping_sub(slice_wrapping_dot_product(
                lwe_ciphertext.get_mask(),
                lwe_secret_key.as_ref(),
            )),
    )
}

/// Encrypt an input plaintext list in an output [`LWE ciphertext list`](`LweCiphertextList`).
///
/// # Panics
///
/// Panics if the list and the plaintext slice do not have the same length.
pub fn encrypt_lwe_ciphertext_list<KeyCont, OutputCont>(
    lwe_secret_key: &LweSecretKey<KeyCont>,
    output: &mut LweCiphertextList<OutputCont>,
    encoded: &[Plaintext],
    noise_parameters: impl DispersionParameter,
    generator: &mut EncryptionRandomGenerator,
) where
    KeyCont: Container,
    OutputCont: ContainerMut,
{
    assert!(
        output.lwe_ciphertext_count().0 == encoded.len(),
        "Mismatch between number of output ciphertexts and input plaintexts. \
        Got {:?} plaintexts, and {:?} ciphertext.",
        encoded.len(),
        output.lwe_ciphertext_count()
    );

    for (encoded_plaintext, mut ciphertext) in encoded.iter().zip(output.iter_mut()) {
        encrypt_lwe_ciphertext(
            lwe_secret_key,
            &mut ciphertext,
            *encoded_plaintext,
            noise_parameters,
            generator,
        );
    }
}

/// Decrypt every ciphertext of an [`LWE ciphertext list`](`LweCiphertextList`).
pub fn decrypt_lwe_ciphertext_list<KeyCont, InputCont>(
    lwe_secret_key: &LweSecretKey<KeyCont>,
    input_lwe_ciphertext_list: &LweCiphertextList<InputCont>,
) -> Vec<Plaintext>
where
    KeyCont: Container,
    InputCont: Container,
{
    input_lwe_ciphertext_list
        .iter()
        .map(|ct| decrypt_lwe_ciphertext(lwe_secret_key, &ct))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core_crypto::algorithms::*;
    use crate::core_crypto::commons::dispersion::StandardDev;
    use crate::core_crypto::commons::generators::{new_seed, SecretRandomGenerator};
    use crate::core_crypto::commons::math::decomposition::SignedDecomposer;

    #[test]
    fn encrypt_decrypt_list() {
        let mut secret_generator = SecretRandomGenerator::new(new_seed());
        let mut encryption_generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
        let key =
            allocate_and_generate_new_binary_lwe_secret_key(LweDimension(100), &mut secret_generator);

        let messages: Vec<Plaintext> = (0..16u64).map(|m| Plaintext(m << 59)).collect();
        let mut list = LweCiphertextListOwned::new(
            0,
            LweSize(101),
            LweCiphertextCount(messages.len()),
            CiphertextModulus::new_native(),
        );
        encrypt_lwe_ciphertext_list(
            &key,
            &mut list,
            &messages,
            StandardDev(2_f64.powi(-40)),
            &mut encryption_generator,
        );

        let decomposer =
            SignedDecomposer::new(DecompositionBaseLog(5), DecompositionLevelCount(1));
        for (decrypted, expected) in decrypt_lwe_ciphertext_list(&key, &list)
            .iter()
            .zip(messages.iter())
        {
            assert_eq!(decomposer.closest_representable(decrypted.0), expected.0);
        }
    }

    #[test]
    fn trivial_encryption_decrypts_under_any_key() {
        let mut secret_generator = SecretRandomGenerator::new(new_seed());
        let key =
            allocate_and_generate_new_binary_lwe_secret_key(LweDimension(8), &mut secret_generator);
        let mut ct = LweCiphertext::new(7, LweSize(9), CiphertextModulus::new_native());
        trivially_encrypt_lwe_ciphertext(&mut ct, Plaintext(1 << 62));
        assert_eq!(decrypt_lwe_ciphertext(&key, &ct), Plaintext(1 << 62));
    }
}
