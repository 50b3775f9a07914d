//! Module containing primitives pertaining to [`GLWE ciphertext`](`GlweCiphertext`) encryption
//! and decryption.
//!
//! Plaintexts are polynomials given as slices of `polynomial_size` encoded coefficients.

use crate::core_crypto::algorithms::polynomial_algorithms::*;
use crate::core_crypto::commons::dispersion::DispersionParameter;
use crate::core_crypto::commons::generators::EncryptionRandomGenerator;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Encrypt a (scalar) plaintext polynomial in an output [`GLWE ciphertext`](`GlweCiphertext`).
///
/// The mask polynomials are drawn uniformly and the body is
/// $B = \sum\_r A\_r \cdot S\_r + M + E$.
pub fn encrypt_glwe_ciphertext<KeyCont, OutputCont>(
    glwe_secret_key: &GlweSecretKey<KeyCont>,
    output: &mut GlweCiphertext<OutputCont>,
    input_plaintext: &[u64],
    noise_parameters: impl DispersionParameter,
    generator: &mut EncryptionRandomGenerator,
) where
    KeyCont: Container,
    OutputCont: ContainerMut,
{
    assert!(
        output.polynomial_size().0 == input_plaintext.len(),
        "Mismatch between PolynomialSize of output ciphertext and input plaintext. \
        Got {:?} in output, and {} in plaintext.",
        output.polynomial_size(),
        input_plaintext.len()
    );
    assert!(
        output.glwe_size().to_glwe_dimension() == glwe_secret_key.glwe_dimension(),
        "Mismatch between GlweDimension of output ciphertext and input secret key. \
        Got {:?} in output, and {:?} in secret key.",
        output.glwe_size().to_glwe_dimension(),
        glwe_secret_key.glwe_dimension()
    );
    assert!(
        output.polynomial_size() == glwe_secret_key.polynomial_size(),
        "Mismatch between PolynomialSize of output ciphertext and input secret key. \
        Got {:?} in output, and {:?} in secret key.",
        output.polynomial_size(),
        glwe_secret_key.polynomial_size()
    );

    let polynomial_size = output.polynomial_size().0;
    let (mask, body) = output.get_mut_mask_and_body();

    generator.fill_slice_with_random_mask(mask);

    body.fill(0);
    generator.unsigned_torus_slice_wrapping_add_random_noise_assign(body, noise_parameters);
    polynomial_wrapping_add_assign(body, input_plaintext);

    for (index, mask_polynomial) in mask.chunks_exact(polynomial_size).enumerate() {
        polynomial_wrapping_add_mul_assign(
            body,
            mask_polynomial,
            glwe_secret_key.get_polynomial(index),
        );
    }
}

/// Allocate a new [`GLWE ciphertext`](`GlweCiphertext`) and encrypt a plaintext polynomial in it.
pub fn allocate_and_encrypt_new_glwe_ciphertext<KeyCont>(
    glwe_secret_key: &GlweSecretKey<KeyCont>,
    input_plaintext: &[u64],
    noise_parameters: impl DispersionParameter,
    ciphertext_modulus: CiphertextModulus,
    generator: &mut EncryptionRandomGenerator,
) -> GlweCiphertextOwned
where
    KeyCont: Container,
{
    let mut new_ct = GlweCiphertextOwned::new(
        0,
        glwe_secret_key.glwe_dimension().to_glwe_size(),
        glwe_secret_key.polynomial_size(),
        ciphertext_modulus,
    );

    encrypt_glwe_ciphertext(
        glwe_secret_key,
        &mut new_ct,
        input_plaintext,
        noise_parameters,
        generator,
    );

    new_ct
}

/// Decrypt a [`GLWE ciphertext`](`GlweCiphertext`) into a noisy plaintext polynomial.
pub fn decrypt_glwe_ciphertext<KeyCont, InputCont>(
    glwe_secret_key: &GlweSecretKey<KeyCont>,
    input_glwe_ciphertext: &GlweCiphertext<InputCont>,
    output_plaintext: &mut [u64],
) where
    KeyCont: Container,
    InputCont: Container,
{
    assert!(
        output_plaintext.len() == input_glwe_ciphertext.polynomial_size().0,
        "Mismatched output PlaintextCount {} and input PolynomialSize {:?}",
        output_plaintext.len(),
        input_glwe_ciphertext.polynomial_size()
    );
    assert!(
        glwe_secret_key.glwe_dimension() == input_glwe_ciphertext.glwe_size().to_glwe_dimension(),
        "Mismatched GlweDimension between glwe_secret_key {:?} and input_glwe_ciphertext {:?}",
        glwe_secret_key.glwe_dimension(),
        input_glwe_ciphertext.glwe_size().to_glwe_dimension()
    );

    output_plaintext.copy_from_slice(input_glwe_ciphertext.get_body());
    let polynomial_size = input_glwe_ciphertext.polynomial_size().0;
    for (index, mask_polynomial) in input_glwe_ciphertext
        .get_mask()
        .chunks_exact(polynomial_size)
        .enumerate()
    {
        polynomial_wrapping_sub_mul_assign(
            output_plaintext,
            mask_polynomial,
            glwe_secret_key.get_polynomial(index),
        );
    }
}

/// Fill a [`GLWE ciphertext`](`GlweCiphertext`) with a trivial encryption of the plaintext: zero
/// mask, plaintext body.
pub fn trivially_encrypt_glwe_ciphertext<OutputCont>(
    output: &mut GlweCiphertext<OutputCont>,
    encoded: &[u64],
) where
    OutputCont: ContainerMut,
{
    assert!(
        encoded.len() == output.polynomial_size().0,
        "Mismatched input PlaintextCount {} and output PolynomialSize {:?}",
        encoded.len(),
        output.polynomial_size()
    );

    let (mask, body) = output.get_mut_mask_and_body();
    mask.fill(0);
    body.copy_from_slice(encoded);
}

/// Allocate a new [`GLWE ciphertext`](`GlweCiphertext`) holding a trivial encryption of the
/// plaintext polynomial. This is how lookup tables are usually handed to a bootstrap.
pub fn allocate_and_trivially_encrypt_new_glwe_ciphertext(
    glwe_size: GlweSize,
    encoded: &[u64],
    ciphertext_modulus: CiphertextModulus,
) -> GlweCiphertextOwned {
    let mut new_ct = GlweCiphertextOwned::new(
        0,
        glwe_size,
        PolynomialSize(encoded.len()),
        ciphertext_modulus,
    );

    trivially_encrypt_glwe_ciphertext(&mut new_ct, encoded);

    new_ct
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core_crypto::algorithms::glwe_secret_key_generation::*;
    use crate::core_crypto::commons::dispersion::StandardDev;
    use crate::core_crypto::commons::generators::{new_seed, SecretRandomGenerator};

    #[test]
    fn encrypt_decrypt_glwe() {
        let mut secret_generator = SecretRandomGenerator::new(new_seed());
        let mut encryption_generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
        let polynomial_size = PolynomialSize(256);
        let key = allocate_and_generate_new_binary_glwe_secret_key(
            GlweDimension(2),
            polynomial_size,
            &mut secret_generator,
        );
        let plaintext: Vec<u64> = (0..polynomial_size.0 as u64).map(|i| (i % 8) << 61).collect();
        let ct = allocate_and_encrypt_new_glwe_ciphertext(
            &key,
            &plaintext,
            StandardDev(2_f64.powi(-45)),
            CiphertextModulus::new_native(),
            &mut encryption_generator,
        );

        let mut decrypted = vec![0u64; polynomial_size.0];
        decrypt_glwe_ciphertext(&key, &ct, &mut decrypted);
        for (d, p) in decrypted.iter().zip(plaintext.iter()) {
            // Round away the noise, top 3 bits carry the message
            let rounded = d.wrapping_add(1 << 60) >> 61 << 61;
            assert_eq!(rounded, *p);
        }
    }
}
