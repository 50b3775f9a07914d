//! Module containing primitives pertaining to [`GGSW ciphertext`](`GgswCiphertext`) encryption.

use crate::core_crypto::algorithms::glwe_encryption::*;
use crate::core_crypto::commons::dispersion::DispersionParameter;
use crate::core_crypto::commons::generators::EncryptionRandomGenerator;
use crate::core_crypto::commons::math::decomposition::SignedDecomposer;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Encrypt a constant cleartext $m$ in an output [`GGSW ciphertext`](`GgswCiphertext`).
///
/// Row $r$ of the level $j$ matrix is a GLWE encryption of zero to which
/// $m \cdot q / B^j$ is added on its polynomial $r$, so that its phase is
/// $-m \cdot S\_r \cdot q / B^j$ for a mask row and $m \cdot q / B^j$ for the body row.
pub fn encrypt_constant_ggsw_ciphertext<KeyCont, OutputCont>(
    glwe_secret_key: &GlweSecretKey<KeyCont>,
    output: &mut GgswCiphertext<OutputCont>,
    cleartext: Cleartext,
    noise_parameters: impl DispersionParameter,
    generator: &mut EncryptionRandomGenerator,
) where
    KeyCont: Container,
    OutputCont: ContainerMut,
{
    assert!(
        output.polynomial_size() == glwe_secret_key.polynomial_size(),
        "Mismatch between polynomial sizes of output ciphertexts and input secret key. \
        Got {:?} in output, and {:?} in secret key.",
        output.polynomial_size(),
        glwe_secret_key.polynomial_size()
    );

    assert!(
        output.glwe_size().to_glwe_dimension() == glwe_secret_key.glwe_dimension(),
        "Mismatch between GlweDimension of output ciphertexts and input secret key. \
        Got {:?} in output, and {:?} in secret key.",
        output.glwe_size().to_glwe_dimension(),
        glwe_secret_key.glwe_dimension()
    );

    let decomposer = SignedDecomposer::new(
        output.decomposition_base_log(),
        output.decomposition_level_count(),
    );
    let zero = vec![0u64; output.polynomial_size().0];
    let glwe_size = output.glwe_size();

    for level_index in 0..output.decomposition_level_count().0 {
        let factor = cleartext
            .0
            .wrapping_mul(decomposer.level_scaling(level_index + 1));

        for row in 0..glwe_size.0 {
            let mut row_as_glwe = output.get_mut_row(level_index, row);
            encrypt_glwe_ciphertext(
                glwe_secret_key,
                &mut row_as_glwe,
                &zero,
                noise_parameters,
                generator,
            );
            // The constant term of polynomial `row` carries the factor
            let polynomial = row_as_glwe.get_mut_polynomial(row);
            polynomial[0] = polynomial[0].wrapping_add(factor);
        }
    }
}

/// Decrypt the last level of a [`GGSW ciphertext`](`GgswCiphertext`) body row, returning the
/// constant it encrypts. Only meaningful for small cleartexts.
pub fn decrypt_constant_ggsw_ciphertext<KeyCont, InputCont>(
    glwe_secret_key: &GlweSecretKey<KeyCont>,
    ggsw_ciphertext: &GgswCiphertext<InputCont>,
) -> Cleartext
where
    KeyCont: Container,
    InputCont: Container,
{
    let level_index = 0;
    let body_row = ggsw_ciphertext.get_row(level_index, ggsw_ciphertext.glwe_size().0 - 1);
    let mut decrypted = vec![0u64; ggsw_ciphertext.polynomial_size().0];
    decrypt_glwe_ciphertext(glwe_secret_key, &body_row, &mut decrypted);

    let decomposer = SignedDecomposer::new(
        ggsw_ciphertext.decomposition_base_log(),
        ggsw_ciphertext.decomposition_level_count(),
    );
    let scaling = decomposer.level_scaling(1);
    // Round to the closest multiple of q / B
    let rounded = decrypted[0].wrapping_add(scaling / 2);
    Cleartext(rounded / scaling)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core_crypto::algorithms::glwe_secret_key_generation::*;
    use crate::core_crypto::commons::dispersion::StandardDev;
    use crate::core_crypto::commons::generators::{new_seed, SecretRandomGenerator};
    use crate::core_crypto::commons::parameters::*;

    #[test]
    fn ggsw_rows_have_expected_phase() {
        let mut secret_generator = SecretRandomGenerator::new(new_seed());
        let mut encryption_generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
        let polynomial_size = PolynomialSize(256);
        let glwe_dimension = GlweDimension(1);
        let key = allocate_and_generate_new_binary_glwe_secret_key(
            glwe_dimension,
            polynomial_size,
            &mut secret_generator,
        );
        let mut ggsw = GgswCiphertextOwned::new(
            0,
            glwe_dimension.to_glwe_size(),
            polynomial_size,
            DecompositionBaseLog(8),
            DecompositionLevelCount(3),
            CiphertextModulus::new_native(),
        );
        encrypt_constant_ggsw_ciphertext(
            &key,
            &mut ggsw,
            Cleartext(1),
            StandardDev(2_f64.powi(-50)),
            &mut encryption_generator,
        );

        assert_eq!(decrypt_constant_ggsw_ciphertext(&key, &ggsw), Cleartext(1));

        // Mask row phase is -S_0 * q / B^j
        let decomposer =
            SignedDecomposer::new(DecompositionBaseLog(8), DecompositionLevelCount(3));
        for level_index in 0..3 {
            let mut phase = vec![0u64; polynomial_size.0];
            decrypt_glwe_ciphertext(&key, &ggsw.get_row(level_index, 0), &mut phase);
            let mut expected = key.get_polynomial(0).to_vec();
            expected
                .iter_mut()
                .for_each(|s| *s = s.wrapping_mul(decomposer.level_scaling(level_index + 1)));
            for (p, e) in phase.iter().zip(expected.iter()) {
                let diff = p.wrapping_add(*e) as i64;
                assert!(diff.unsigned_abs() < 1 << 30);
            }
        }
    }
}
