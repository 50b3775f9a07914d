//! Module containing primitives pertaining to LWE ciphertext keyswitch.

use crate::core_crypto::algorithms::slice_algorithms::*;
use crate::core_crypto::commons::math::decomposition::SignedDecomposer;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Keyswitch an [`LWE ciphertext`](`LweCiphertext`) encrypted under an
/// [`LWE secret key`](`LweSecretKey`) to another [`LWE secret key`](`LweSecretKey`).
///
/// The output starts as the trivial encryption of the input body, then for every input mask
/// coefficient $a\_i$ decomposed as $\sum\_j d\_{i,j} q / B^j$, the key ciphertexts
/// $d\_{i,j} \cdot KSK\_{i,j}$ are subtracted.
///
/// # Panics
///
/// Panics if the key dimensions do not match the ciphertexts.
pub fn keyswitch_lwe_ciphertext<KSKCont, InputCont, OutputCont>(
    lwe_keyswitch_key: &LweKeyswitchKey<KSKCont>,
    input_lwe_ciphertext: &LweCiphertext<InputCont>,
    output_lwe_ciphertext: &mut LweCiphertext<OutputCont>,
) where
    KSKCont: Container,
    InputCont: Container,
    OutputCont: ContainerMut,
{
    assert!(
        lwe_keyswitch_key.input_key_lwe_dimension()
            == input_lwe_ciphertext.lwe_size().to_lwe_dimension(),
        "Mismatched input LweDimension. \
        LweKeyswitchKey input LweDimension: {:?}, input LweCiphertext LweDimension {:?}.",
        lwe_keyswitch_key.input_key_lwe_dimension(),
        input_lwe_ciphertext.lwe_size().to_lwe_dimension(),
    );
    assert!(
        lwe_keyswitch_key.output_key_lwe_dimension()
            == output_lwe_ciphertext.lwe_size().to_lwe_dimension(),
        "Mismatched output LweDimension. \
        LweKeyswitchKey output LweDimension: {:?}, output LweCiphertext LweDimension {:?}.",
        lwe_keyswitch_key.output_key_lwe_dimension(),
        output_lwe_ciphertext.lwe_size().to_lwe_dimension(),
    );

    // Clear the output ciphertext, as it will get updated gradually
    output_lwe_ciphertext.as_mut().fill(0);

    // Copy the input body to the output ciphertext
    *output_lwe_ciphertext.get_mut_mask_and_body().1 = input_lwe_ciphertext.get_body();

    // We instantiate a decomposer
    let decomposer = SignedDecomposer::new(
        lwe_keyswitch_key.decomposition_base_log(),
        lwe_keyswitch_key.decomposition_level_count(),
    );

    for (input_key_index, &input_mask_element) in
        input_lwe_ciphertext.get_mask().iter().enumerate()
    {
        let keyswitch_key_block = lwe_keyswitch_key.get(input_key_index);
        let decomposition_iter = decomposer.decompose(input_mask_element);
        // loop over the number of levels in reverse (from highest to lowest)
        for (level_key_ciphertext, decomposed) in
            keyswitch_key_block.iter().rev().zip(decomposition_iter)
        {
            slice_wrapping_sub_scalar_mul_assign(
                output_lwe_ciphertext.as_mut(),
                level_key_ciphertext.as_ref(),
                decomposed.value(),
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core_crypto::algorithms::*;
    use crate::core_crypto::commons::dispersion::StandardDev;
    use crate::core_crypto::commons::generators::{
        new_seed, EncryptionRandomGenerator, SecretRandomGenerator,
    };
    use crate::core_crypto::commons::parameters::*;

    #[test]
    fn keyswitch_preserves_message() {
        let mut secret_generator = SecretRandomGenerator::new(new_seed());
        let mut encryption_generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
        let big_key =
            allocate_and_generate_new_binary_lwe_secret_key(LweDimension(512), &mut secret_generator);
        let small_key =
            allocate_and_generate_new_binary_lwe_secret_key(LweDimension(64), &mut secret_generator);
        let noise = StandardDev(2_f64.powi(-50));
        let ksk = allocate_and_generate_new_lwe_keyswitch_key(
            &big_key,
            &small_key,
            DecompositionBaseLog(4),
            DecompositionLevelCount(6),
            noise,
            CiphertextModulus::new_native(),
            &mut encryption_generator,
        );

        for msg in 0..8u64 {
            let input = allocate_and_encrypt_new_lwe_ciphertext(
                &big_key,
                Plaintext(msg << 61),
                noise,
                CiphertextModulus::new_native(),
                &mut encryption_generator,
            );
            let mut output =
                LweCiphertext::new(0, LweSize(65), CiphertextModulus::new_native());
            keyswitch_lwe_ciphertext(&ksk, &input, &mut output);

            let decrypted = decrypt_lwe_ciphertext(&small_key, &output);
            let rounded = decrypted.0.wrapping_add(1 << 60) >> 61;
            assert_eq!(rounded, msg);
        }
    }
}
