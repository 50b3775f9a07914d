use super::*;
use crate::error::ErrorKind;

fn gpu_keyswitch_matches_host(properties: DeviceProperties) {
    let params = TEST_PARAMS_2_BITS_N256;
    let mut rsc = TestResources::new();
    let keys = TestKeys::generate(&params, &mut rsc);
    let context = GpuTestContext::new(properties);
    let big_lwe_secret_key = keys.output_lwe_secret_key();

    let count = 5;
    let messages: Vec<u64> = (0..count as u64)
        .map(|i| i % params.message_modulus())
        .collect();
    let plaintexts: Vec<Plaintext> = messages
        .iter()
        .map(|&m| Plaintext(m * params.delta()))
        .collect();
    let mut input = LweCiphertextListOwned::new(
        0,
        big_lwe_secret_key.lwe_dimension().to_lwe_size(),
        LweCiphertextCount(count),
        params.ciphertext_modulus,
    );
    encrypt_lwe_ciphertext_list(
        &big_lwe_secret_key,
        &mut input,
        &plaintexts,
        params.glwe_modular_std_dev,
        &mut rsc.encryption_random_generator,
    );

    let d_input = GpuLweCiphertextList::from_lwe_ciphertext_list(&input, &context.streams).unwrap();
    let d_ksk = GpuLweKeyswitchKey::from_lwe_keyswitch_key(&keys.ksk, &context.streams).unwrap();
    let mut d_output = GpuLweCiphertextList::new(
        params.lwe_dimension,
        LweCiphertextCount(count),
        params.ciphertext_modulus,
        &context.streams,
    )
    .unwrap();
    context
        .engine
        .keyswitch(&context.streams, &d_input, &mut d_output, &d_ksk)
        .unwrap();
    let output = d_output.to_lwe_ciphertext_list(&context.streams).unwrap();

    for (i, (big, small)) in input.iter().zip(output.iter()).enumerate() {
        let mut expected =
            LweCiphertext::new(0, params.lwe_dimension.to_lwe_size(), params.ciphertext_modulus);
        keyswitch_lwe_ciphertext(&keys.ksk, &big, &mut expected);
        assert_eq!(small.as_ref(), expected.as_ref());

        let decrypted = decrypt_lwe_ciphertext(&keys.input_lwe_secret_key, &small);
        assert_eq!(
            round_decode(decrypted.0, params.delta()) % params.message_modulus(),
            messages[i]
        );
    }
}

create_gpu_parameterized_test!(gpu_keyswitch_matches_host);

#[test]
fn test_gpu_keyswitch_rejects_mismatched_key() {
    let params = TEST_PARAMS_2_BITS_N256;
    let mut rsc = TestResources::new();
    let keys = TestKeys::generate(&params, &mut rsc);
    let context = GpuTestContext::new(a100());
    let d_ksk = GpuLweKeyswitchKey::from_lwe_keyswitch_key(&keys.ksk, &context.streams).unwrap();

    // Small ciphertexts cannot be switched by a key expecting big ones
    let small = |count| {
        GpuLweCiphertextList::new(
            params.lwe_dimension,
            LweCiphertextCount(count),
            params.ciphertext_modulus,
            &context.streams,
        )
        .unwrap()
    };
    let d_input = small(2);
    let mut d_output = small(2);
    let err = context
        .engine
        .keyswitch(&context.streams, &d_input, &mut d_output, &d_ksk)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::DimensionMismatch {
            what: "keyswitch key input dimension",
            expected: params.lwe_dimension.0,
            got: params.glwe_dimension.0 * params.polynomial_size.0,
        }
    );
}
