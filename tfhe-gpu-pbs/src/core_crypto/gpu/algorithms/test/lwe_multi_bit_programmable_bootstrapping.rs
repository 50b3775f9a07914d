use super::*;
use crate::core_crypto::gpu::pbs::{PbsSelectionHint, PbsType, PbsVariant, PlannerConfig};
use crate::error::ErrorKind;

fn multi_bit_hint(variant: PbsVariant) -> PbsSelectionHint {
    PbsSelectionHint {
        pbs_type: Some(PbsType::MultiBit),
        variant: Some(variant),
    }
}

fn gpu_multi_bit_pbs_variants_match_host_reference(properties: DeviceProperties) {
    let count = 4;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
    let indexes = shuffled_indexes(count);
    let expected = case.host_reference(&indexes, count, true);

    // 12 groups: chunks of 5, 5 and 2 groups, or a single chunk
    for max_lwe_chunk_size in [5, 16] {
        let mut config = PbsEngineConfig::new(TEST_THRESHOLDS);
        config.planner = PlannerConfig { max_lwe_chunk_size };
        let context = GpuTestContext::with_config(properties.clone(), config, 1);
        let (d_input, d_luts, d_keys) = case.upload(&context.streams);

        for variant in [PbsVariant::Default, PbsVariant::Cg, PbsVariant::Tbc] {
            let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(true))
                .with_indexes(&indexes)
                .with_hint(multi_bit_hint(variant));
            let mut d_output = case.new_output(count, &context.streams);
            match context
                .engine
                .programmable_bootstrap(&context.streams, &request, &mut d_output)
            {
                Ok(plan) => {
                    assert_eq!(plan.selection.pbs_type, PbsType::MultiBit);
                    assert!(plan.lwe_chunk_size.unwrap() <= max_lwe_chunk_size);
                    let output = d_output.to_lwe_ciphertext_list(&context.streams).unwrap();
                    assert_eq!(output, expected, "{variant:?} differs from the host reference");
                }
                Err(err) => {
                    assert!(
                        matches!(err.kind(), ErrorKind::UnsupportedVariant { .. }),
                        "{variant:?}: {err}"
                    );
                    assert_ne!(variant, PbsVariant::Default);
                }
            }
        }
    }
}

create_gpu_parameterized_test!(gpu_multi_bit_pbs_variants_match_host_reference);

fn gpu_multi_bit_and_classical_decrypt_alike(properties: DeviceProperties) {
    let count = 4;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N1024, count);
    let context = GpuTestContext::new(properties);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let indexes = shuffled_indexes(count);

    let mut decrypted = Vec::new();
    for multi_bit in [false, true] {
        let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(multi_bit))
            .with_indexes(&indexes);
        let mut d_output = case.new_output(count, &context.streams);
        let output = run_on_gpu(&context, &request, &mut d_output);
        decrypted.push(case.decrypt(&output));
    }

    assert_eq!(decrypted[0], decrypted[1]);
    for i in 0..count {
        assert_eq!(
            decrypted[1][indexes.output_indexes[i]],
            case.expected_message(&indexes, i)
        );
    }
}

create_gpu_parameterized_test!(gpu_multi_bit_and_classical_decrypt_alike);

#[test]
fn test_gpu_multi_bit_type_follows_the_key() {
    let context = GpuTestContext::new(h100());
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, 1);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let d_output = case.new_output(1, &context.streams);

    let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(true));
    let plan = context.engine.plan(&request, &d_output).unwrap();
    assert_eq!(plan.selection.pbs_type, PbsType::MultiBit);

    let request = request.with_hint(PbsSelectionHint::with_type(PbsType::Classical));
    let err = context.engine.plan(&request, &d_output).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedVariant {
            pbs_type: PbsType::Classical,
            ..
        }
    ));
}
