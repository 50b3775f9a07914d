use super::*;
use crate::core_crypto::gpu::pbs::{
    PbsBuffer, PbsSelectionHint, PbsType, PbsVariant, ValidationLimits,
};
use crate::error::ErrorKind;
use tfhe_gpu_sim::DeviceError;

fn classical_hint(variant: PbsVariant) -> PbsSelectionHint {
    PbsSelectionHint {
        pbs_type: Some(PbsType::Classical),
        variant: Some(variant),
    }
}

fn gpu_pbs_classical_default_decrypts(properties: DeviceProperties) {
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N1024, 4);
    let context = GpuTestContext::new(properties);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let mut d_output = case.new_output(4, &context.streams);

    let indexes = PbsIndexes::identity(4);
    let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false))
        .with_indexes(&indexes)
        .with_hint(classical_hint(PbsVariant::Default));
    let output = run_on_gpu(&context, &request, &mut d_output);

    let decrypted = case.decrypt(&output);
    for (i, &message) in decrypted.iter().enumerate() {
        assert_eq!(message, case.expected_message(&indexes, i));
    }
    assert_eq!(output, case.host_reference(&indexes, 4, false));
}

create_gpu_parameterized_test!(gpu_pbs_classical_default_decrypts);

fn gpu_pbs_variants_match_host_reference(properties: DeviceProperties) {
    let count = 6;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
    let context = GpuTestContext::new(properties);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let indexes = shuffled_indexes(count);
    let expected = case.host_reference(&indexes, count, false);

    let mut ran = Vec::new();
    for variant in [PbsVariant::Default, PbsVariant::Cg, PbsVariant::Tbc] {
        let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false))
            .with_indexes(&indexes)
            .with_hint(classical_hint(variant));
        let mut d_output = case.new_output(count, &context.streams);
        match context
            .engine
            .programmable_bootstrap(&context.streams, &request, &mut d_output)
        {
            Ok(plan) => {
                assert_eq!(plan.selection.variant, variant);
                let output = d_output.to_lwe_ciphertext_list(&context.streams).unwrap();
                assert_eq!(output, expected, "{variant:?} differs from the host reference");
                ran.push(variant);
            }
            Err(err) => assert!(
                matches!(err.kind(), ErrorKind::UnsupportedVariant { .. }),
                "{variant:?}: {err}"
            ),
        }
    }

    let props = context.target.properties();
    assert!(ran.contains(&PbsVariant::Default));
    assert_eq!(
        ran.contains(&PbsVariant::Cg),
        props.supports_cooperative_launch()
    );
    assert_eq!(
        ran.contains(&PbsVariant::Tbc),
        props.supports_cluster_launch()
    );
}

create_gpu_parameterized_test!(gpu_pbs_variants_match_host_reference);

fn gpu_pbs_automatic_selection_matches_host_reference(properties: DeviceProperties) {
    // Batches on both sides of the cooperative threshold
    for count in [2, TEST_THRESHOLDS.cg_min_batch_size] {
        let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
        let context = GpuTestContext::new(properties.clone());
        let (d_input, d_luts, d_keys) = case.upload(&context.streams);
        let mut d_output = case.new_output(count, &context.streams);

        let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false));
        let output = run_on_gpu(&context, &request, &mut d_output);
        assert_eq!(
            output,
            case.host_reference(&PbsIndexes::identity(count), count, false)
        );
    }
}

create_gpu_parameterized_test!(gpu_pbs_automatic_selection_matches_host_reference);

#[test]
fn test_gpu_pbs_batch_bounds() {
    let max_batch_size = 5;
    let mut config = PbsEngineConfig::new(TEST_THRESHOLDS);
    config.limits = ValidationLimits { max_batch_size };
    let context = GpuTestContext::with_config(h100(), config, 1);

    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, max_batch_size + 1);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let mut d_output = case.new_output(max_batch_size + 1, &context.streams);

    for batch_size in [1, max_batch_size] {
        let indexes = PbsIndexes::identity(batch_size);
        let request =
            PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false)).with_indexes(&indexes);
        let output = run_on_gpu(&context, &request, &mut d_output);
        let expected = case.host_reference(&indexes, max_batch_size + 1, false);
        for i in 0..batch_size {
            assert_eq!(output.get(i), expected.get(i));
        }
    }

    for batch_size in [0, max_batch_size + 1] {
        let indexes = PbsIndexes::identity(batch_size);
        let request =
            PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false)).with_indexes(&indexes);
        let err = context
            .engine
            .programmable_bootstrap(&context.streams, &request, &mut d_output)
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidParameters {
                field: "batch_size",
                ..
            }
        ));
    }
}

#[test]
fn test_gpu_pbs_tbc_without_cluster_support() {
    let context = GpuTestContext::new(a100());
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, 1);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let mut d_output = case.new_output(1, &context.streams);

    let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false))
        .with_hint(PbsSelectionHint::with_variant(PbsVariant::Tbc));
    let err = context
        .engine
        .programmable_bootstrap(&context.streams, &request, &mut d_output)
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedVariant {
            variant: Some(PbsVariant::Tbc),
            ..
        }
    ));
}

/// An output list whose every word is `value`.
fn filled_output(
    case: &PbsTestCase,
    lwe_dimension: LweDimension,
    count: usize,
    value: u64,
    streams: &GpuStreams,
) -> (LweCiphertextListOwned, GpuLweCiphertextList) {
    let host = LweCiphertextListOwned::new(
        value,
        lwe_dimension.to_lwe_size(),
        LweCiphertextCount(count),
        case.params.ciphertext_modulus,
    );
    let device = GpuLweCiphertextList::from_lwe_ciphertext_list(&host, streams).unwrap();
    (host, device)
}

#[test]
fn test_gpu_pbs_keyswitch_key_mismatch_leaves_output_untouched() {
    let context = GpuTestContext::new(h100());
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, 2);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);

    // The key switching key produces ciphertexts of the input dimension, not this one
    let wrong_dimension = LweDimension(case.params.lwe_dimension.0 + 1);
    let (before, mut d_output) = filled_output(&case, wrong_dimension, 2, 7, &context.streams);

    let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false));
    let err = context
        .engine
        .programmable_bootstrap(&context.streams, &request, &mut d_output)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::DimensionMismatch {
            what: "keyswitch key output dimension",
            expected: wrong_dimension.0,
            got: case.params.lwe_dimension.0,
        }
    );
    assert_eq!(
        d_output.to_lwe_ciphertext_list(&context.streams).unwrap(),
        before
    );
}

#[test]
fn test_gpu_pbs_device_failure_leaves_output_untouched() {
    for variant in [PbsVariant::Default, PbsVariant::Cg, PbsVariant::Tbc] {
        let context = GpuTestContext::new(h100());
        let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, 2);
        let (d_input, d_luts, d_keys) = case.upload(&context.streams);
        let (before, mut d_output) =
            filled_output(&case, case.params.lwe_dimension, 2, 7, &context.streams);

        let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false))
            .with_hint(classical_hint(variant));
        context.target.device().inject_launch_failure();
        let err = context
            .engine
            .programmable_bootstrap(&context.streams, &request, &mut d_output)
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::DeviceFailure(DeviceError::LaunchFailure { .. })
        ));
        assert_eq!(
            d_output.to_lwe_ciphertext_list(&context.streams).unwrap(),
            before
        );

        // The stream is usable again once the failure has been reported
        let output = run_on_gpu(&context, &request, &mut d_output);
        assert_eq!(output, case.host_reference(&PbsIndexes::identity(2), 2, false));
    }
}

#[test]
fn test_gpu_pbs_rotation_fault_leaves_output_untouched() {
    let context = GpuTestContext::new(h100());
    let count = 2;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let expected = case.host_reference(&PbsIndexes::identity(count), count, false);
    let device = context.target.device();

    for (variant, kernel) in [
        (PbsVariant::Default, "pbs_default_step_two"),
        (PbsVariant::Cg, "pbs_cooperative_rotation"),
        (PbsVariant::Tbc, "pbs_cluster_rotation"),
    ] {
        let (before, mut d_output) =
            filled_output(&case, case.params.lwe_dimension, count, 7, &context.streams);
        let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false))
            .with_hint(classical_hint(variant));

        device.inject_kernel_fault(kernel);
        let err = context
            .engine
            .programmable_bootstrap(&context.streams, &request, &mut d_output)
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::DeviceFailure(DeviceError::KernelFault {
                kernel: kernel.to_string(),
                message: "injected fault".to_string(),
            })
        );
        assert_eq!(
            d_output.to_lwe_ciphertext_list(&context.streams).unwrap(),
            before,
            "{variant:?}"
        );

        let slot = device.exclusive_launch_slot();
        assert!(slot.try_lock().is_ok(), "{variant:?} kept the launch slot");

        let output = run_on_gpu(&context, &request, &mut d_output);
        assert_eq!(output, expected, "{variant:?}");
    }
}

#[test]
fn test_gpu_pbs_async_batches_report_their_own_failure() {
    let context = GpuTestContext::new(h100());
    let count = 2;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let expected = case.host_reference(&PbsIndexes::identity(count), count, false);
    let request = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false));
    // Only the failing batch launches the cluster rotation
    let failing_request = request.with_hint(classical_hint(PbsVariant::Tbc));
    let other_request = request.with_hint(classical_hint(PbsVariant::Default));
    let device = context.target.device();
    let stream = context.streams.main_stream();

    for failing_first in [true, false] {
        let (before, mut d_failing) =
            filled_output(&case, case.params.lwe_dimension, count, 7, &context.streams);
        let mut d_other = case.new_output(count, &context.streams);
        let memory_in_use = device.memory_in_use();

        device.inject_kernel_fault("pbs_cluster_rotation");
        let (failing, other) = if failing_first {
            let failing = context
                .engine
                .programmable_bootstrap_async(stream, &failing_request, &mut d_failing)
                .unwrap();
            let other = context
                .engine
                .programmable_bootstrap_async(stream, &other_request, &mut d_other)
                .unwrap();
            (failing, other)
        } else {
            let other = context
                .engine
                .programmable_bootstrap_async(stream, &other_request, &mut d_other)
                .unwrap();
            let failing = context
                .engine
                .programmable_bootstrap_async(stream, &failing_request, &mut d_failing)
                .unwrap();
            (failing, other)
        };
        // Batch buffers live until their batch is waited for
        assert!(device.memory_in_use() > memory_in_use);

        let err = failing.wait().unwrap_err();
        assert!(
            matches!(
                err.kind(),
                ErrorKind::DeviceFailure(DeviceError::KernelFault { .. })
            ),
            "{err}"
        );
        other.wait().unwrap();
        context.streams.synchronize().unwrap();
        assert_eq!(device.memory_in_use(), memory_in_use);

        assert_eq!(
            d_failing.to_lwe_ciphertext_list(&context.streams).unwrap(),
            before
        );
        assert_eq!(
            d_other.to_lwe_ciphertext_list(&context.streams).unwrap(),
            expected
        );
    }
}

#[test]
fn test_gpu_pbs_async_matches_blocking() {
    let context = GpuTestContext::new(a100());
    let count = 4;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let indexes = shuffled_indexes(count);
    let request =
        PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false)).with_indexes(&indexes);

    let mut d_output = case.new_output(count, &context.streams);
    let in_flight = context
        .engine
        .programmable_bootstrap_async(context.streams.main_stream(), &request, &mut d_output)
        .unwrap();
    let plan = *in_flight.plan();
    assert_eq!(in_flight.wait().unwrap(), plan);
    let expected = case.host_reference(&indexes, count, false);
    assert_eq!(
        d_output.to_lwe_ciphertext_list(&context.streams).unwrap(),
        expected
    );

    // Dropping the handle waits for the batch
    let mut d_output = case.new_output(count, &context.streams);
    drop(
        context
            .engine
            .programmable_bootstrap_async(context.streams.main_stream(), &request, &mut d_output)
            .unwrap(),
    );
    assert_eq!(
        d_output.to_lwe_ciphertext_list(&context.streams).unwrap(),
        expected
    );
}

#[test]
fn test_gpu_pbs_with_caller_buffer() {
    let context = GpuTestContext::new(h100());
    let count = 4;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);
    let mut d_output = case.new_output(count, &context.streams);

    let full = PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false));
    let plan = context.engine.plan(&full, &d_output).unwrap();
    let mut buffer = PbsBuffer::new(&plan, &context.target).unwrap();
    assert_eq!(buffer.size_bytes(), plan.buffers.total_bytes());

    // A buffer serves any batch it covers, several times
    let half = PbsIndexes::identity(count / 2);
    for request in [full, full.with_indexes(&half)] {
        let indexes = request
            .indexes
            .cloned()
            .unwrap_or_else(|| PbsIndexes::identity(count));
        context
            .engine
            .programmable_bootstrap_with_buffer(&context.streams, &request, &mut d_output, &mut buffer)
            .unwrap();
        let output = d_output.to_lwe_ciphertext_list(&context.streams).unwrap();
        let expected = case.host_reference(&indexes, count, false);
        for i in 0..indexes.batch_size() {
            assert_eq!(output.get(i), expected.get(i));
        }
    }

    let small_plan = context
        .engine
        .plan(&full.with_indexes(&half), &d_output)
        .unwrap();
    let mut small = PbsBuffer::new(&small_plan, &context.target).unwrap();
    let err = context
        .engine
        .programmable_bootstrap_with_buffer(&context.streams, &full, &mut d_output, &mut small)
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidParameters {
            field: "buffer",
            ..
        }
    ));
}

#[test]
fn test_gpu_pbs_batches_on_several_streams() {
    let context =
        GpuTestContext::with_config(h100(), PbsEngineConfig::new(TEST_THRESHOLDS), 2);
    let count = 4;
    let case = PbsTestCase::new(TEST_PARAMS_2_BITS_N256, count);
    let (d_input, d_luts, d_keys) = case.upload(&context.streams);

    let index_sets = [
        PbsIndexes::identity(count),
        shuffled_indexes(count),
        PbsIndexes {
            input_indexes: vec![1, 1],
            output_indexes: vec![3, 0],
            lut_indexes: vec![0, 1],
        },
    ];
    let requests: Vec<PbsRequest<'_>> = index_sets
        .iter()
        .zip([
            PbsVariant::Default,
            PbsVariant::Tbc,
            PbsVariant::Cg,
        ])
        .map(|(indexes, variant)| {
            PbsRequest::new(&d_input, &d_luts, d_keys.pbs_keys(false))
                .with_indexes(indexes)
                .with_hint(classical_hint(variant))
        })
        .collect();
    let mut outputs: Vec<GpuLweCiphertextList> = index_sets
        .iter()
        .map(|_| case.new_output(count, &context.streams))
        .collect();

    let plans = context
        .engine
        .programmable_bootstrap_batches(&context.streams, &requests, &mut outputs)
        .unwrap();
    assert_eq!(plans.len(), index_sets.len());

    for (indexes, output) in index_sets.iter().zip(outputs.iter()) {
        assert_eq!(
            output.to_lwe_ciphertext_list(&context.streams).unwrap(),
            case.host_reference(indexes, count, false)
        );
    }

    // A mismatched output count is rejected before anything runs
    let err = context
        .engine
        .programmable_bootstrap_batches(&context.streams, &requests, &mut outputs[..2])
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidParameters {
            field: "outputs",
            ..
        }
    ));
}
