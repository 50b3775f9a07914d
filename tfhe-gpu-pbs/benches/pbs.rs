use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tfhe_gpu_pbs::core_crypto::gpu::pbs::{PbsRequest, SelectorThresholds};
use tfhe_gpu_pbs::core_crypto::prelude::*;
use tfhe_gpu_sim::{DeviceProperties, GpuIndex};

struct BenchParams {
    name: &'static str,
    lwe_dimension: LweDimension,
    glwe_dimension: GlweDimension,
    polynomial_size: PolynomialSize,
    pbs_base_log: DecompositionBaseLog,
    pbs_level: DecompositionLevelCount,
    ks_base_log: DecompositionBaseLog,
    ks_level: DecompositionLevelCount,
    grouping_factor: LweBskGroupingFactor,
}

// Small dimensions, every device block is simulated on the host
const BENCH_PARAMS: [BenchParams; 2] = [
    BenchParams {
        name: "N256",
        lwe_dimension: LweDimension(24),
        glwe_dimension: GlweDimension(1),
        polynomial_size: PolynomialSize(256),
        pbs_base_log: DecompositionBaseLog(15),
        pbs_level: DecompositionLevelCount(2),
        ks_base_log: DecompositionBaseLog(4),
        ks_level: DecompositionLevelCount(6),
        grouping_factor: LweBskGroupingFactor(2),
    },
    BenchParams {
        name: "N1024",
        lwe_dimension: LweDimension(24),
        glwe_dimension: GlweDimension(1),
        polynomial_size: PolynomialSize(1024),
        pbs_base_log: DecompositionBaseLog(15),
        pbs_level: DecompositionLevelCount(2),
        ks_base_log: DecompositionBaseLog(4),
        ks_level: DecompositionLevelCount(6),
        grouping_factor: LweBskGroupingFactor(3),
    },
];

const BATCH_SIZE: usize = 8;

fn gpu_pbs(criterion: &mut Criterion) {
    let bench_name = "core_crypto::gpu::pbs";
    let mut bench_group = criterion.benchmark_group(bench_name);

    let mut encryption_generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
    let mut secret_generator = SecretRandomGenerator::new(new_seed());
    let ciphertext_modulus = CiphertextModulus::new_native();
    let noise = StandardDev(8.881784197001252e-16);

    let target = GpuTarget::new(GpuIndex(0), DeviceProperties::h100());
    let streams = GpuStreams::new_single_gpu(&target);
    let engine = PbsEngine::new(
        &target,
        PbsEngineConfig::new(SelectorThresholds {
            tbc_min_polynomial_size: PolynomialSize(1024),
            cg_min_batch_size: 8,
        }),
    );

    for params in BENCH_PARAMS.iter() {
        let lwe_sk = allocate_and_generate_new_binary_lwe_secret_key(
            params.lwe_dimension,
            &mut secret_generator,
        );
        let glwe_sk = allocate_and_generate_new_binary_glwe_secret_key(
            params.glwe_dimension,
            params.polynomial_size,
            &mut secret_generator,
        );
        let bsk = par_allocate_and_generate_new_lwe_bootstrap_key(
            &lwe_sk,
            &glwe_sk,
            params.pbs_base_log,
            params.pbs_level,
            noise,
            ciphertext_modulus,
            &mut encryption_generator,
        );
        let multi_bit_bsk = par_allocate_and_generate_new_lwe_multi_bit_bootstrap_key(
            &lwe_sk,
            &glwe_sk,
            params.pbs_base_log,
            params.pbs_level,
            params.grouping_factor,
            noise,
            ciphertext_modulus,
            &mut encryption_generator,
        );
        let ksk = allocate_and_generate_new_lwe_keyswitch_key(
            &glwe_sk.as_lwe_secret_key(),
            &lwe_sk,
            params.ks_base_log,
            params.ks_level,
            noise,
            ciphertext_modulus,
            &mut encryption_generator,
        );
        let lut = generate_programmable_bootstrap_glwe_lut(
            params.polynomial_size,
            params.glwe_dimension.to_glwe_size(),
            4,
            ciphertext_modulus,
            1 << 61,
            |x| x,
        );
        let mut input = LweCiphertextListOwned::new(
            0,
            params.lwe_dimension.to_lwe_size(),
            LweCiphertextCount(BATCH_SIZE),
            ciphertext_modulus,
        );
        let plaintexts: Vec<Plaintext> = (0..BATCH_SIZE as u64)
            .map(|i| Plaintext((i % 4) << 61))
            .collect();
        encrypt_lwe_ciphertext_list(
            &lwe_sk,
            &mut input,
            &plaintexts,
            noise,
            &mut encryption_generator,
        );

        let d_input = GpuLweCiphertextList::from_lwe_ciphertext_list(&input, &streams).unwrap();
        let d_lut = GpuGlweCiphertextList::from_glwe_ciphertext(&lut, &streams).unwrap();
        let d_bsk: GpuBootstrapKey = GpuLweBootstrapKey::from_lwe_bootstrap_key(&bsk, &streams)
            .unwrap()
            .into();
        let d_multi_bit_bsk: GpuBootstrapKey =
            GpuLweMultiBitBootstrapKey::from_lwe_multi_bit_bootstrap_key(&multi_bit_bsk, &streams)
                .unwrap()
                .into();
        let d_ksk = GpuLweKeyswitchKey::from_lwe_keyswitch_key(&ksk, &streams).unwrap();
        let mut d_output = GpuLweCiphertextList::new(
            params.lwe_dimension,
            LweCiphertextCount(BATCH_SIZE),
            ciphertext_modulus,
            &streams,
        )
        .unwrap();

        for (pbs_type, d_key) in [
            (PbsType::Classical, &d_bsk),
            (PbsType::MultiBit, &d_multi_bit_bsk),
        ] {
            for variant in [PbsVariant::Default, PbsVariant::Cg, PbsVariant::Tbc] {
                let request = PbsRequest::new(&d_input, &d_lut, PbsKeys::new(d_key, &d_ksk))
                    .with_hint(PbsSelectionHint {
                        pbs_type: Some(pbs_type),
                        variant: Some(variant),
                    });
                if engine.plan(&request, &d_output).is_err() {
                    continue;
                }

                let id = format!("{bench_name}::{}::{pbs_type:?}::{variant:?}", params.name);
                bench_group.bench_function(&id, |b| {
                    b.iter(|| {
                        engine
                            .programmable_bootstrap(&streams, &request, &mut d_output)
                            .unwrap();
                        black_box(&mut d_output);
                    })
                });
            }
        }
    }
}

criterion_group!(
    name = pbs_group;
    config = Criterion::default().sample_size(10);
    targets = gpu_pbs
);
criterion_main!(pbs_group);
