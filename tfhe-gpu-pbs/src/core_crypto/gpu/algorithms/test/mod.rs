use crate::core_crypto::algorithms::test::*;
use crate::core_crypto::gpu::pbs::{
    PbsEngine, PbsEngineConfig, PbsIndexes, PbsKeys, PbsRequest, SelectorThresholds,
};
use crate::core_crypto::gpu::{
    GpuBootstrapKey, GpuGlweCiphertextList, GpuLweBootstrapKey, GpuLweCiphertextList,
    GpuLweKeyswitchKey, GpuLweMultiBitBootstrapKey, GpuStreams, GpuTarget,
};
use crate::core_crypto::prelude::*;
use tfhe_gpu_sim::{DeviceProperties, GpuIndex};

mod lwe_keyswitch;
mod lwe_multi_bit_programmable_bootstrapping;
mod lwe_programmable_bootstrapping;

pub const TEST_THRESHOLDS: SelectorThresholds = SelectorThresholds {
    tbc_min_polynomial_size: PolynomialSize(1024),
    cg_min_batch_size: 8,
};

pub fn h100() -> DeviceProperties {
    DeviceProperties::h100()
}

pub fn a100() -> DeviceProperties {
    DeviceProperties::a100()
}

pub fn t4() -> DeviceProperties {
    DeviceProperties::t4()
}

/// A device, its streams and an engine running on it.
pub struct GpuTestContext {
    pub target: GpuTarget,
    pub streams: GpuStreams,
    pub engine: PbsEngine,
}

impl GpuTestContext {
    pub fn new(properties: DeviceProperties) -> Self {
        Self::with_config(properties, PbsEngineConfig::new(TEST_THRESHOLDS), 1)
    }

    pub fn with_config(
        properties: DeviceProperties,
        config: PbsEngineConfig,
        stream_count: usize,
    ) -> Self {
        let target = GpuTarget::new(GpuIndex(0), properties);
        let streams = GpuStreams::new(&target, stream_count);
        let engine = PbsEngine::new(&target, config);
        Self {
            target,
            streams,
            engine,
        }
    }
}

/// Host keys of [`TestKeys`] uploaded to a device.
pub struct GpuTestKeys {
    pub bsk: GpuBootstrapKey,
    pub multi_bit_bsk: GpuBootstrapKey,
    pub ksk: GpuLweKeyswitchKey,
}

impl GpuTestKeys {
    pub fn upload(keys: &TestKeys, streams: &GpuStreams) -> Self {
        Self {
            bsk: GpuLweBootstrapKey::from_lwe_bootstrap_key(&keys.bsk, streams)
                .unwrap()
                .into(),
            multi_bit_bsk: GpuLweMultiBitBootstrapKey::from_lwe_multi_bit_bootstrap_key(
                &keys.multi_bit_bsk,
                streams,
            )
            .unwrap()
            .into(),
            ksk: GpuLweKeyswitchKey::from_lwe_keyswitch_key(&keys.ksk, streams).unwrap(),
        }
    }

    pub fn pbs_keys(&self, multi_bit: bool) -> PbsKeys<'_> {
        let bsk = if multi_bit {
            &self.multi_bit_bsk
        } else {
            &self.bsk
        };
        PbsKeys::new(bsk, &self.ksk)
    }
}

/// Encrypted messages, the look-up tables to apply to them and the keys to do so.
pub struct PbsTestCase {
    pub params: TestParams,
    pub keys: TestKeys,
    pub messages: Vec<u64>,
    pub input: LweCiphertextListOwned,
    pub luts: GlweCiphertextListOwned,
    pub functions: Vec<fn(u64, u64) -> u64>,
}

fn double_minus_one(x: u64, message_modulus: u64) -> u64 {
    test_lut_function(message_modulus)(x)
}

fn square(x: u64, message_modulus: u64) -> u64 {
    (x * x) % message_modulus
}

impl PbsTestCase {
    /// `count` ciphertexts of messages cycling through the message space, with two look-up
    /// tables.
    pub fn new(params: TestParams, count: usize) -> Self {
        let mut rsc = TestResources::new();
        let keys = TestKeys::generate(&params, &mut rsc);
        let message_modulus = params.message_modulus();
        let delta = params.delta();
        let glwe_size = params.glwe_dimension.to_glwe_size();

        let functions: Vec<fn(u64, u64) -> u64> = vec![double_minus_one, square];
        let mut luts = GlweCiphertextListOwned::new(
            0,
            glwe_size,
            params.polynomial_size,
            GlweCiphertextCount(functions.len()),
            params.ciphertext_modulus,
        );
        for (index, f) in functions.iter().enumerate() {
            let lut = generate_programmable_bootstrap_glwe_lut(
                params.polynomial_size,
                glwe_size,
                message_modulus as usize,
                params.ciphertext_modulus,
                delta,
                |x| f(x, message_modulus),
            );
            luts.get_mut(index).as_mut().copy_from_slice(lut.as_ref());
        }

        let messages: Vec<u64> = (0..count as u64).map(|i| i % message_modulus).collect();
        let plaintexts: Vec<Plaintext> = messages.iter().map(|&m| Plaintext(m * delta)).collect();
        let mut input = LweCiphertextListOwned::new(
            0,
            params.lwe_dimension.to_lwe_size(),
            LweCiphertextCount(count),
            params.ciphertext_modulus,
        );
        encrypt_lwe_ciphertext_list(
            &keys.input_lwe_secret_key,
            &mut input,
            &plaintexts,
            params.lwe_modular_std_dev,
            &mut rsc.encryption_random_generator,
        );

        Self {
            params,
            keys,
            messages,
            input,
            luts,
            functions,
        }
    }

    /// Bootstrap then key switch on the host, ciphertexts the batch does not write stay zero.
    pub fn host_reference(
        &self,
        indexes: &PbsIndexes,
        output_count: usize,
        multi_bit: bool,
    ) -> LweCiphertextListOwned {
        let ciphertext_modulus = self.params.ciphertext_modulus;
        let big_lwe_size = self.keys.output_lwe_secret_key().lwe_dimension().to_lwe_size();
        let mut output = LweCiphertextListOwned::new(
            0,
            self.params.lwe_dimension.to_lwe_size(),
            LweCiphertextCount(output_count),
            ciphertext_modulus,
        );
        for i in 0..indexes.batch_size() {
            let input = self.input.get(indexes.input_indexes[i]);
            let lut = self.luts.get(indexes.lut_indexes[i]);
            let mut big = LweCiphertext::new(0, big_lwe_size, ciphertext_modulus);
            if multi_bit {
                multi_bit_programmable_bootstrap_lwe_ciphertext(
                    &input,
                    &mut big,
                    &lut,
                    &self.keys.multi_bit_bsk,
                );
            } else {
                programmable_bootstrap_lwe_ciphertext(&input, &mut big, &lut, &self.keys.bsk);
            }
            let mut small = output.get_mut(indexes.output_indexes[i]);
            keyswitch_lwe_ciphertext(&self.keys.ksk, &big, &mut small);
        }
        output
    }

    /// The message ciphertext `i` of the batch decrypts to.
    pub fn expected_message(&self, indexes: &PbsIndexes, i: usize) -> u64 {
        let f = self.functions[indexes.lut_indexes[i]];
        f(
            self.messages[indexes.input_indexes[i]],
            self.params.message_modulus(),
        )
    }

    pub fn decrypt(&self, output: &LweCiphertextListOwned) -> Vec<u64> {
        let message_modulus = self.params.message_modulus();
        decrypt_lwe_ciphertext_list(&self.keys.input_lwe_secret_key, output)
            .iter()
            .map(|plaintext| round_decode(plaintext.0, self.params.delta()) % message_modulus)
            .collect()
    }

    pub fn upload(
        &self,
        streams: &GpuStreams,
    ) -> (GpuLweCiphertextList, GpuGlweCiphertextList, GpuTestKeys) {
        (
            GpuLweCiphertextList::from_lwe_ciphertext_list(&self.input, streams).unwrap(),
            GpuGlweCiphertextList::from_glwe_ciphertext_list(&self.luts, streams).unwrap(),
            GpuTestKeys::upload(&self.keys, streams),
        )
    }

    pub fn new_output(&self, count: usize, streams: &GpuStreams) -> GpuLweCiphertextList {
        GpuLweCiphertextList::new(
            self.params.lwe_dimension,
            LweCiphertextCount(count),
            self.params.ciphertext_modulus,
            streams,
        )
        .unwrap()
    }
}

/// A batch reading its inputs in reverse, alternating look-up tables and writing its outputs
/// shifted by one.
pub fn shuffled_indexes(count: usize) -> PbsIndexes {
    PbsIndexes {
        input_indexes: (0..count).rev().collect(),
        output_indexes: (0..count).map(|i| (i + 1) % count).collect(),
        lut_indexes: (0..count).map(|i| i % 2).collect(),
    }
}

pub fn run_on_gpu(
    context: &GpuTestContext,
    request: &PbsRequest<'_>,
    output: &mut GpuLweCiphertextList,
) -> LweCiphertextListOwned {
    context
        .engine
        .programmable_bootstrap(&context.streams, request, output)
        .unwrap();
    output.to_lwe_ciphertext_list(&context.streams).unwrap()
}

// Macro to generate tests for all device presets
macro_rules! create_gpu_parameterized_test{
    ($name:ident { $($device:ident),* }) => {
        ::paste::paste! {
            $(
            #[test]
            fn [<test_gpu_ $name _ $device:lower>]() {
                $name($device())
            }
            )*
        }
    };
    ($name:ident)=> {
        create_gpu_parameterized_test!($name
        {
            h100,
            a100,
            t4
        });
    };
}

use create_gpu_parameterized_test;
