use crate::core_crypto::prelude::*;
use paste::paste;


pub struct TestResources {
    pub encryption_random_generator: EncryptionRandomGenerator,
    pub secret_random_generator: SecretRandomGenerator,
}

impl TestResources {
    pub fn new() -> Self {
        let encryption_random_generator = EncryptionRandomGenerator::new(new_seed(), new_seed());
        let secret_random_generator = SecretRandomGenerator::new(new_seed());
        Self {
            encryption_random_generator,
            secret_random_generator,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TestParams {
    pub lwe_dimension: LweDimension,
    pub glwe_dimension: GlweDimension,
    pub polynomial_size: PolynomialSize,
    pub lwe_modular_std_dev: StandardDev,
    pub glwe_modular_std_dev: StandardDev,
    pub pbs_base_log: DecompositionBaseLog,
    pub pbs_level: DecompositionLevelCount,
    pub ks_base_log: DecompositionBaseLog,
    pub ks_level: DecompositionLevelCount,
    pub grouping_factor: LweBskGroupingFactor,
    pub message_modulus_log: MessageModulusLog,
    pub ciphertext_modulus: CiphertextModulus,
}

// DISCLAIMER: all parameters here are not guaranteed to be secure or yield correct computations
// outside of these tests, the dimensions are kept small so that blind rotations stay fast
pub const TEST_PARAMS_2_BITS_N256: TestParams = TestParams {
    lwe_dimension: LweDimension(24),
    glwe_dimension: GlweDimension(1),
    polynomial_size: PolynomialSize(256),
    lwe_modular_std_dev: StandardDev(9.094947017729282e-13),
    glwe_modular_std_dev: StandardDev(8.881784197001252e-16),
    pbs_base_log: DecompositionBaseLog(15),
    pbs_level: DecompositionLevelCount(2),
    ks_base_log: DecompositionBaseLog(4),
    ks_level: DecompositionLevelCount(6),
    grouping_factor: LweBskGroupingFactor(2),
    message_modulus_log: MessageModulusLog(2),
    ciphertext_modulus: CiphertextModulus::new_native(),
};

pub const TEST_PARAMS_2_BITS_N1024: TestParams = TestParams {
    lwe_dimension: LweDimension(24),
    glwe_dimension: GlweDimension(1),
    polynomial_size: PolynomialSize(1024),
    lwe_modular_std_dev: StandardDev(9.094947017729282e-13),
    glwe_modular_std_dev: StandardDev(8.881784197001252e-16),
    pbs_base_log: DecompositionBaseLog(15),
    pbs_level: DecompositionLevelCount(2),
    ks_base_log: DecompositionBaseLog(4),
    ks_level: DecompositionLevelCount(6),
    grouping_factor: LweBskGroupingFactor(3),
    message_modulus_log: MessageModulusLog(2),
    ciphertext_modulus: CiphertextModulus::new_native(),
};

impl TestParams {
    pub fn message_modulus(&self) -> u64 {
        1 << self.message_modulus_log.0
    }

    pub fn delta(&self) -> u64 {
        get_encoding_with_padding(self.ciphertext_modulus) / self.message_modulus()
    }
}

/// Every key a bootstrap followed by a key switch back to the input key needs.
pub struct TestKeys {
    pub input_lwe_secret_key: LweSecretKeyOwned,
    pub output_glwe_secret_key: GlweSecretKeyOwned,
    pub bsk: LweBootstrapKeyOwned,
    pub multi_bit_bsk: LweMultiBitBootstrapKeyOwned,
    pub ksk: LweKeyswitchKeyOwned,
}

impl TestKeys {
    pub fn generate(params: &TestParams, rsc: &mut TestResources) -> Self {
        let input_lwe_secret_key = allocate_and_generate_new_binary_lwe_secret_key(
            params.lwe_dimension,
            &mut rsc.secret_random_generator,
        );
        let output_glwe_secret_key = allocate_and_generate_new_binary_glwe_secret_key(
            params.glwe_dimension,
            params.polynomial_size,
            &mut rsc.secret_random_generator,
        );

        let bsk = par_allocate_and_generate_new_lwe_bootstrap_key(
            &input_lwe_secret_key,
            &output_glwe_secret_key,
            params.pbs_base_log,
            params.pbs_level,
            params.glwe_modular_std_dev,
            params.ciphertext_modulus,
            &mut rsc.encryption_random_generator,
        );

        let multi_bit_bsk = par_allocate_and_generate_new_lwe_multi_bit_bootstrap_key(
            &input_lwe_secret_key,
            &output_glwe_secret_key,
            params.pbs_base_log,
            params.pbs_level,
            params.grouping_factor,
            params.glwe_modular_std_dev,
            params.ciphertext_modulus,
            &mut rsc.encryption_random_generator,
        );

        let ksk = allocate_and_generate_new_lwe_keyswitch_key(
            &output_glwe_secret_key.as_lwe_secret_key(),
            &input_lwe_secret_key,
            params.ks_base_log,
            params.ks_level,
            params.lwe_modular_std_dev,
            params.ciphertext_modulus,
            &mut rsc.encryption_random_generator,
        );

        Self {
            input_lwe_secret_key,
            output_glwe_secret_key,
            bsk,
            multi_bit_bsk,
            ksk,
        }
    }

    pub fn output_lwe_secret_key(&self) -> LweSecretKeyView<'_> {
        self.output_glwe_secret_key.as_lwe_secret_key()
    }
}

pub fn get_encoding_with_padding(ciphertext_modulus: CiphertextModulus) -> u64 {
    if ciphertext_modulus.is_native_modulus() {
        1 << (u64::BITS - 1)
    } else {
        (ciphertext_modulus.get_custom_modulus() / 2) as u64
    }
}

pub fn round_decode(decrypted: u64, delta: u64) -> u64 {
    // Get half interval on the discretized torus
    let rounding_margin = delta.wrapping_div(2);

    // Add the half interval mapping
    // [delta * (m - 1/2); delta * (m + 1/2)[ to [delta * m; delta * (m + 1)[
    // Dividing by delta gives m which is what we want
    (decrypted.wrapping_add(rounding_margin)).wrapping_div(delta)
}

/// The look-up table most tests evaluate, `2x - 1 mod p`.
pub fn test_lut_function(message_modulus: u64) -> impl Fn(u64) -> u64 {
    move |x: u64| x.wrapping_mul(2).wrapping_sub(1).wrapping_rem(message_modulus)
}

macro_rules! create_parametrized_test{
    ($name:ident { $($param:ident),* }) => {
        paste! {
            $(
            #[test]
            fn [<test_ $name _ $param:lower>]() {
                $name($param)
            }
            )*
        }
    };
     ($name:ident)=> {
        create_parametrized_test!($name
        {
            TEST_PARAMS_2_BITS_N256,
            TEST_PARAMS_2_BITS_N1024
        });
    };
}

use create_parametrized_test;
