//! Module containing primitives pertaining to the generation of
//! [`LWE secret keys`](`LweSecretKey`).

use crate::core_crypto::commons::generators::SecretRandomGenerator;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Allocate a new [`LWE secret key`](`LweSecretKey`) and fill it with uniformly random binary
/// coefficients.
pub fn allocate_and_generate_new_binary_lwe_secret_key(
    lwe_dimension: LweDimension,
    generator: &mut SecretRandomGenerator,
) -> LweSecretKeyOwned {
    let mut lwe_secret_key = LweSecretKey::new_empty_key(0, lwe_dimension);

    generate_binary_lwe_secret_key(&mut lwe_secret_key, generator);

    lwe_secret_key
}

/// Fill an [`LWE secret key`](`LweSecretKey`) with uniformly random binary coefficients.
pub fn generate_binary_lwe_secret_key<KeyCont>(
    lwe_secret_key: &mut LweSecretKey<KeyCont>,
    generator: &mut SecretRandomGenerator,
) where
    KeyCont: ContainerMut,
{
    generator.fill_slice_with_random_uniform_binary(lwe_secret_key.as_mut())
}
