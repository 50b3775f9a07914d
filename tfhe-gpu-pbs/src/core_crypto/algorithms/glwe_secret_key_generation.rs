//! Module containing primitives pertaining to the generation of
//! [`GLWE secret keys`](`GlweSecretKey`).

use crate::core_crypto::commons::generators::SecretRandomGenerator;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Allocate a new [`GLWE secret key`](`GlweSecretKey`) and fill it with uniformly random binary
/// coefficients.
pub fn allocate_and_generate_new_binary_glwe_secret_key(
    glwe_dimension: GlweDimension,
    polynomial_size: PolynomialSize,
    generator: &mut SecretRandomGenerator,
) -> GlweSecretKeyOwned {
    let mut glwe_secret_key = GlweSecretKey::new_empty_key(0, glwe_dimension, polynomial_size);

    generate_binary_glwe_secret_key(&mut glwe_secret_key, generator);

    glwe_secret_key
}

/// Fill a [`GLWE secret key`](`GlweSecretKey`) with uniformly random binary coefficients.
pub fn generate_binary_glwe_secret_key<KeyCont>(
    glwe_secret_key: &mut GlweSecretKey<KeyCont>,
    generator: &mut SecretRandomGenerator,
) where
    KeyCont: ContainerMut,
{
    generator.fill_slice_with_random_uniform_binary(glwe_secret_key.as_mut())
}
