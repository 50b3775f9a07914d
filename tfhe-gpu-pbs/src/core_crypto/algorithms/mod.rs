//! Host side algorithms: key generation, encryption and the software reference path of the
//! programmable bootstrap.
//!
//! The GPU engine in [`crate::core_crypto::gpu`] reuses the arithmetic of these modules inside
//! its kernels, which is what makes its output bit-identical to the reference.

pub mod ggsw_encryption;
pub mod glwe_encryption;
pub mod glwe_sample_extraction;
pub mod glwe_secret_key_generation;
pub mod lwe_bootstrap_key_generation;
pub mod lwe_encryption;
pub mod lwe_keyswitch;
pub mod lwe_keyswitch_key_generation;
pub mod lwe_multi_bit_bootstrap_key_generation;
pub mod lwe_multi_bit_programmable_bootstrapping;
pub mod lwe_programmable_bootstrapping;
pub mod lwe_secret_key_generation;
pub mod polynomial_algorithms;
pub mod slice_algorithms;

#[cfg(test)]
pub(crate) mod test;

// No pub use for slice and polynomial algorithms which would not interest higher level users
// They can still be used via `use crate::core_crypto::algorithms::slice_algorithms::*;`
pub use ggsw_encryption::*;
pub use glwe_encryption::*;
pub use glwe_sample_extraction::*;
pub use glwe_secret_key_generation::*;
pub use lwe_bootstrap_key_generation::*;
pub use lwe_encryption::*;
pub use lwe_keyswitch::*;
pub use lwe_keyswitch_key_generation::*;
pub use lwe_multi_bit_bootstrap_key_generation::*;
pub use lwe_multi_bit_programmable_bootstrapping::*;
pub use lwe_programmable_bootstrapping::*;
pub use lwe_secret_key_generation::*;
