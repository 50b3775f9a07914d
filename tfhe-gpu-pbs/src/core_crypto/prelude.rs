//! Module with the definition of the prelude.
//!
//! The TFHE-rs preludes include convenient imports.
//! Having `tfhe_gpu_pbs::core_crypto::prelude::*;` should be enough to start using the crate.

pub use super::algorithms::*;
pub use super::commons::dispersion::*;
pub use super::commons::generators::{
    new_seed, EncryptionRandomGenerator, SecretRandomGenerator, Seed,
};
pub use super::commons::math::decomposition::SignedDecomposer;
pub use super::commons::parameters::*;
pub use super::commons::traits::*;
pub use super::entities::*;
pub use super::gpu::entities::*;
pub use super::gpu::pbs::{
    PbsEngine, PbsEngineConfig, PbsIndexes, PbsKeys, PbsSelection, PbsSelectionHint, PbsType,
    PbsVariant,
};
pub use super::gpu::{GpuStreams, GpuTarget};
