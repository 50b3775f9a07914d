//! Device side entities.
//!
//! Each entity owns a [`GpuVec`](tfhe_gpu_sim::GpuVec) holding the same words as its host
//! counterpart, in the same layout, plus the parameters needed to interpret them.

pub mod glwe_ciphertext_list;
pub mod lwe_bootstrap_key;
pub mod lwe_ciphertext_list;
pub mod lwe_keyswitch_key;
pub mod lwe_multi_bit_bootstrap_key;

pub use glwe_ciphertext_list::*;
pub use lwe_bootstrap_key::*;
pub use lwe_ciphertext_list::*;
pub use lwe_keyswitch_key::*;
pub use lwe_multi_bit_bootstrap_key::*;
