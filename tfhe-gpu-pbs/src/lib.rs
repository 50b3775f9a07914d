//! Programmable bootstrapping of TFHE ciphertexts on GPU.
//!
//! The crate is organised like the rest of the TFHE-rs core:
//!
//! - [`core_crypto::commons`] holds parameters new-types, the gadget decomposition, noise
//!   parameters and random generators,
//! - [`core_crypto::entities`] the host side ciphertexts and keys,
//! - [`core_crypto::algorithms`] the host primitives, including a software reference of the
//!   bootstrap used to cross check the device,
//! - [`core_crypto::gpu`] the device entities and the PBS engine: validation, variant
//!   selection, launch planning, the blind rotation / sample extraction / key switch stages and
//!   the orchestrator driving them on device streams.

pub mod core_crypto;
pub mod error;

pub use error::{Error, ErrorKind, Resource};
