//! Mathematical primitives.

pub mod decomposition;
