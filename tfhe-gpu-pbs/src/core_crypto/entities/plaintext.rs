//! Module containing the definition of the Plaintext.

/// A plaintext (encoded) value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Plaintext(pub u64);
