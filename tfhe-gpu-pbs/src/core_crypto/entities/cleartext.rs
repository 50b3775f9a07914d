//! Module containing the definition of the Cleartext.

/// A cleartext, a value that is neither encoded nor encrypted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cleartext(pub u64);
