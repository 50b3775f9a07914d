//! Signed gadget decomposition of 64 bits torus elements.
//!
//! An element $x$ is first rounded to the closest multiple of $q / B^l$, then written as
//! $\sum\_{j=1}^{l} d\_j \cdot q / B^j$ with balanced digits $-B/2 \leq d\_j \leq B/2$. The
//! decomposition yields the digits from level $l$ (least significant) down to level 1.

pub use decomposer::*;
pub use iter::*;
pub use term::*;

mod decomposer;
mod iter;
mod term;

#[cfg(test)]
mod tests;

/// The level of a given term of a decomposition.
///
/// When decomposing an integer over the $l$ largest powers of the basis, this type represent the
/// level (in $[1,l]$) currently manipulated.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct DecompositionLevel(pub usize);

// Shifts by the full word width are valid for a decomposition covering all 64 bits.
#[inline]
pub(crate) fn shl(value: u64, shift: usize) -> u64 {
    value.checked_shl(shift as u32).unwrap_or(0)
}

#[inline]
pub(crate) fn shr(value: u64, shift: usize) -> u64 {
    value.checked_shr(shift as u32).unwrap_or(0)
}
