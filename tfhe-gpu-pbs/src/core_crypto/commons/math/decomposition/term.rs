use super::{shl, DecompositionLevel};
use crate::core_crypto::commons::parameters::DecompositionBaseLog;

/// A member of the decomposition.
///
/// If we decompose a value $\theta$ as a sum $\sum\_{i=1}^l\tilde{\theta}\_i\frac{q}{B^i}$, this
/// represents a $\tilde{\theta}\_i$, stored as a two's complement `u64`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DecompositionTerm {
    level: usize,
    base_log: usize,
    value: u64,
}

impl DecompositionTerm {
    pub(crate) fn new(level: DecompositionLevel, base_log: DecompositionBaseLog, value: u64) -> Self {
        Self {
            level: level.0,
            base_log: base_log.0,
            value,
        }
    }

    /// Turn this term into a summand: $\tilde{\theta}\_i\frac{q}{B^i}$.
    pub fn to_recomposition_summand(&self) -> u64 {
        let shift = u64::BITS as usize - self.base_log * self.level;
        shl(self.value, shift)
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn level(&self) -> DecompositionLevel {
        DecompositionLevel(self.level)
    }
}
