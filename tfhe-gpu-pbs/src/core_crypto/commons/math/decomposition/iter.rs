use super::{shl, shr, DecompositionLevel, DecompositionTerm};
use crate::core_crypto::commons::parameters::{DecompositionBaseLog, DecompositionLevelCount};

/// An iterator that yields the terms of the signed decomposition of an integer.
///
/// # Warning
///
/// This iterator yields the decomposition in reverse order. That means that the highest level
/// will be yielded first.
#[derive(Clone, Debug)]
pub struct SignedDecompositionIter {
    // The base log of the decomposition
    base_log: usize,
    // The number of levels of the decomposition
    level_count: usize,
    // The internal state of the decomposition
    state: u64,
    // The current level
    current_level: usize,
    // Mask computing the value mod B, for B=2^4: ...0001111
    mod_b_mask: u64,
    // Whether the iterator is a fresh one (for the recompose method)
    fresh: bool,
}

impl SignedDecompositionIter {
    pub(crate) fn new(
        input: u64,
        base_log: DecompositionBaseLog,
        level: DecompositionLevelCount,
    ) -> Self {
        Self {
            base_log: base_log.0,
            level_count: level.0,
            state: shr(input, u64::BITS as usize - base_log.0 * level.0),
            current_level: level.0,
            mod_b_mask: u64::MAX >> (u64::BITS as usize - base_log.0),
            fresh: true,
        }
    }

    pub(crate) fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn base_log(&self) -> DecompositionBaseLog {
        DecompositionBaseLog(self.base_log)
    }

    pub fn level_count(&self) -> DecompositionLevelCount {
        DecompositionLevelCount(self.level_count)
    }
}

impl Iterator for SignedDecompositionIter {
    type Item = DecompositionTerm;

    fn next(&mut self) -> Option<Self::Item> {
        self.fresh = false;
        if self.current_level == 0 {
            return None;
        }
        let output = decompose_one_level(self.base_log, &mut self.state, self.mod_b_mask);
        self.current_level -= 1;
        Some(DecompositionTerm::new(
            DecompositionLevel(self.current_level + 1),
            DecompositionBaseLog(self.base_log),
            output,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.current_level, Some(self.current_level))
    }
}

impl ExactSizeIterator for SignedDecompositionIter {}

#[inline]
fn decompose_one_level(base_log: usize, state: &mut u64, mod_b_mask: u64) -> u64 {
    let res = *state & mod_b_mask;
    *state = shr(*state, base_log);
    // Balance the digit: values above B/2, or equal to B/2 with an odd remaining state, carry
    let mut carry = (res.wrapping_sub(1) | *state) & res;
    carry >>= base_log - 1;
    *state = state.wrapping_add(carry);
    res.wrapping_sub(shl(carry, base_log))
}
