use super::{shl, shr, SignedDecompositionIter};
use crate::core_crypto::commons::parameters::{DecompositionBaseLog, DecompositionLevelCount};

/// A structure which allows to decompose unsigned integers into a set of smaller terms.
///
/// See the [module level](super) documentation for a description of the signed decomposition.
#[derive(Debug, Clone, Copy)]
pub struct SignedDecomposer {
    pub(crate) base_log: usize,
    pub(crate) level_count: usize,
}

impl SignedDecomposer {
    /// Create a new decomposer.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tfhe_gpu_pbs::core_crypto::commons::math::decomposition::SignedDecomposer;
    /// use tfhe_gpu_pbs::core_crypto::commons::parameters::{
    ///     DecompositionBaseLog, DecompositionLevelCount,
    /// };
    /// let decomposer = SignedDecomposer::new(DecompositionBaseLog(4), DecompositionLevelCount(3));
    /// assert_eq!(decomposer.level_count(), DecompositionLevelCount(3));
    /// assert_eq!(decomposer.base_log(), DecompositionBaseLog(4));
    /// ```
    pub fn new(base_log: DecompositionBaseLog, level_count: DecompositionLevelCount) -> Self {
        debug_assert!(
            u64::BITS as usize >= base_log.0 * level_count.0,
            "Decomposed bits exceeds the size of the integer to be decomposed"
        );
        Self {
            base_log: base_log.0,
            level_count: level_count.0,
        }
    }

    pub fn base_log(&self) -> DecompositionBaseLog {
        DecompositionBaseLog(self.base_log)
    }

    pub fn level_count(&self) -> DecompositionLevelCount {
        DecompositionLevelCount(self.level_count)
    }

    /// Return the closest value representable by the decomposition.
    ///
    /// ```rust
    /// use tfhe_gpu_pbs::core_crypto::commons::math::decomposition::SignedDecomposer;
    /// use tfhe_gpu_pbs::core_crypto::commons::parameters::{
    ///     DecompositionBaseLog, DecompositionLevelCount,
    /// };
    /// let decomposer = SignedDecomposer::new(DecompositionBaseLog(4), DecompositionLevelCount(3));
    /// let closest = decomposer.closest_representable(0x0000_0000_0000_0001_u64 << 51);
    /// assert_eq!(closest, 0x0000_0000_0000_0001_u64 << 52);
    /// ```
    #[inline]
    pub fn closest_representable(&self, input: u64) -> u64 {
        // Number of least significant bits which can not be represented by the decomposition
        let non_rep_bit_count = u64::BITS as usize - self.level_count * self.base_log;
        if non_rep_bit_count == 0 {
            return input;
        }
        // The msb of the non representable bits performs the rounding
        let non_rep_msb = (input >> (non_rep_bit_count - 1)) & 1;
        let res = (input >> non_rep_bit_count).wrapping_add(non_rep_msb);
        shl(res, non_rep_bit_count)
    }

    /// Generate an iterator over the terms of the decomposition of the input, from level
    /// `level_count` down to level 1.
    ///
    /// The input is rounded to the closest representable value first.
    pub fn decompose(&self, input: u64) -> SignedDecompositionIter {
        SignedDecompositionIter::new(
            self.closest_representable(input),
            DecompositionBaseLog(self.base_log),
            DecompositionLevelCount(self.level_count),
        )
    }

    /// Write the digits of the decomposition of `input` in `digits`, indexed by `level - 1`.
    ///
    /// # Panics
    ///
    /// Panics if `digits` is shorter than the level count.
    pub fn decompose_into(&self, input: u64, digits: &mut [u64]) {
        for term in self.decompose(input) {
            digits[term.level().0 - 1] = term.value();
        }
    }

    /// Recompose a fresh decomposition, `None` if some terms were already consumed.
    pub fn recompose(&self, decomp: SignedDecompositionIter) -> Option<u64> {
        if decomp.is_fresh() {
            Some(decomp.fold(0u64, |acc, term| {
                acc.wrapping_add(term.to_recomposition_summand())
            }))
        } else {
            None
        }
    }

    /// The scaling factor $q / B^{level}$ of a decomposition level.
    pub fn level_scaling(&self, level: usize) -> u64 {
        shr(1u64 << 63, self.base_log * level - 1)
    }
}
