//! Module providing algorithms to perform computations on raw slices.

use itertools::izip;

/// Compute a dot product between two slices containing unsigned integers.
///
/// # Note
///
/// Computations wrap around (similar to computing modulo $2^{64}$) when exceeding the unsigned
/// integer capacity.
///
/// # Example
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::slice_algorithms::*;
/// let first = vec![1u64, 2, 3, 4, 5, 6];
/// let second = vec![u64::MAX, 1, 2, 3, 4, 5];
/// let dot_product = slice_wrapping_dot_product(&first, &second);
/// assert_eq!(dot_product, 69);
/// ```
pub fn slice_wrapping_dot_product(lhs: &[u64], rhs: &[u64]) -> u64 {
    assert!(
        lhs.len() == rhs.len(),
        "lhs (len: {}) and rhs (len: {}) must have the same length",
        lhs.len(),
        rhs.len()
    );

    lhs.iter()
        .zip(rhs.iter())
        .fold(0u64, |acc, (&left, &right)| {
            acc.wrapping_add(left.wrapping_mul(right))
        })
}

/// Add a slice containing unsigned integers to another one element-wise.
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::slice_algorithms::*;
/// let mut first = vec![1u64, 2, 3, 4, 5, 6];
/// let second = vec![u64::MAX, 255, 255, 1, 2, 3];
/// slice_wrapping_add_assign(&mut first, &second);
/// assert_eq!(&first, &[0u64, 257, 258, 5, 7, 9]);
/// ```
pub fn slice_wrapping_add_assign(lhs: &mut [u64], rhs: &[u64]) {
    assert!(
        lhs.len() == rhs.len(),
        "lhs (len: {}) and rhs (len: {}) must have the same length",
        lhs.len(),
        rhs.len()
    );

    lhs.iter_mut()
        .zip(rhs.iter())
        .for_each(|(lhs, &rhs)| *lhs = (*lhs).wrapping_add(rhs));
}

/// Subtract a slice containing unsigned integers to another one element-wise.
pub fn slice_wrapping_sub_assign(lhs: &mut [u64], rhs: &[u64]) {
    assert!(
        lhs.len() == rhs.len(),
        "lhs (len: {}) and rhs (len: {}) must have the same length",
        lhs.len(),
        rhs.len()
    );

    lhs.iter_mut()
        .zip(rhs.iter())
        .for_each(|(lhs, &rhs)| *lhs = (*lhs).wrapping_sub(rhs));
}

/// Add a slice multiplied by a scalar to another one, element-wise.
pub fn slice_wrapping_add_scalar_mul_assign(lhs: &mut [u64], rhs: &[u64], scalar: u64) {
    assert!(
        lhs.len() == rhs.len(),
        "lhs (len: {}) and rhs (len: {}) must have the same length",
        lhs.len(),
        rhs.len()
    );
    for (lhs, &rhs) in izip!(lhs.iter_mut(), rhs.iter()) {
        *lhs = (*lhs).wrapping_add(rhs.wrapping_mul(scalar));
    }
}

/// Subtract a slice multiplied by a scalar to another one, element-wise.
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::slice_algorithms::*;
/// let mut first = vec![1u64, 2, 3, 4, 5, 6];
/// let second = vec![1u64, 1, 1, 1, 1, 1];
/// slice_wrapping_sub_scalar_mul_assign(&mut first, &second, 2);
/// assert_eq!(&first, &[u64::MAX, 0, 1, 2, 3, 4]);
/// ```
pub fn slice_wrapping_sub_scalar_mul_assign(lhs: &mut [u64], rhs: &[u64], scalar: u64) {
    assert!(
        lhs.len() == rhs.len(),
        "lhs (len: {}) and rhs (len: {}) must have the same length",
        lhs.len(),
        rhs.len()
    );
    for (lhs, &rhs) in izip!(lhs.iter_mut(), rhs.iter()) {
        *lhs = (*lhs).wrapping_sub(rhs.wrapping_mul(scalar));
    }
}

/// Compute the opposite of a slice containing unsigned integers, element-wise and in place.
pub fn slice_wrapping_opposite_assign(slice: &mut [u64]) {
    slice.iter_mut().for_each(|elt| *elt = (*elt).wrapping_neg());
}

/// Multiply a slice by a scalar, element-wise and in place.
pub fn slice_wrapping_scalar_mul_assign(lhs: &mut [u64], rhs: u64) {
    lhs.iter_mut().for_each(|lhs| *lhs = (*lhs).wrapping_mul(rhs));
}
