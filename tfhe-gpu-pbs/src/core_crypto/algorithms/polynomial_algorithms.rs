//! Module providing algorithms to perform computations on polynomials modulo $X^{N} + 1$.
//!
//! Polynomials are slices of coefficients, lowest degree first. All computations wrap around
//! (similar to computing modulo $2^{64}$) when exceeding the unsigned integer capacity, which
//! makes the products exact: any evaluation order gives the same bits.

use crate::core_crypto::algorithms::slice_algorithms::*;
use crate::core_crypto::commons::parameters::MonomialDegree;

/// Below this size the schoolbook product beats the recursion overhead.
const KARATSUBA_STOP: usize = 64;

/// Add a polynomial to the output polynomial.
pub fn polynomial_wrapping_add_assign(lhs: &mut [u64], rhs: &[u64]) {
    assert_eq!(lhs.len(), rhs.len());
    slice_wrapping_add_assign(lhs, rhs)
}

/// Subtract a polynomial to the output polynomial.
pub fn polynomial_wrapping_sub_assign(lhs: &mut [u64], rhs: &[u64]) {
    assert_eq!(lhs.len(), rhs.len());
    slice_wrapping_sub_assign(lhs, rhs)
}

// Plain product of two polynomials of the same size n into a buffer of size 2n.
fn schoolbook_wrapping_mul(out: &mut [u64], lhs: &[u64], rhs: &[u64]) {
    out.fill(0);
    for (lhs_degree, &lhs_coeff) in lhs.iter().enumerate() {
        for (out_coeff, &rhs_coeff) in out[lhs_degree..].iter_mut().zip(rhs.iter()) {
            *out_coeff = out_coeff.wrapping_add(lhs_coeff.wrapping_mul(rhs_coeff));
        }
    }
}

// Plain product of two polynomials of the same size n into a buffer of size 2n, splitting the
// operands in halves recursively.
fn karatsuba_wrapping_mul(out: &mut [u64], lhs: &[u64], rhs: &[u64]) {
    let n = lhs.len();
    debug_assert_eq!(rhs.len(), n);
    debug_assert_eq!(out.len(), 2 * n);

    if n <= KARATSUBA_STOP || n % 2 != 0 {
        schoolbook_wrapping_mul(out, lhs, rhs);
        return;
    }

    let half = n / 2;
    let (lhs_lo, lhs_hi) = lhs.split_at(half);
    let (rhs_lo, rhs_hi) = rhs.split_at(half);

    let (low, high) = out.split_at_mut(n);
    karatsuba_wrapping_mul(low, lhs_lo, rhs_lo);
    karatsuba_wrapping_mul(high, lhs_hi, rhs_hi);

    let mut lhs_sum = lhs_lo.to_vec();
    slice_wrapping_add_assign(&mut lhs_sum, lhs_hi);
    let mut rhs_sum = rhs_lo.to_vec();
    slice_wrapping_add_assign(&mut rhs_sum, rhs_hi);

    // (lo + hi)(lo' + hi') - lo lo' - hi hi'
    let mut middle = vec![0u64; n];
    karatsuba_wrapping_mul(&mut middle, &lhs_sum, &rhs_sum);
    slice_wrapping_sub_assign(&mut middle, low);
    slice_wrapping_sub_assign(&mut middle, high);

    slice_wrapping_add_assign(&mut out[half..half + n], &middle);
}

/// Compute the product of two polynomials reduced modulo $(X^{N}+1)$ and write it to `output`.
///
/// # Example
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::polynomial_algorithms::*;
/// let lhs = vec![1u64, 2, 3];
/// let rhs = vec![0u64, 1, 1];
/// let mut res = vec![0u64; 3];
/// polynomial_wrapping_mul(&mut res, &lhs, &rhs);
/// // (1 + 2X + 3X^2)(X + X^2) = X + 3X^2 + 5X^3 + 3X^4 = -5 - 2X + 3X^2
/// assert_eq!(res, vec![5u64.wrapping_neg(), 2u64.wrapping_neg(), 3]);
/// ```
pub fn polynomial_wrapping_mul(output: &mut [u64], lhs: &[u64], rhs: &[u64]) {
    assert!(
        output.len() == lhs.len() && output.len() == rhs.len(),
        "Mismatched polynomial sizes, output: {}, lhs: {}, rhs: {}.",
        output.len(),
        lhs.len(),
        rhs.len()
    );
    let n = output.len();
    let mut full = vec![0u64; 2 * n];
    karatsuba_wrapping_mul(&mut full, lhs, rhs);
    let (low, high) = full.split_at(n);
    // X^N = -1
    for (out, (&lo, &hi)) in output.iter_mut().zip(low.iter().zip(high.iter())) {
        *out = lo.wrapping_sub(hi);
    }
}

/// Add the result of the product between two polynomials, reduced modulo $(X^{N}+1)$, to the
/// output polynomial.
///
/// # Example
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::polynomial_algorithms::*;
/// let poly_1 = vec![1u64, 2, 3];
/// let poly_2 = vec![0u64, 1, 1];
/// let mut res = vec![1u64, 0, 3u64.wrapping_neg()];
/// polynomial_wrapping_add_mul_assign(&mut res, &poly_1, &poly_2);
/// assert_eq!(res, vec![4u64.wrapping_neg(), 2u64.wrapping_neg(), 0]);
/// ```
pub fn polynomial_wrapping_add_mul_assign(output: &mut [u64], lhs: &[u64], rhs: &[u64]) {
    let mut product = vec![0u64; output.len()];
    polynomial_wrapping_mul(&mut product, lhs, rhs);
    slice_wrapping_add_assign(output, &product);
}

/// Subtract the result of the product between two polynomials, reduced modulo $(X^{N}+1)$, to
/// the output polynomial.
pub fn polynomial_wrapping_sub_mul_assign(output: &mut [u64], lhs: &[u64], rhs: &[u64]) {
    let mut product = vec![0u64; output.len()];
    polynomial_wrapping_mul(&mut product, lhs, rhs);
    slice_wrapping_sub_assign(output, &product);
}

/// Divide (mod $(X^{N}+1)$), the output polynomial with a monic monomial of a given degree i.e.
/// $X^{degree}$.
///
/// # Examples
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::polynomial_algorithms::*;
/// use tfhe_gpu_pbs::core_crypto::commons::parameters::*;
/// let mut poly = vec![1u64, 2, 3];
/// polynomial_wrapping_monic_monomial_div_assign(&mut poly, MonomialDegree(2));
/// assert_eq!(poly, vec![3, 1u64.wrapping_neg(), 2u64.wrapping_neg()]);
/// ```
pub fn polynomial_wrapping_monic_monomial_div_assign(
    output: &mut [u64],
    monomial_degree: MonomialDegree,
) {
    let full_cycles_count = monomial_degree.0 / output.len();
    if full_cycles_count % 2 != 0 {
        slice_wrapping_opposite_assign(output);
    }
    let remaining_degree = monomial_degree.0 % output.len();
    output.rotate_left(remaining_degree);
    output
        .iter_mut()
        .rev()
        .take(remaining_degree)
        .for_each(|a| *a = a.wrapping_neg());
}

/// Multiply (mod $(X^{N}+1)$), the output polynomial with a monic monomial of a given degree i.e.
/// $X^{degree}$.
///
/// # Examples
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::polynomial_algorithms::*;
/// use tfhe_gpu_pbs::core_crypto::commons::parameters::*;
/// let mut poly = vec![1u64, 2, 3];
/// polynomial_wrapping_monic_monomial_mul_assign(&mut poly, MonomialDegree(2));
/// assert_eq!(poly, vec![2u64.wrapping_neg(), 3u64.wrapping_neg(), 1]);
/// ```
pub fn polynomial_wrapping_monic_monomial_mul_assign(
    output: &mut [u64],
    monomial_degree: MonomialDegree,
) {
    let full_cycles_count = monomial_degree.0 / output.len();
    if full_cycles_count % 2 != 0 {
        slice_wrapping_opposite_assign(output);
    }
    let remaining_degree = monomial_degree.0 % output.len();
    output.rotate_right(remaining_degree);
    output
        .iter_mut()
        .take(remaining_degree)
        .for_each(|a| *a = a.wrapping_neg());
}

/// Coefficient `index` of `input` multiplied by $X^{degree}$ mod $(X^{N}+1)$, with the degree
/// taken modulo $2N$.
///
/// This lets a caller compute a single coefficient of a rotated polynomial without rotating it.
#[inline]
pub fn monic_monomial_mul_coefficient(input: &[u64], monomial_degree: usize, index: usize) -> u64 {
    let n = input.len();
    let degree = monomial_degree % (2 * n);
    // Source coefficient j lands at j + degree, negated every time it wraps past N
    let source = (index + 2 * n - degree) % (2 * n);
    if source < n {
        input[source]
    } else {
        input[source - n].wrapping_neg()
    }
}

/// Write $X^{degree} \cdot input - input$ mod $(X^{N}+1)$ to `output`.
pub fn polynomial_wrapping_monic_monomial_mul_and_subtract(
    output: &mut [u64],
    input: &[u64],
    monomial_degree: MonomialDegree,
) {
    assert_eq!(output.len(), input.len());
    for (index, out) in output.iter_mut().enumerate() {
        *out = monic_monomial_mul_coefficient(input, monomial_degree.0, index)
            .wrapping_sub(input[index]);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    fn random_polynomial(rng: &mut impl Rng, size: usize) -> Vec<u64> {
        (0..size).map(|_| rng.gen()).collect()
    }

    fn negacyclic_schoolbook(lhs: &[u64], rhs: &[u64]) -> Vec<u64> {
        let n = lhs.len();
        let mut out = vec![0u64; n];
        for (i, &l) in lhs.iter().enumerate() {
            for (j, &r) in rhs.iter().enumerate() {
                let prod = l.wrapping_mul(r);
                if i + j < n {
                    out[i + j] = out[i + j].wrapping_add(prod);
                } else {
                    out[i + j - n] = out[i + j - n].wrapping_sub(prod);
                }
            }
        }
        out
    }

    #[test]
    fn test_multiply_divide_unit_monomial() {
        //! tests if multiply_by_monomial and divide_by_monomial cancel each other
        let mut rng = rand::thread_rng();
        for log_size in 1..12 {
            let polynomial_size = 1usize << log_size;
            let mut poly = random_polynomial(&mut rng, polynomial_size);
            let ground_truth = poly.clone();

            let r = rng.gen_range(0..polynomial_size);
            polynomial_wrapping_monic_monomial_mul_assign(&mut poly, MonomialDegree(r));
            polynomial_wrapping_monic_monomial_div_assign(&mut poly, MonomialDegree(r));
            assert_eq!(&poly, &ground_truth);

            let r_big = rng.gen_range(0..polynomial_size) + 2048;
            polynomial_wrapping_monic_monomial_mul_assign(&mut poly, MonomialDegree(r_big));
            polynomial_wrapping_monic_monomial_div_assign(&mut poly, MonomialDegree(r_big));
            assert_eq!(&poly, &ground_truth);
        }
    }

    #[test]
    fn test_karatsuba_matches_schoolbook() {
        let mut rng = rand::thread_rng();
        for polynomial_size in [1, 2, 64, 128, 256, 1024] {
            let lhs = random_polynomial(&mut rng, polynomial_size);
            let rhs = random_polynomial(&mut rng, polynomial_size);
            let mut res = vec![0u64; polynomial_size];
            polynomial_wrapping_mul(&mut res, &lhs, &rhs);
            assert_eq!(res, negacyclic_schoolbook(&lhs, &rhs));
        }
    }

    #[test]
    fn test_single_coefficient_rotation() {
        let mut rng = rand::thread_rng();
        let polynomial_size = 256;
        let poly = random_polynomial(&mut rng, polynomial_size);
        for degree in [0, 1, 17, 255, 256, 300, 511] {
            let mut rotated = poly.clone();
            polynomial_wrapping_monic_monomial_mul_assign(&mut rotated, MonomialDegree(degree));
            for (index, &coeff) in rotated.iter().enumerate() {
                assert_eq!(monic_monomial_mul_coefficient(&poly, degree, index), coeff);
            }
        }
    }
}
