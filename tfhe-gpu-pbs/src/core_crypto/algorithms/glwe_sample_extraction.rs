//! Module containing primitives pertaining to the operation usually referred to as a
//! _sample extract_ in the literature. Allowing to extract a single
//! [`LWE Ciphertext`](`LweCiphertext`) from a given [`GLWE ciphertext`](`GlweCiphertext`).

use crate::core_crypto::algorithms::slice_algorithms::*;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;

/// Turn one mask polynomial of a GLWE ciphertext into the matching `N` mask coefficients of the
/// LWE ciphertext extracted at coefficient `nth`.
///
/// For `nth = 0` this gives `out[0] = a[0]` and `out[i] = -a[N - i]`.
pub fn extract_lwe_sample_mask_polynomial(
    glwe_mask_poly: &[u64],
    lwe_mask_poly: &mut [u64],
    nth: MonomialDegree,
) {
    assert_eq!(glwe_mask_poly.len(), lwe_mask_poly.len());
    let polynomial_size = glwe_mask_poly.len();
    assert!(
        nth.0 < polynomial_size,
        "Cannot extract coefficient {} of a polynomial of size {polynomial_size}",
        nth.0
    );

    lwe_mask_poly.copy_from_slice(glwe_mask_poly);
    // Number of elements which must be turned into their opposite
    let opposite_count = polynomial_size - nth.0 - 1;
    // The polynomial is in the wrong order
    lwe_mask_poly.reverse();
    slice_wrapping_opposite_assign(&mut lwe_mask_poly[0..opposite_count]);
    lwe_mask_poly.rotate_left(opposite_count);
}

/// Extract the nth coefficient from the body of a [`GLWE Ciphertext`](`GlweCiphertext`) as an
/// [`LWE ciphertext`](`LweCiphertext`).
///
/// The output is encrypted under the [`GLWE secret key`](`GlweSecretKey`) seen as an LWE secret
/// key, see [`GlweSecretKey::as_lwe_secret_key`].
///
/// # Panics
///
/// Panics if the output LWE dimension is not `k * N`.
pub fn extract_lwe_sample_from_glwe_ciphertext<InputCont, OutputCont>(
    input_glwe: &GlweCiphertext<InputCont>,
    output_lwe: &mut LweCiphertext<OutputCont>,
    nth: MonomialDegree,
) where
    InputCont: Container,
    OutputCont: ContainerMut,
{
    let polynomial_size = input_glwe.polynomial_size();
    let equivalent_lwe_dimension = input_glwe
        .glwe_size()
        .to_glwe_dimension()
        .to_equivalent_lwe_dimension(polynomial_size);
    assert!(
        equivalent_lwe_dimension == output_lwe.lwe_size().to_lwe_dimension(),
        "Mismatch between equivalent LweDimension of input ciphertext and output ciphertext. \
        Got {:?} for input and {:?} for output.",
        equivalent_lwe_dimension,
        output_lwe.lwe_size().to_lwe_dimension(),
    );

    let (lwe_mask, lwe_body) = output_lwe.get_mut_mask_and_body();
    *lwe_body = input_glwe.get_body()[nth.0];

    for (glwe_mask_poly, lwe_mask_poly) in input_glwe
        .get_mask()
        .chunks_exact(polynomial_size.0)
        .zip(lwe_mask.chunks_exact_mut(polynomial_size.0))
    {
        extract_lwe_sample_mask_polynomial(glwe_mask_poly, lwe_mask_poly, nth);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core_crypto::algorithms::polynomial_algorithms::*;
    use crate::core_crypto::algorithms::slice_algorithms::slice_wrapping_dot_product;
    use rand::Rng;

    #[test]
    fn extraction_at_zero() {
        let glwe = vec![1u64, 2, 3, 4, 10, 20, 30, 40, 7, 8, 9, 11];
        let glwe = GlweCiphertext::from_container(
            glwe,
            PolynomialSize(4),
            CiphertextModulus::new_native(),
        );
        let mut lwe = LweCiphertext::new(0, LweSize(9), CiphertextModulus::new_native());
        extract_lwe_sample_from_glwe_ciphertext(&glwe, &mut lwe, MonomialDegree(0));
        let neg = |x: u64| x.wrapping_neg();
        assert_eq!(
            lwe.as_ref(),
            &[1, neg(4), neg(3), neg(2), 10, neg(40), neg(30), neg(20), 7]
        );
    }

    #[test]
    fn extracted_phase_is_the_glwe_phase_coefficient() {
        // Phase of the extracted sample under the flattened key equals the nth coefficient of the
        // GLWE phase, for any nth.
        let mut rng = rand::thread_rng();
        let polynomial_size = PolynomialSize(16);
        let glwe_dimension = GlweDimension(2);
        let key: Vec<u64> = (0..glwe_dimension.0 * polynomial_size.0)
            .map(|_| rng.gen::<u64>() & 1)
            .collect();
        let glwe_data: Vec<u64> = (0..glwe_dimension.to_glwe_size().0 * polynomial_size.0)
            .map(|_| rng.gen())
            .collect();
        let glwe = GlweCiphertext::from_container(
            glwe_data,
            polynomial_size,
            CiphertextModulus::new_native(),
        );

        let mut phase = glwe.get_body().to_vec();
        for r in 0..glwe_dimension.0 {
            polynomial_wrapping_sub_mul_assign(
                &mut phase,
                glwe.get_polynomial(r),
                &key[r * polynomial_size.0..(r + 1) * polynomial_size.0],
            );
        }

        for nth in 0..polynomial_size.0 {
            let mut lwe = LweCiphertext::new(
                0,
                glwe_dimension
                    .to_equivalent_lwe_dimension(polynomial_size)
                    .to_lwe_size(),
                CiphertextModulus::new_native(),
            );
            extract_lwe_sample_from_glwe_ciphertext(&glwe, &mut lwe, MonomialDegree(nth));
            let lwe_phase = lwe
                .get_body()
                .wrapping_sub(slice_wrapping_dot_product(lwe.get_mask(), &key));
            assert_eq!(lwe_phase, phase[nth]);
        }
    }
}
