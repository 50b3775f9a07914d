//! Module containing primitives pertaining to the classical LWE programmable bootstrap.
//!
//! This is the software reference path: polynomial products are computed exactly with wrapping
//! arithmetic, so any implementation following the same sequence of operations produces the same
//! bits.

use crate::core_crypto::algorithms::glwe_encryption::allocate_and_trivially_encrypt_new_glwe_ciphertext;
use crate::core_crypto::algorithms::glwe_sample_extraction::*;
use crate::core_crypto::algorithms::polynomial_algorithms::*;
use crate::core_crypto::commons::math::decomposition::SignedDecomposer;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;
use rayon::prelude::*;

/// Switch a torus element from $\mathbb{Z}/2^{64}\mathbb{Z}$ to $\mathbb{Z}/2N\mathbb{Z}$ with
/// rounding, the result being the degree of a monomial of the blind rotation.
///
/// # Example
///
/// ```
/// use tfhe_gpu_pbs::core_crypto::algorithms::lwe_programmable_bootstrapping::pbs_modulus_switch;
/// use tfhe_gpu_pbs::core_crypto::commons::parameters::PolynomialSize;
/// let polynomial_size = PolynomialSize(1024);
/// // 2^64 / 2N = 2^53, half of it rounds up
/// assert_eq!(pbs_modulus_switch(1 << 52, polynomial_size), 1);
/// assert_eq!(pbs_modulus_switch((1 << 52) - 1, polynomial_size), 0);
/// assert_eq!(pbs_modulus_switch(u64::MAX, polynomial_size), 0);
/// ```
#[inline]
pub fn pbs_modulus_switch(input: u64, polynomial_size: PolynomialSize) -> usize {
    // Keep one more bit than needed, it is used for the rounding
    let mut output = input >> (u64::BITS as usize - polynomial_size.log2().0 - 2);
    output += 1;
    output >>= 1;
    (output as usize) & (2 * polynomial_size.0 - 1)
}

/// Helper function to generate an accumulator for a PBS
///
/// message_modulus is the number of values that can be encoded (without filling the padding bit)
/// it must be a power of 2
///
/// delta is a constant by which the outputs of the LUT are scaled to be encoded
pub fn generate_programmable_bootstrap_glwe_lut<F>(
    polynomial_size: PolynomialSize,
    glwe_size: GlweSize,
    message_modulus: usize,
    ciphertext_modulus: CiphertextModulus,
    delta: u64,
    f: F,
) -> GlweCiphertextOwned
where
    F: Fn(u64) -> u64,
{
    // N/(p/2) = size of each block, to correct noise from the input we introduce the
    // notion of box, which manages redundancy to yield a denoised value
    // for several noisy values around a true input value.
    let box_size = polynomial_size.0 / message_modulus;

    // Create the accumulator
    let mut accumulator_scalar = vec![0u64; polynomial_size.0];

    // Fill each box with the encoded denoised value
    for i in 0..message_modulus {
        let index = i * box_size;
        accumulator_scalar[index..index + box_size]
            .iter_mut()
            .for_each(|a| *a = f(i as u64).wrapping_mul(delta));
    }

    let half_box_size = box_size / 2;

    // Negate the first half_box_size coefficients to manage negacyclicity and rotate
    for a_i in accumulator_scalar[0..half_box_size].iter_mut() {
        *a_i = (*a_i).wrapping_neg();
    }

    // Rotate the accumulator
    accumulator_scalar.rotate_left(half_box_size);

    allocate_and_trivially_encrypt_new_glwe_ciphertext(
        glwe_size,
        &accumulator_scalar,
        ciphertext_modulus,
    )
}

/// Write the signed decomposition of every coefficient of `polynomial` in `digits`, as
/// `level_count` digit polynomials, level 1 first.
///
/// # Panics
///
/// Panics if `digits` does not hold exactly `level_count` polynomials.
pub fn decompose_polynomial_into(
    decomposer: &SignedDecomposer,
    polynomial: &[u64],
    digits: &mut [u64],
) {
    let polynomial_size = polynomial.len();
    let level_count = decomposer.level_count().0;
    assert_eq!(digits.len(), level_count * polynomial_size);

    let mut coefficient_digits = vec![0u64; level_count];
    for (index, &coefficient) in polynomial.iter().enumerate() {
        decomposer.decompose_into(coefficient, &mut coefficient_digits);
        for (level_index, &digit) in coefficient_digits.iter().enumerate() {
            digits[level_index * polynomial_size + index] = digit;
        }
    }
}

/// Perform the external product of `ggsw` and `glwe`, and adds the result to `out`.
///
/// Every polynomial of `glwe` is decomposed, and the digit polynomial of level $j$ of row $r$ is
/// multiplied with every polynomial of the GGSW row $(j, r)$.
pub fn add_external_product_assign<OutputCont, GgswCont, InputCont>(
    out: &mut GlweCiphertext<OutputCont>,
    ggsw: &GgswCiphertext<GgswCont>,
    glwe: &GlweCiphertext<InputCont>,
) where
    OutputCont: ContainerMut,
    GgswCont: Container,
    InputCont: Container,
{
    // we check that the polynomial sizes match
    debug_assert_eq!(ggsw.polynomial_size(), glwe.polynomial_size());
    debug_assert_eq!(ggsw.polynomial_size(), out.polynomial_size());
    // we check that the glwe sizes match
    debug_assert_eq!(ggsw.glwe_size(), glwe.glwe_size());
    debug_assert_eq!(ggsw.glwe_size(), out.glwe_size());

    let polynomial_size = ggsw.polynomial_size().0;
    let glwe_size = ggsw.glwe_size().0;
    let level_count = ggsw.decomposition_level_count().0;

    let decomposer = SignedDecomposer::new(
        ggsw.decomposition_base_log(),
        ggsw.decomposition_level_count(),
    );

    let mut digits = vec![0u64; level_count * polynomial_size];
    for row in 0..glwe_size {
        decompose_polynomial_into(&decomposer, glwe.get_polynomial(row), &mut digits);

        for (level_index, digit_polynomial) in digits.chunks_exact(polynomial_size).enumerate() {
            let ggsw_row = ggsw.get_row(level_index, row);
            for column in 0..glwe_size {
                polynomial_wrapping_add_mul_assign(
                    out.get_mut_polynomial(column),
                    ggsw_row.get_polynomial(column),
                    digit_polynomial,
                );
            }
        }
    }
}

/// Perform a blind rotation given an input [`LWE ciphertext`](`LweCiphertext`), modifying a
/// look-up table passed as a [`GLWE ciphertext`](`GlweCiphertext`) and an
/// [`LWE bootstrap key`](`LweBootstrapKey`).
///
/// For every mask element with a non zero switched value $\tilde{a}\_i$, the accumulator is
/// updated with a CMux: $ACC \leftarrow ACC + ExtProd(BSK\_i, ACC \cdot X^{\tilde{a}\_i} - ACC)$.
pub fn blind_rotate_assign<InputCont, OutputCont, KeyCont>(
    input: &LweCiphertext<InputCont>,
    lut: &mut GlweCiphertext<OutputCont>,
    bsk: &LweBootstrapKey<KeyCont>,
) where
    InputCont: Container,
    OutputCont: ContainerMut,
    KeyCont: Container,
{
    assert_eq!(
        bsk.input_lwe_dimension(),
        input.lwe_size().to_lwe_dimension(),
        "Mismatched input LweDimension. \
        LweBootstrapKey input LweDimension: {:?}, input LweCiphertext LweDimension {:?}.",
        bsk.input_lwe_dimension(),
        input.lwe_size().to_lwe_dimension(),
    );
    assert_eq!(
        bsk.glwe_size(),
        lut.glwe_size(),
        "Mismatched output LweDimension. \
        LweBootstrapKey input GlweDimension: {:?}, lut GlweDimension {:?}.",
        bsk.glwe_size(),
        lut.glwe_size(),
    );
    assert_eq!(lut.polynomial_size(), bsk.polynomial_size());

    let polynomial_size = lut.polynomial_size();
    let monomial_degree = MonomialDegree(pbs_modulus_switch(input.get_body(), polynomial_size));

    for index in 0..lut.glwe_size().0 {
        polynomial_wrapping_monic_monomial_div_assign(
            lut.get_mut_polynomial(index),
            monomial_degree,
        );
    }

    // We initialize the ct_0 used for the successive cmuxes
    let ct0 = lut;
    let mut ct1 = GlweCiphertextOwned::new(
        0,
        ct0.glwe_size(),
        polynomial_size,
        ct0.ciphertext_modulus(),
    );

    for (index, &lwe_mask_element) in input.get_mask().iter().enumerate() {
        let switched = pbs_modulus_switch(lwe_mask_element, polynomial_size);
        if switched != 0 {
            let monomial_degree = MonomialDegree(switched);

            // We rotate ct_1 and subtract ct_0 (first step of cmux) by performing
            // ct_1 <- (ct_0 * X^a_i) - ct_0
            for poly_index in 0..ct0.glwe_size().0 {
                polynomial_wrapping_monic_monomial_mul_and_subtract(
                    ct1.get_mut_polynomial(poly_index),
                    ct0.get_polynomial(poly_index),
                    monomial_degree,
                );
            }

            // second step of cmux:
            // ct_0 <- ct_0 + ct1s_i
            //       = ct_0 * X^(a_i * s_i)
            add_external_product_assign(ct0, &bsk.get_ggsw(index), &ct1);
        }
    }
}

/// Perform a programmable bootstrap given an input [`LWE ciphertext`](`LweCiphertext`), a
/// look-up table passed as a [`GLWE ciphertext`](`GlweCiphertext`) and an
/// [`LWE bootstrap key`](`LweBootstrapKey`). The result is written in the provided output
/// [`LWE ciphertext`](`LweCiphertext`), encrypted under the GLWE secret key seen as an LWE key.
pub fn programmable_bootstrap_lwe_ciphertext<InputCont, OutputCont, AccCont, KeyCont>(
    input: &LweCiphertext<InputCont>,
    output: &mut LweCiphertext<OutputCont>,
    accumulator: &GlweCiphertext<AccCont>,
    bsk: &LweBootstrapKey<KeyCont>,
) where
    InputCont: Container,
    OutputCont: ContainerMut,
    AccCont: Container,
    KeyCont: Container,
{
    let mut local_accumulator = GlweCiphertext::from_container(
        accumulator.as_ref().to_vec(),
        accumulator.polynomial_size(),
        accumulator.ciphertext_modulus(),
    );

    blind_rotate_assign(input, &mut local_accumulator, bsk);

    extract_lwe_sample_from_glwe_ciphertext(&local_accumulator, output, MonomialDegree(0));
}

/// Bootstrap every ciphertext of a list in parallel, ciphertext `i` using the look-up table
/// `lut_indexes[i]` of `luts`.
pub fn par_programmable_bootstrap_lwe_ciphertext_list<InputCont, OutputCont, LutCont, KeyCont>(
    input: &LweCiphertextList<InputCont>,
    output: &mut LweCiphertextList<OutputCont>,
    luts: &GlweCiphertextList<LutCont>,
    lut_indexes: &[usize],
    bsk: &LweBootstrapKey<KeyCont>,
) where
    InputCont: Container + Sync,
    OutputCont: ContainerMut,
    LutCont: Container + Sync,
    KeyCont: Container + Sync,
{
    assert_eq!(input.lwe_ciphertext_count(), output.lwe_ciphertext_count());
    assert_eq!(input.lwe_ciphertext_count().0, lut_indexes.len());

    output
        .iter_mut()
        .collect::<Vec<_>>()
        .into_par_iter()
        .zip(lut_indexes.par_iter())
        .enumerate()
        .for_each(|(index, (mut output_ct, &lut_index))| {
            programmable_bootstrap_lwe_ciphertext(
                &input.get(index),
                &mut output_ct,
                &luts.get(lut_index),
                bsk,
            );
        });
}
