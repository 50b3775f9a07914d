//! Module containing primitives pertaining to the multi bit LWE programmable bootstrap.
//!
//! The mask is processed by groups of `grouping_factor` elements. For each group a keybundle GGSW
//! $KB\_t = \sum\_j X^{d\_j} \cdot GGSW\_{t,j}$ is computed from the key and the mask, and the
//! accumulator is replaced by the external product $KB\_t \boxdot ACC$. For a binary key exactly
//! one term of the sum encrypts one, so this rotates the accumulator by
//! $\sum\_{k} \tilde{a}\_k s\_k$ in one step.

use crate::core_crypto::algorithms::glwe_sample_extraction::*;
use crate::core_crypto::algorithms::lwe_programmable_bootstrapping::*;
use crate::core_crypto::algorithms::polynomial_algorithms::*;
use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;
use crate::core_crypto::entities::*;
use rayon::prelude::*;

/// Degree $d\_j$ of the monomial multiplying GGSW `ggsw_index` of a group: the switched sum of
/// the mask elements selected by the bits of `ggsw_index`, bit `g - 1 - k` selecting element
/// `k`.
#[inline]
pub fn multi_bit_monomial_degree(
    lwe_mask_elements: &[u64],
    ggsw_index: usize,
    polynomial_size: PolynomialSize,
) -> usize {
    let mut monomial_degree = 0u64;
    for (mask_idx, &mask_element) in lwe_mask_elements.iter().enumerate() {
        let mask_position = lwe_mask_elements.len() - (mask_idx + 1);
        let selection_bit = ((ggsw_index >> mask_position) & 1) as u64;
        monomial_degree = monomial_degree.wrapping_add(selection_bit.wrapping_mul(mask_element));
    }
    pbs_modulus_switch(monomial_degree, polynomial_size)
}

/// Compute the keybundle of group `group` of a multi bit key for the given mask elements, in
/// `output`.
///
/// # Panics
///
/// Panics if `output` does not have the shape of the GGSW ciphertexts of the key.
pub fn compute_multi_bit_keybundle<KeyCont, OutputCont>(
    multi_bit_bsk: &LweMultiBitBootstrapKey<KeyCont>,
    group: usize,
    lwe_mask_elements: &[u64],
    output: &mut GgswCiphertext<OutputCont>,
) where
    KeyCont: Container,
    OutputCont: ContainerMut,
{
    assert_eq!(output.as_ref().len(), multi_bit_bsk.ggsw_size());
    assert_eq!(lwe_mask_elements.len(), multi_bit_bsk.grouping_factor().0);

    let polynomial_size = multi_bit_bsk.polynomial_size();
    let ggsw_per_multi_bit_element = multi_bit_bsk
        .grouping_factor()
        .ggsw_per_multi_bit_element()
        .0;

    // Keygen guarantees the first term is a constant term of the polynomial, no
    // polynomial multiplication required
    output
        .as_mut()
        .copy_from_slice(multi_bit_bsk.get_ggsw(group, 0).as_ref());

    let mut rotated = vec![0u64; polynomial_size.0];
    for ggsw_index in 1..ggsw_per_multi_bit_element {
        let monomial_degree =
            multi_bit_monomial_degree(lwe_mask_elements, ggsw_index, polynomial_size);
        let ggsw = multi_bit_bsk.get_ggsw(group, ggsw_index);

        for (output_poly, ggsw_poly) in output
            .as_mut()
            .chunks_exact_mut(polynomial_size.0)
            .zip(ggsw.as_ref().chunks_exact(polynomial_size.0))
        {
            rotated.copy_from_slice(ggsw_poly);
            polynomial_wrapping_monic_monomial_mul_assign(
                &mut rotated,
                MonomialDegree(monomial_degree),
            );
            polynomial_wrapping_add_assign(output_poly, &rotated);
        }
    }
}

/// Perform a multi bit blind rotation given an input [`LWE ciphertext`](`LweCiphertext`),
/// modifying a look-up table passed as a [`GLWE ciphertext`](`GlweCiphertext`).
///
/// Groups are processed in increasing order.
pub fn multi_bit_blind_rotate_assign<InputCont, OutputCont, KeyCont>(
    input: &LweCiphertext<InputCont>,
    accumulator: &mut GlweCiphertext<OutputCont>,
    multi_bit_bsk: &LweMultiBitBootstrapKey<KeyCont>,
) where
    InputCont: Container,
    OutputCont: ContainerMut,
    KeyCont: Container,
{
    assert_eq!(
        input.lwe_size().to_lwe_dimension(),
        multi_bit_bsk.input_lwe_dimension(),
        "Mimatched input LweDimension. LweCiphertext input LweDimension {:?}. \
        LweMultiBitBootstrapKey input LweDimension {:?}.",
        input.lwe_size().to_lwe_dimension(),
        multi_bit_bsk.input_lwe_dimension(),
    );

    assert_eq!(
        accumulator.glwe_size(),
        multi_bit_bsk.glwe_size(),
        "Mimatched GlweSize. Accumulator GlweSize {:?}. \
        LweMultiBitBootstrapKey GlweSize {:?}.",
        accumulator.glwe_size(),
        multi_bit_bsk.glwe_size(),
    );

    assert_eq!(
        accumulator.polynomial_size(),
        multi_bit_bsk.polynomial_size(),
        "Mimatched PolynomialSize. Accumulator PolynomialSize {:?}. \
        LweMultiBitBootstrapKey PolynomialSize {:?}.",
        accumulator.polynomial_size(),
        multi_bit_bsk.polynomial_size(),
    );

    let polynomial_size = accumulator.polynomial_size();
    let monomial_degree = MonomialDegree(pbs_modulus_switch(input.get_body(), polynomial_size));

    // Modulus switching
    for index in 0..accumulator.glwe_size().0 {
        polynomial_wrapping_monic_monomial_div_assign(
            accumulator.get_mut_polynomial(index),
            monomial_degree,
        );
    }

    let mut keybundle = GgswCiphertextOwned::new(
        0,
        multi_bit_bsk.glwe_size(),
        polynomial_size,
        multi_bit_bsk.decomposition_base_log(),
        multi_bit_bsk.decomposition_level_count(),
        multi_bit_bsk.ciphertext_modulus(),
    );
    let mut ct1 = GlweCiphertextOwned::new(
        0,
        accumulator.glwe_size(),
        polynomial_size,
        accumulator.ciphertext_modulus(),
    );

    let grouping_factor = multi_bit_bsk.grouping_factor().0;
    for (group, lwe_mask_elements) in input.get_mask().chunks_exact(grouping_factor).enumerate() {
        compute_multi_bit_keybundle(multi_bit_bsk, group, lwe_mask_elements, &mut keybundle);

        ct1.as_mut().fill(0);
        add_external_product_assign(&mut ct1, &keybundle, accumulator);
        accumulator.as_mut().copy_from_slice(ct1.as_ref());
    }
}

/// Perform a multi bit programmable bootstrap given an input [`LWE ciphertext`](`LweCiphertext`),
/// a look-up table passed as a [`GLWE ciphertext`](`GlweCiphertext`) and an
/// [`LWE multi bit bootstrap key`](`LweMultiBitBootstrapKey`).
pub fn multi_bit_programmable_bootstrap_lwe_ciphertext<InputCont, OutputCont, AccCont, KeyCont>(
    input: &LweCiphertext<InputCont>,
    output: &mut LweCiphertext<OutputCont>,
    accumulator: &GlweCiphertext<AccCont>,
    multi_bit_bsk: &LweMultiBitBootstrapKey<KeyCont>,
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

    multi_bit_blind_rotate_assign(input, &mut local_accumulator, multi_bit_bsk);

    extract_lwe_sample_from_glwe_ciphertext(&local_accumulator, output, MonomialDegree(0));
}

/// Multi bit counterpart of [`par_programmable_bootstrap_lwe_ciphertext_list`].
pub fn par_multi_bit_programmable_bootstrap_lwe_ciphertext_list<
    InputCont,
    OutputCont,
    LutCont,
    KeyCont,
>(
    input: &LweCiphertextList<InputCont>,
    output: &mut LweCiphertextList<OutputCont>,
    luts: &GlweCiphertextList<LutCont>,
    lut_indexes: &[usize],
    multi_bit_bsk: &LweMultiBitBootstrapKey<KeyCont>,
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
            multi_bit_programmable_bootstrap_lwe_ciphertext(
                &input.get(index),
                &mut output_ct,
                &luts.get(lut_index),
                multi_bit_bsk,
            );
        });
}
