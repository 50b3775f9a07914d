//! Consistency checks of the parameters of a bootstrap batch.
//!
//! Validation is pure: it only looks at the parameter descriptor and the configured limits, and
//! validating the parameters of an already validated batch yields the same result.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::gpu::pbs::config::ValidationLimits;
use crate::core_crypto::gpu::pbs::PbsType;
use crate::error::Error;
use itertools::Itertools;

pub const MIN_POLYNOMIAL_SIZE: PolynomialSize = PolynomialSize(256);
pub const MAX_POLYNOMIAL_SIZE: PolynomialSize = PolynomialSize(16384);
pub const MIN_GROUPING_FACTOR: LweBskGroupingFactor = LweBskGroupingFactor(2);
pub const MAX_GROUPING_FACTOR: LweBskGroupingFactor = LweBskGroupingFactor(4);

/// Everything the engine needs to know about a batch to check it, select a variant and plan the
/// launches, gathered from the ciphertexts, look-up tables and keys of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbsParameters {
    pub ciphertext_modulus: CiphertextModulus,
    /// Dimension of the input ciphertexts.
    pub lwe_dimension: LweDimension,
    /// GLWE dimension of the look-up tables.
    pub glwe_dimension: GlweDimension,
    /// Polynomial size of the look-up tables.
    pub polynomial_size: PolynomialSize,
    pub pbs_base_log: DecompositionBaseLog,
    pub pbs_level: DecompositionLevelCount,
    pub ks_base_log: DecompositionBaseLog,
    pub ks_level: DecompositionLevelCount,
    /// Grouping factor of the bootstrap key, `None` for a classical key.
    pub grouping_factor: Option<LweBskGroupingFactor>,
    pub batch_size: LweCiphertextCount,
    pub bsk_input_lwe_dimension: LweDimension,
    pub bsk_glwe_dimension: GlweDimension,
    pub bsk_polynomial_size: PolynomialSize,
    pub lut_count: GlweCiphertextCount,
    pub input_lwe_count: LweCiphertextCount,
    pub output_lwe_count: LweCiphertextCount,
    /// Dimension of the output ciphertexts, produced by the key switch.
    pub output_lwe_dimension: LweDimension,
}

/// Parameters that went through [`validate_pbs_parameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPbsParameters {
    params: PbsParameters,
}

impl ValidatedPbsParameters {
    pub fn params(&self) -> &PbsParameters {
        &self.params
    }

    /// The bootstrap type the shape of the key calls for.
    pub fn key_pbs_type(&self) -> PbsType {
        match self.params.grouping_factor {
            Some(_) => PbsType::MultiBit,
            None => PbsType::Classical,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.params.batch_size.0
    }

    pub fn glwe_size(&self) -> GlweSize {
        self.params.glwe_dimension.to_glwe_size()
    }

    pub fn polynomial_size(&self) -> PolynomialSize {
        self.params.polynomial_size
    }

    pub fn level_count(&self) -> DecompositionLevelCount {
        self.params.pbs_level
    }

    /// Dimension of the samples extracted from the accumulators, the input dimension of the key
    /// switch.
    pub fn extracted_lwe_dimension(&self) -> LweDimension {
        self.params
            .glwe_dimension
            .to_equivalent_lwe_dimension(self.params.polynomial_size)
    }

    /// Number of groups of the multi bit blind rotation, `None` for a classical key.
    pub fn group_count(&self) -> Option<usize> {
        self.params
            .grouping_factor
            .map(|grouping_factor| self.params.lwe_dimension.0 / grouping_factor.0)
    }
}

fn check_decomposition(
    base_log_field: &'static str,
    level_field: &'static str,
    base_log: DecompositionBaseLog,
    level: DecompositionLevelCount,
) -> Result<(), Error> {
    if base_log.0 == 0 {
        return Err(Error::invalid_parameters(base_log_field, "must be at least 1"));
    }
    if level.0 == 0 {
        return Err(Error::invalid_parameters(level_field, "must be at least 1"));
    }
    let bits = base_log.0.checked_mul(level.0);
    if bits.map_or(true, |bits| bits > u64::BITS as usize) {
        return Err(Error::invalid_parameters(
            level_field,
            format!(
                "{} levels of {} bits exceed the {} bits of the torus",
                level.0,
                base_log.0,
                u64::BITS
            ),
        ));
    }
    Ok(())
}

/// Check that the parameters of a batch are mutually consistent and within the supported
/// ranges.
pub fn validate_pbs_parameters(
    params: &PbsParameters,
    limits: &ValidationLimits,
) -> Result<ValidatedPbsParameters, Error> {
    if !params.ciphertext_modulus.is_native_modulus() {
        return Err(Error::invalid_parameters(
            "ciphertext_modulus",
            format!("{:?} is not the native modulus", params.ciphertext_modulus),
        ));
    }

    let polynomial_size = params.polynomial_size;
    if !polynomial_size.0.is_power_of_two()
        || polynomial_size < MIN_POLYNOMIAL_SIZE
        || polynomial_size > MAX_POLYNOMIAL_SIZE
    {
        return Err(Error::invalid_parameters(
            "polynomial_size",
            format!(
                "{} is not a power of two in [{}, {}]",
                polynomial_size.0, MIN_POLYNOMIAL_SIZE.0, MAX_POLYNOMIAL_SIZE.0
            ),
        ));
    }
    if params.glwe_dimension.0 == 0 {
        return Err(Error::invalid_parameters("glwe_dimension", "must be at least 1"));
    }
    if params.lwe_dimension.0 == 0 {
        return Err(Error::invalid_parameters("lwe_dimension", "must be at least 1"));
    }
    if params.output_lwe_dimension.0 == 0 {
        return Err(Error::invalid_parameters(
            "output_lwe_dimension",
            "must be at least 1",
        ));
    }

    check_decomposition("pbs_base_log", "pbs_level", params.pbs_base_log, params.pbs_level)?;
    check_decomposition("ks_base_log", "ks_level", params.ks_base_log, params.ks_level)?;

    let batch_size = params.batch_size.0;
    if batch_size == 0 || batch_size > limits.max_batch_size {
        return Err(Error::invalid_parameters(
            "batch_size",
            format!("{batch_size} is not in [1, {}]", limits.max_batch_size),
        ));
    }

    if let Some(grouping_factor) = params.grouping_factor {
        if !(MIN_GROUPING_FACTOR.0..=MAX_GROUPING_FACTOR.0).contains(&grouping_factor.0) {
            return Err(Error::invalid_parameters(
                "grouping_factor",
                format!(
                    "{} is not in [{}, {}]",
                    grouping_factor.0, MIN_GROUPING_FACTOR.0, MAX_GROUPING_FACTOR.0
                ),
            ));
        }
        if params.lwe_dimension.0 % grouping_factor.0 != 0 {
            return Err(Error::invalid_parameters(
                "grouping_factor",
                format!(
                    "{} does not divide the LWE dimension {}",
                    grouping_factor.0, params.lwe_dimension.0
                ),
            ));
        }
    }

    if params.bsk_input_lwe_dimension != params.lwe_dimension {
        return Err(Error::invalid_parameters(
            "bsk_input_lwe_dimension",
            format!(
                "the key expects ciphertexts of dimension {}, got {}",
                params.bsk_input_lwe_dimension.0, params.lwe_dimension.0
            ),
        ));
    }
    if params.bsk_glwe_dimension != params.glwe_dimension {
        return Err(Error::invalid_parameters(
            "bsk_glwe_dimension",
            format!(
                "the key has GLWE dimension {}, the look-up tables {}",
                params.bsk_glwe_dimension.0, params.glwe_dimension.0
            ),
        ));
    }
    if params.bsk_polynomial_size != params.polynomial_size {
        return Err(Error::invalid_parameters(
            "bsk_polynomial_size",
            format!(
                "the key has polynomial size {}, the look-up tables {}",
                params.bsk_polynomial_size.0, params.polynomial_size.0
            ),
        ));
    }

    if params.lut_count.0 == 0 {
        return Err(Error::invalid_parameters("lut_count", "no look-up table"));
    }
    if params.input_lwe_count.0 == 0 {
        return Err(Error::invalid_parameters("input_lwe_count", "empty input list"));
    }
    if params.output_lwe_count.0 < batch_size {
        return Err(Error::invalid_parameters(
            "output_lwe_count",
            format!(
                "{} output ciphertexts cannot hold a batch of {batch_size}",
                params.output_lwe_count.0
            ),
        ));
    }

    Ok(ValidatedPbsParameters { params: *params })
}

/// Per ciphertext indexes of a batch.
///
/// Ciphertext `i` of the batch reads the input `input_indexes[i]`, evaluates the look-up table
/// `lut_indexes[i]` and is written to the output `output_indexes[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbsIndexes {
    pub input_indexes: Vec<usize>,
    pub output_indexes: Vec<usize>,
    pub lut_indexes: Vec<usize>,
}

impl PbsIndexes {
    /// Ciphertext `i` reads input `i`, uses the first look-up table and is written to output `i`.
    pub fn identity(batch_size: usize) -> Self {
        Self {
            input_indexes: (0..batch_size).collect(),
            output_indexes: (0..batch_size).collect(),
            lut_indexes: vec![0; batch_size],
        }
    }

    pub fn batch_size(&self) -> usize {
        self.input_indexes.len()
    }
}

fn check_index_range(
    field: &'static str,
    indexes: &[usize],
    batch_size: usize,
    bound: usize,
) -> Result<(), Error> {
    if indexes.len() != batch_size {
        return Err(Error::invalid_parameters(
            field,
            format!("{} indexes for a batch of {batch_size}", indexes.len()),
        ));
    }
    if let Some((position, index)) = indexes.iter().find_position(|&&index| index >= bound) {
        return Err(Error::invalid_parameters(
            field,
            format!("index {index} at position {position} is out of [0, {bound})"),
        ));
    }
    Ok(())
}

/// Check the indexes of a batch against its validated parameters.
pub fn validate_pbs_indexes(
    indexes: &PbsIndexes,
    params: &ValidatedPbsParameters,
) -> Result<(), Error> {
    let batch_size = params.batch_size();
    let params = params.params();
    check_index_range(
        "input_indexes",
        &indexes.input_indexes,
        batch_size,
        params.input_lwe_count.0,
    )?;
    check_index_range(
        "lut_indexes",
        &indexes.lut_indexes,
        batch_size,
        params.lut_count.0,
    )?;
    check_index_range(
        "output_indexes",
        &indexes.output_indexes,
        batch_size,
        params.output_lwe_count.0,
    )?;
    if !indexes.output_indexes.iter().all_unique() {
        return Err(Error::invalid_parameters(
            "output_indexes",
            "two ciphertexts of the batch are written to the same output",
        ));
    }
    Ok(())
}
