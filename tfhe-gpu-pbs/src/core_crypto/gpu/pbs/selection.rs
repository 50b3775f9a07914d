//! Choice of the bootstrap type and execution variant.

use crate::core_crypto::gpu::pbs::config::SelectorThresholds;
use crate::core_crypto::gpu::pbs::plan::{cluster_slot_layout, cooperative_slot_layout};
use crate::core_crypto::gpu::pbs::validation::ValidatedPbsParameters;
use crate::core_crypto::gpu::pbs::{PbsType, PbsVariant};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use tfhe_gpu_sim::DeviceProperties;
use tracing::debug;

/// Optional caller preferences, the selector decides whatever is left to `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PbsSelectionHint {
    pub pbs_type: Option<PbsType>,
    pub variant: Option<PbsVariant>,
}

impl PbsSelectionHint {
    pub fn with_type(pbs_type: PbsType) -> Self {
        Self {
            pbs_type: Some(pbs_type),
            variant: None,
        }
    }

    pub fn with_variant(variant: PbsVariant) -> Self {
        Self {
            pbs_type: None,
            variant: Some(variant),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PbsSelection {
    pub pbs_type: PbsType,
    pub variant: PbsVariant,
}

/// Check that `pbs_type` matches the bootstrap key and that the device can launch `variant`.
///
/// Resource limits are not looked at, they are the planner's business.
pub fn check_compatibility(
    pbs_type: PbsType,
    variant: PbsVariant,
    params: &ValidatedPbsParameters,
    props: &DeviceProperties,
) -> Result<(), Error> {
    check_type(pbs_type, params)?;
    match variant {
        PbsVariant::Default => Ok(()),
        PbsVariant::Cg if !props.supports_cooperative_launch() => Err(Error::unsupported_variant(
            pbs_type,
            Some(variant),
            format!("{} does not support cooperative launches", props.name),
        )),
        PbsVariant::Tbc if !props.supports_cluster_launch() => Err(Error::unsupported_variant(
            pbs_type,
            Some(variant),
            format!(
                "{} (compute capability {}) does not support thread block clusters",
                props.name, props.compute_capability
            ),
        )),
        PbsVariant::Cg | PbsVariant::Tbc => Ok(()),
    }
}

fn check_type(pbs_type: PbsType, params: &ValidatedPbsParameters) -> Result<(), Error> {
    let key_type = params.key_pbs_type();
    if pbs_type == key_type {
        return Ok(());
    }
    let reason = match pbs_type {
        PbsType::MultiBit => "the bootstrap key has no grouping factor",
        PbsType::Classical => "the bootstrap key is a multi bit key",
    };
    Err(Error::unsupported_variant(pbs_type, None, reason))
}

/// Pick the bootstrap type and variant of a batch.
///
/// An explicit hint is honoured when the key and the device are compatible with it, a
/// resource shortage then surfaces from [`plan_pbs`](super::plan_pbs). Without a variant hint,
/// thread block clusters are preferred for large polynomials, then cooperative launches for
/// large batches, then the default variant. An automatic choice never picks a variant whose
/// shared memory, cluster or occupancy requirements the device cannot meet.
pub fn select_pbs(
    params: &ValidatedPbsParameters,
    props: &DeviceProperties,
    hint: PbsSelectionHint,
    thresholds: &SelectorThresholds,
) -> Result<PbsSelection, Error> {
    let pbs_type = hint.pbs_type.unwrap_or_else(|| params.key_pbs_type());
    check_type(pbs_type, params)?;

    let variant = match hint.variant {
        Some(variant) => {
            check_compatibility(pbs_type, variant, params, props)?;
            variant
        }
        None => {
            if props.supports_cluster_launch()
                && params.polynomial_size() >= thresholds.tbc_min_polynomial_size
                && cluster_slot_layout(params, props).is_ok()
            {
                PbsVariant::Tbc
            } else if props.supports_cooperative_launch()
                && params.batch_size() >= thresholds.cg_min_batch_size
                && cooperative_slot_layout(params, props).is_ok()
            {
                PbsVariant::Cg
            } else {
                PbsVariant::Default
            }
        }
    };

    debug!(
        ?pbs_type,
        ?variant,
        hinted = hint.variant.is_some(),
        device = %props.name,
        polynomial_size = params.polynomial_size().0,
        batch_size = params.batch_size(),
        "selected bootstrap variant"
    );
    Ok(PbsSelection { pbs_type, variant })
}
