//! Programmable bootstrapping on the device.
//!
//! A bootstrap goes through the following components, leaf first:
//!
//! ```text
//!  validation      parameters of the batch are consistent and in range
//!  selection       bootstrap type (classical, multi bit) and variant (default, CG, TBC)
//!  plan            launch geometry, shared memory mode, multi bit chunking, buffer layout
//!  orchestrator    enqueues init, blind rotation, sample extraction, key switch and output
//!                  scatter on a stream
//! ```
//!
//! The device arithmetic is exact `u64` wrapping arithmetic, every variant therefore yields the
//! same bits as the host reference of [`crate::core_crypto::algorithms`].

mod blind_rotation;
pub mod buffer;
pub mod config;
mod kernels;
mod keyswitch;
pub mod orchestrator;
pub mod plan;
mod sample_extraction;
pub mod selection;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use buffer::PbsBuffer;
pub use config::{PbsEngineConfig, PlannerConfig, SelectorThresholds, ValidationLimits};
pub use orchestrator::{InFlightBootstrap, PbsEngine, PbsKeys, PbsRequest};
pub use plan::{
    plan_pbs, BufferLayout, ExecutionPlan, KernelGeometry, RotationSchedule, SharedMemoryMode,
};
pub use selection::{check_compatibility, select_pbs, PbsSelection, PbsSelectionHint};
pub use validation::{
    validate_pbs_indexes, validate_pbs_parameters, PbsIndexes, PbsParameters,
    ValidatedPbsParameters,
};

/// How the mask of the input ciphertexts is consumed by the blind rotation.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PbsType {
    /// `grouping_factor` mask coefficients per step, with a multi bit key.
    MultiBit = 0,
    /// One mask coefficient per step.
    Classical = 1,
}

/// How the steps of the blind rotation are mapped onto kernel launches.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PbsVariant {
    /// Independent launches, ordered by the stream.
    Default = 0,
    /// A single cooperative launch with grid wide barriers.
    Cg = 1,
    /// Thread block clusters exchanging partial products in distributed shared memory.
    Tbc = 2,
}
