use crate::core_crypto::gpu::pbs::{PbsType, PbsVariant};
use std::fmt::{Debug, Display, Formatter};
use tfhe_gpu_sim::DeviceError;

/// Accelerator resource a launch plan can run out of.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Resource {
    SharedMemory,
    ClusterSize,
    CooperativeGrid,
    GlobalMemory,
    GridDimension,
    ThreadsPerBlock,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SharedMemory => "shared memory per block (bytes)",
            Self::ClusterSize => "thread block cluster size (blocks)",
            Self::CooperativeGrid => "co-resident blocks of a cooperative grid",
            Self::GlobalMemory => "global memory (bytes)",
            Self::GridDimension => "grid dimension",
            Self::ThreadsPerBlock => "threads per block",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed input shapes, nothing was enqueued.
    InvalidParameters { field: &'static str, reason: String },
    /// The requested bootstrap type or variant cannot run with this key or on this device.
    UnsupportedVariant {
        pbs_type: PbsType,
        variant: Option<PbsVariant>,
        reason: String,
    },
    /// The launch plan would exceed an accelerator limit.
    ResourceExceeded {
        resource: Resource,
        required: usize,
        available: usize,
    },
    /// The key switching key does not fit the extracted samples or the output list.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// The accelerator failed while executing the batch, the output content is unspecified.
    DeviceFailure(DeviceError),
    /// A configuration file could not be read or parsed.
    Config(String),
}

#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn invalid_parameters(field: &'static str, reason: impl Into<String>) -> Self {
        Self::from(ErrorKind::InvalidParameters {
            field,
            reason: reason.into(),
        })
    }

    pub(crate) fn unsupported_variant(
        pbs_type: PbsType,
        variant: Option<PbsVariant>,
        reason: impl Into<String>,
    ) -> Self {
        Self::from(ErrorKind::UnsupportedVariant {
            pbs_type,
            variant,
            reason: reason.into(),
        })
    }

    pub(crate) fn resource_exceeded(resource: Resource, required: usize, available: usize) -> Self {
        Self::from(ErrorKind::ResourceExceeded {
            resource,
            required,
            available,
        })
    }

    pub(crate) fn dimension_mismatch(what: &'static str, expected: usize, got: usize) -> Self {
        Self::from(ErrorKind::DimensionMismatch {
            what,
            expected,
            got,
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ErrorKind::InvalidParameters { field, reason } => {
                write!(f, "Invalid parameter {field}: {reason}")
            }
            ErrorKind::UnsupportedVariant {
                pbs_type,
                variant: Some(variant),
                reason,
            } => write!(f, "Unsupported PBS {pbs_type:?}/{variant:?}: {reason}"),
            ErrorKind::UnsupportedVariant {
                pbs_type,
                variant: None,
                reason,
            } => write!(f, "Unsupported PBS {pbs_type:?}: {reason}"),
            ErrorKind::ResourceExceeded {
                resource,
                required,
                available,
            } => write!(
                f,
                "Resource exceeded, {resource}: {required} required, {available} available"
            ),
            ErrorKind::DimensionMismatch {
                what,
                expected,
                got,
            } => write!(f, "Mismatched {what}: expected {expected}, got {got}"),
            ErrorKind::DeviceFailure(err) => write!(f, "Device failure: {err}"),
            ErrorKind::Config(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl From<DeviceError> for Error {
    fn from(err: DeviceError) -> Self {
        Self::from(ErrorKind::DeviceFailure(err))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::DeviceFailure(err) => Some(err),
            _ => None,
        }
    }
}
