use std::fmt::{Debug, Display, Formatter};

/// Errors reported by the device.
///
/// Errors raised by work enqueued on a stream are sticky: the first one is kept by the stream,
/// every later operation of that stream is skipped, and the error is handed back to the host at
/// the next synchronization point.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DeviceError {
    /// Not enough device memory left to satisfy an allocation.
    OutOfMemory { requested: usize, available: usize },
    /// The launch configuration violates a device limit.
    InvalidLaunch { kernel: String, reason: String },
    /// The launch was refused by the device.
    LaunchFailure { kernel: String },
    /// A block aborted while executing a kernel.
    KernelFault { kernel: String, message: String },
    /// A copy touched memory outside of the buffer bounds.
    InvalidCopy { reason: String },
    /// The stream worker is gone.
    StreamClosed,
}

impl Display for DeviceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                available,
            } => write!(
                f,
                "Out of device memory: requested {requested} bytes, {available} bytes available"
            ),
            Self::InvalidLaunch { kernel, reason } => {
                write!(f, "Invalid launch of kernel {kernel}: {reason}")
            }
            Self::LaunchFailure { kernel } => write!(f, "Launch of kernel {kernel} failed"),
            Self::KernelFault { kernel, message } => {
                write!(f, "Kernel {kernel} aborted: {message}")
            }
            Self::InvalidCopy { reason } => write!(f, "Invalid memory copy: {reason}"),
            Self::StreamClosed => write!(f, "The stream is closed"),
        }
    }
}

impl std::error::Error for DeviceError {}
