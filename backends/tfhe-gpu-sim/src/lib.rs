//! Software model of a CUDA-class accelerator.
//!
//! The crate offers the small surface a GPU runtime exposes to a compute library: device
//! properties, global memory, in-order streams and kernel launches (regular, cooperative and
//! thread block cluster launches). Kernels are block programs written in Rust and executed on the
//! host, block-parallel, with the synchronization guarantees of the corresponding launch mode.

pub mod device;
pub mod error;
pub mod launch;
pub mod memory;
pub mod properties;
pub mod stream;

pub use device::GpuDevice;
pub use error::DeviceError;
pub use launch::{BlockContext, Kernel, KernelExecutor, LaunchConfig, LaunchMode};
pub use memory::{GpuIndex, GpuVec, SharedMemory};
pub use properties::{
    ComputeCapability, DeviceProperties, CLUSTER_LAUNCH_MIN_COMPUTE_CAPABILITY, WARP_SIZE,
};
pub use stream::{Event, Stream};
