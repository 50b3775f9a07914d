use crate::error::DeviceError;
use crate::memory::{GpuIndex, GpuVec, MemoryPool};
use crate::properties::DeviceProperties;
use crate::stream::Stream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// One accelerator.
///
/// The device owns its global memory pool and exposes the exclusive launch slot that cooperative
/// and cluster kernels need: such kernels assume they are alone on the device, and whoever
/// launches them is expected to hold the slot while they run.
#[derive(Debug)]
pub struct GpuDevice {
    index: GpuIndex,
    properties: DeviceProperties,
    memory: Arc<MemoryPool>,
    exclusive_launch_slot: Arc<Mutex<()>>,
    pending_launch_fault: AtomicBool,
    pending_kernel_fault: Mutex<Option<String>>,
}

impl GpuDevice {
    pub fn new(index: GpuIndex, properties: DeviceProperties) -> Arc<Self> {
        debug!(
            gpu_index = index.0,
            name = %properties.name,
            compute_capability = %properties.compute_capability,
            "opening device"
        );
        Arc::new(Self {
            index,
            memory: Arc::new(MemoryPool::new(properties.global_memory_bytes)),
            properties,
            exclusive_launch_slot: Arc::new(Mutex::new(())),
            pending_launch_fault: AtomicBool::new(false),
            pending_kernel_fault: Mutex::new(None),
        })
    }

    pub fn index(&self) -> GpuIndex {
        self.index
    }

    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    /// Allocates `len` zeroed words of global memory.
    pub fn malloc(&self, len: usize) -> Result<GpuVec, DeviceError> {
        trace!(gpu_index = self.index.0, len, "malloc");
        GpuVec::allocate(len, self.index, &self.memory)
    }

    /// Global memory currently allocated, in bytes.
    pub fn memory_in_use(&self) -> usize {
        self.memory.used()
    }

    pub fn exclusive_launch_slot(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.exclusive_launch_slot)
    }

    pub fn create_stream(self: &Arc<Self>) -> Stream {
        Stream::new(Arc::clone(self))
    }

    /// Makes the next kernel launch on this device fail with [`DeviceError::LaunchFailure`].
    pub fn inject_launch_failure(&self) {
        self.pending_launch_fault.store(true, Ordering::Release);
    }

    /// Makes the first block of the next launch of the kernel named `kernel` abort while the
    /// other blocks run, which fails the launch with [`DeviceError::KernelFault`].
    pub fn inject_kernel_fault(&self, kernel: &str) {
        *self
            .pending_kernel_fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(kernel.to_string());
    }

    pub(crate) fn take_launch_fault(&self) -> bool {
        self.pending_launch_fault.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn take_kernel_fault(&self, kernel: &str) -> bool {
        let mut pending = self
            .pending_kernel_fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if pending.as_deref() == Some(kernel) {
            *pending = None;
            return true;
        }
        false
    }
}
