#[cfg(test)]
pub mod algorithms;
pub mod entities;
pub mod pbs;

use crate::error::Error;
pub use entities::*;
use std::sync::Arc;
use tfhe_gpu_sim::{DeviceProperties, GpuDevice, GpuIndex, Stream};

/// The accelerator a computation targets.
///
/// Cloning a `GpuTarget` gives another handle on the same device.
#[derive(Clone, Debug)]
pub struct GpuTarget {
    device: Arc<GpuDevice>,
}

impl GpuTarget {
    /// Open the device `gpu_index` described by `properties`.
    pub fn new(gpu_index: GpuIndex, properties: DeviceProperties) -> Self {
        Self {
            device: GpuDevice::new(gpu_index, properties),
        }
    }

    pub fn device(&self) -> &Arc<GpuDevice> {
        &self.device
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.device.index()
    }

    pub fn properties(&self) -> &DeviceProperties {
        self.device.properties()
    }
}

/// A set of in-order streams on one device.
///
/// Work enqueued on different streams is independent, work enqueued on the same stream runs in
/// enqueue order.
pub struct GpuStreams {
    target: GpuTarget,
    streams: Vec<Stream>,
}

impl GpuStreams {
    /// Create a `GpuStreams` with a single stream on the device of `target`.
    pub fn new_single_gpu(target: &GpuTarget) -> Self {
        Self::new(target, 1)
    }

    /// Create `stream_count` streams on the device of `target`, at least one.
    pub fn new(target: &GpuTarget, stream_count: usize) -> Self {
        let streams = (0..stream_count.max(1))
            .map(|_| target.device().create_stream())
            .collect();
        Self {
            target: target.clone(),
            streams,
        }
    }

    pub fn target(&self) -> &GpuTarget {
        &self.target
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.target.gpu_index()
    }

    /// Stream `index` of the set.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn stream(&self, index: usize) -> &Stream {
        &self.streams[index]
    }

    /// The stream every single stream operation runs on.
    pub fn main_stream(&self) -> &Stream {
        &self.streams[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stream> {
        self.streams.iter()
    }

    /// Synchronize all the streams, reporting the first error raised on any of them.
    pub fn synchronize(&self) -> Result<(), Error> {
        let mut first_error = None;
        for stream in self.streams.iter() {
            if let Err(err) = stream.synchronize() {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Return the number of streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Returns `true` if there is no stream, which never happens for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
