use crate::device::GpuDevice;
use crate::error::DeviceError;
use crate::launch::{Kernel, KernelExecutor, LaunchConfig, LaunchMode};
use crate::memory::GpuVec;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tracing::trace;

type Operation = Box<dyn FnOnce(&KernelExecutor<'_>) -> Result<(), DeviceError> + Send + 'static>;

enum Command {
    Run(Operation),
    Record(Arc<EventShared>),
}

#[derive(Default)]
struct EventShared {
    outcome: Mutex<Option<Result<(), DeviceError>>>,
    done: Condvar,
}

impl EventShared {
    fn complete(&self, outcome: Result<(), DeviceError>) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(outcome);
        self.done.notify_all();
    }
}

/// A marker recorded on a stream.
///
/// The event completes once every operation enqueued on the stream before it has run. It takes
/// the stream error raised since the previous synchronization or event: that error is reported
/// by [`Event::synchronize`] and no longer by the stream, and operations enqueued after the
/// event run again.
#[derive(Clone)]
pub struct Event {
    shared: Arc<EventShared>,
}

impl Event {
    /// Whether the event has completed.
    pub fn query(&self) -> bool {
        self.shared
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Blocks until the event completes and reports the error of the operations it covers.
    pub fn synchronize(&self) -> Result<(), DeviceError> {
        let mut outcome = self
            .shared
            .outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = outcome.as_ref() {
                return outcome.clone();
            }
            outcome = self
                .shared
                .done
                .wait(outcome)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Default)]
struct StreamState {
    pending: usize,
    error: Option<DeviceError>,
}

#[derive(Default)]
struct StreamShared {
    state: Mutex<StreamState>,
    idle: Condvar,
}

impl StreamShared {
    fn lock(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An in-order queue of device work.
///
/// Operations enqueued on a stream run one after the other, in enqueue order, on a worker owned
/// by the stream; the host only waits for them in [`Stream::synchronize`]. Once an operation
/// fails, the remaining operations of the stream are skipped until the error has been reported
/// by a synchronization or taken by an [`Event`].
///
/// Dropping a stream waits for the work already enqueued: in-flight work cannot be cancelled.
pub struct Stream {
    device: Arc<GpuDevice>,
    sender: Option<Sender<Command>>,
    shared: Arc<StreamShared>,
    worker: Option<JoinHandle<()>>,
}

impl Stream {
    pub(crate) fn new(device: Arc<GpuDevice>) -> Self {
        let (sender, receiver) = channel::<Command>();
        let shared = Arc::new(StreamShared::default());

        let worker_shared = Arc::clone(&shared);
        let worker_device = Arc::clone(&device);
        let worker = std::thread::Builder::new()
            .name(format!("gpu{}-stream", device.index().0))
            .spawn(move || {
                let executor = KernelExecutor::new(&worker_device);
                for command in receiver {
                    let result = match command {
                        Command::Run(op) => {
                            let skip = worker_shared.lock().error.is_some();
                            if skip {
                                Ok(())
                            } else {
                                catch_unwind(AssertUnwindSafe(|| op(&executor))).unwrap_or_else(
                                    |_| {
                                        Err(DeviceError::KernelFault {
                                            kernel: "host operation".to_string(),
                                            message: "aborted".to_string(),
                                        })
                                    },
                                )
                            }
                        }
                        Command::Record(event) => {
                            let error = worker_shared.lock().error.take();
                            event.complete(error.map_or(Ok(()), Err));
                            Ok(())
                        }
                    };

                    let mut state = worker_shared.lock();
                    if let Err(err) = result {
                        trace!(%err, "stream operation failed");
                        state.error.get_or_insert(err);
                    }
                    state.pending -= 1;
                    if state.pending == 0 {
                        worker_shared.idle.notify_all();
                    }
                }
            })
            .ok();

        Self {
            device,
            sender: worker.as_ref().map(|_| sender),
            shared,
            worker,
        }
    }

    pub fn device(&self) -> &Arc<GpuDevice> {
        &self.device
    }

    /// Enqueues an arbitrary device operation.
    pub fn enqueue<F>(&self, op: F)
    where
        F: FnOnce(&KernelExecutor<'_>) -> Result<(), DeviceError> + Send + 'static,
    {
        if !self.send(Command::Run(Box::new(op))) {
            self.shared.lock().error.get_or_insert(DeviceError::StreamClosed);
        }
    }

    fn send(&self, command: Command) -> bool {
        self.shared.lock().pending += 1;
        let sent = self
            .sender
            .as_ref()
            .is_some_and(|sender| sender.send(command).is_ok());
        if !sent {
            self.shared.lock().pending -= 1;
        }
        sent
    }

    /// Records an event after the operations enqueued so far.
    pub fn record_event(&self) -> Event {
        let shared = Arc::new(EventShared::default());
        if !self.send(Command::Record(Arc::clone(&shared))) {
            shared.complete(Err(DeviceError::StreamClosed));
        }
        Event { shared }
    }

    pub fn launch(&self, config: LaunchConfig, mode: LaunchMode, kernel: Arc<dyn Kernel>) {
        self.enqueue(move |executor| executor.execute(&config, &mode, kernel.as_ref()));
    }

    /// The content of `src` is captured at enqueue time.
    pub fn copy_to_gpu_async(&self, dst: &GpuVec, offset: usize, src: &[u64]) {
        let dst = dst.clone();
        let data = src.to_vec();
        self.enqueue(move |_| {
            dst.check_range(offset, data.len())?;
            trace!(offset, len = data.len(), "copy host to device");
            dst.store(offset, &data);
            Ok(())
        });
    }

    pub fn copy_gpu_to_gpu_async(
        &self,
        dst: &GpuVec,
        dst_offset: usize,
        src: &GpuVec,
        src_offset: usize,
        len: usize,
    ) {
        let dst = dst.clone();
        let src = src.clone();
        self.enqueue(move |_| {
            src.check_range(src_offset, len)?;
            dst.check_range(dst_offset, len)?;
            let mut staging = vec![0u64; len];
            src.load(src_offset, &mut staging);
            dst.store(dst_offset, &staging);
            Ok(())
        });
    }

    pub fn memset_async(&self, dst: &GpuVec, value: u64) {
        let dst = dst.clone();
        self.enqueue(move |_| {
            dst.fill(value);
            Ok(())
        });
    }

    /// Synchronizes the stream, then reads `dst.len()` words of `src` starting at `offset`.
    pub fn copy_to_cpu(&self, src: &GpuVec, offset: usize, dst: &mut [u64]) -> Result<(), DeviceError> {
        self.synchronize()?;
        src.check_range(offset, dst.len())?;
        trace!(offset, len = dst.len(), "copy device to host");
        src.load(offset, dst);
        Ok(())
    }

    /// Blocks until every enqueued operation has run and reports the first error raised since
    /// the previous synchronization, unless an event took it.
    pub fn synchronize(&self) -> Result<(), DeviceError> {
        let mut state = self.shared.lock();
        while state.pending != 0 {
            state = self
                .shared
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        match state.error.take() {
            Some(err) => Err(err),
            None if self.sender.is_none() => Err(DeviceError::StreamClosed),
            None => Ok(()),
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
