use crate::error::DeviceError;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpuIndex(pub u32);

const WORD_BYTES: usize = std::mem::size_of::<u64>();

/// Capacity bookkeeping of a device global memory.
#[derive(Debug)]
pub(crate) struct MemoryPool {
    capacity: usize,
    used: AtomicUsize,
}

impl MemoryPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: AtomicUsize::new(0),
        }
    }

    fn reserve(&self, bytes: usize) -> Result<(), DeviceError> {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes)
                    .filter(|&total| total <= self.capacity)
            })
            .map(|_| ())
            .map_err(|used| DeviceError::OutOfMemory {
                requested: bytes,
                available: self.capacity.saturating_sub(used),
            })
    }

    fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }

    pub(crate) fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }
}

fn zeroed_words(len: usize) -> Box<[AtomicU64]> {
    (0..len).map(|_| AtomicU64::new(0)).collect()
}

struct Allocation {
    words: Box<[AtomicU64]>,
    pool: Arc<MemoryPool>,
}

impl Drop for Allocation {
    fn drop(&mut self) {
        self.pool.release(self.words.len() * WORD_BYTES);
    }
}

/// A contiguous array of 64 bits words stored in device memory.
///
/// Cloning a `GpuVec` yields another handle on the same device region, the same way a device
/// pointer can be copied around and handed to several kernels. The memory is given back to the
/// device when the last handle is dropped.
///
/// Word accesses are individually atomic, so blocks running concurrently never produce undefined
/// behavior; ordering between blocks is only provided by stream order and by the grid and
/// cluster barriers, as on real hardware.
#[derive(Clone)]
pub struct GpuVec {
    alloc: Arc<Allocation>,
    gpu_index: GpuIndex,
}

impl Debug for GpuVec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuVec")
            .field("len", &self.len())
            .field("gpu_index", &self.gpu_index)
            .finish()
    }
}

impl GpuVec {
    pub(crate) fn allocate(
        len: usize,
        gpu_index: GpuIndex,
        pool: &Arc<MemoryPool>,
    ) -> Result<Self, DeviceError> {
        let bytes = len
            .checked_mul(WORD_BYTES)
            .ok_or(DeviceError::OutOfMemory {
                requested: usize::MAX,
                available: 0,
            })?;
        pool.reserve(bytes)?;
        Ok(Self {
            alloc: Arc::new(Allocation {
                words: zeroed_words(len),
                pool: Arc::clone(pool),
            }),
            gpu_index,
        })
    }

    pub fn len(&self) -> usize {
        self.alloc.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn gpu_index(&self) -> GpuIndex {
        self.gpu_index
    }

    /// True when both handles point to the same device region.
    pub fn same_region(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.alloc, &other.alloc)
    }

    pub fn get(&self, index: usize) -> u64 {
        self.alloc.words[index].load(Ordering::Relaxed)
    }

    pub fn set(&self, index: usize, value: u64) {
        self.alloc.words[index].store(value, Ordering::Relaxed);
    }

    /// Device side read of `dst.len()` words starting at `offset`.
    ///
    /// # Panics
    ///
    /// Out of bounds accesses panic, which aborts the running kernel with a
    /// [`DeviceError::KernelFault`].
    pub fn load(&self, offset: usize, dst: &mut [u64]) {
        let src = &self.alloc.words[offset..offset + dst.len()];
        dst.iter_mut()
            .zip(src.iter())
            .for_each(|(d, s)| *d = s.load(Ordering::Relaxed));
    }

    /// Device side write of `src` starting at `offset`.
    pub fn store(&self, offset: usize, src: &[u64]) {
        let dst = &self.alloc.words[offset..offset + src.len()];
        dst.iter()
            .zip(src.iter())
            .for_each(|(d, &s)| d.store(s, Ordering::Relaxed));
    }

    pub(crate) fn fill(&self, value: u64) {
        self.alloc
            .words
            .iter()
            .for_each(|w| w.store(value, Ordering::Relaxed));
    }

    pub(crate) fn check_range(&self, offset: usize, len: usize) -> Result<(), DeviceError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len() => Ok(()),
            _ => Err(DeviceError::InvalidCopy {
                reason: format!(
                    "range {offset}..{} out of a buffer of {} words",
                    offset.saturating_add(len),
                    self.len()
                ),
            }),
        }
    }
}

/// Per block on-chip memory.
///
/// In a cluster launch the shared memories of all the blocks of a cluster are reachable from
/// each block of that cluster (distributed shared memory).
pub struct SharedMemory {
    words: Box<[AtomicU64]>,
}

impl SharedMemory {
    pub(crate) fn new(bytes: usize) -> Self {
        Self {
            words: zeroed_words(bytes / WORD_BYTES),
        }
    }

    /// Size in 64 bits words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn load(&self, offset: usize, dst: &mut [u64]) {
        let src = &self.words[offset..offset + dst.len()];
        dst.iter_mut()
            .zip(src.iter())
            .for_each(|(d, s)| *d = s.load(Ordering::Relaxed));
    }

    pub fn store(&self, offset: usize, src: &[u64]) {
        let dst = &self.words[offset..offset + src.len()];
        dst.iter()
            .zip(src.iter())
            .for_each(|(d, &s)| d.store(s, Ordering::Relaxed));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pool_accounting() {
        let pool = Arc::new(MemoryPool::new(64));
        let a = GpuVec::allocate(4, GpuIndex(0), &pool).unwrap();
        assert_eq!(pool.used(), 32);

        let err = GpuVec::allocate(5, GpuIndex(0), &pool).unwrap_err();
        assert_eq!(
            err,
            DeviceError::OutOfMemory {
                requested: 40,
                available: 32
            }
        );

        let alias = a.clone();
        drop(a);
        assert_eq!(pool.used(), 32);
        drop(alias);
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn load_store() {
        let pool = Arc::new(MemoryPool::new(1 << 10));
        let vec = GpuVec::allocate(8, GpuIndex(0), &pool).unwrap();
        vec.store(2, &[7, 8, 9]);
        let mut out = [0u64; 4];
        vec.load(1, &mut out);
        assert_eq!(out, [0, 7, 8, 9]);
        assert!(vec.check_range(6, 3).is_err());
        assert!(vec.check_range(6, 2).is_ok());
    }
}
