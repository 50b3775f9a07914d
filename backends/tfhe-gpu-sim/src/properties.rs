//! Static description of an accelerator.
//!
//! [`DeviceProperties`] is the capability descriptor handed to whoever needs to reason about
//! launch limits. It is plain data: it can be built from one of the presets, edited, or loaded
//! from a TOML description of the device.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Number of threads executing in lockstep.
pub const WARP_SIZE: u32 = 32;

/// Thread block clusters appeared with the Hopper generation.
pub const CLUSTER_LAUNCH_MIN_COMPUTE_CAPABILITY: ComputeCapability = ComputeCapability::new(9, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComputeCapability {
    pub major: u32,
    pub minor: u32,
}

impl ComputeCapability {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Display for ComputeCapability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProperties {
    pub name: String,
    pub multiprocessor_count: u32,
    pub max_threads_per_block: u32,
    pub max_threads_per_multiprocessor: u32,
    pub max_blocks_per_multiprocessor: u32,
    /// Largest dynamic shared memory a single block may request, in bytes.
    pub max_shared_memory_per_block: usize,
    pub max_shared_memory_per_multiprocessor: usize,
    pub max_grid_dim: (u32, u32, u32),
    pub global_memory_bytes: usize,
    pub cooperative_launch: bool,
    pub cluster_launch: bool,
    /// Largest number of blocks in a cluster, meaningless without cluster support.
    pub max_cluster_size: u32,
    pub compute_capability: ComputeCapability,
}

const GIB: usize = 1 << 30;

impl DeviceProperties {
    /// Hopper class device with thread block cluster support.
    pub fn h100() -> Self {
        Self {
            name: "H100 SXM".to_string(),
            compute_capability: ComputeCapability::new(9, 0),
            multiprocessor_count: 132,
            max_threads_per_block: 1024,
            max_threads_per_multiprocessor: 2048,
            max_blocks_per_multiprocessor: 32,
            max_shared_memory_per_block: 232_448,
            max_shared_memory_per_multiprocessor: 233_472,
            max_grid_dim: (i32::MAX as u32, 65535, 65535),
            global_memory_bytes: 80 * GIB,
            cooperative_launch: true,
            cluster_launch: true,
            max_cluster_size: 8,
        }
    }

    /// Ampere class device: cooperative launches but no clusters.
    pub fn a100() -> Self {
        Self {
            name: "A100 SXM4".to_string(),
            compute_capability: ComputeCapability::new(8, 0),
            multiprocessor_count: 108,
            max_threads_per_block: 1024,
            max_threads_per_multiprocessor: 2048,
            max_blocks_per_multiprocessor: 32,
            max_shared_memory_per_block: 166_912,
            max_shared_memory_per_multiprocessor: 167_936,
            max_grid_dim: (i32::MAX as u32, 65535, 65535),
            global_memory_bytes: 80 * GIB,
            cooperative_launch: true,
            cluster_launch: false,
            max_cluster_size: 1,
        }
    }

    /// Turing class device with a small shared memory.
    pub fn t4() -> Self {
        Self {
            name: "T4".to_string(),
            compute_capability: ComputeCapability::new(7, 5),
            multiprocessor_count: 40,
            max_threads_per_block: 1024,
            max_threads_per_multiprocessor: 1024,
            max_blocks_per_multiprocessor: 16,
            max_shared_memory_per_block: 65_536,
            max_shared_memory_per_multiprocessor: 65_536,
            max_grid_dim: (i32::MAX as u32, 65535, 65535),
            global_memory_bytes: 16 * GIB,
            cooperative_launch: true,
            cluster_launch: false,
            max_cluster_size: 1,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn supports_cooperative_launch(&self) -> bool {
        self.cooperative_launch
    }

    pub fn supports_cluster_launch(&self) -> bool {
        self.cluster_launch && self.compute_capability >= CLUSTER_LAUNCH_MIN_COMPUTE_CAPABILITY
    }

    /// Number of blocks of the given shape that can be resident on one multiprocessor at once,
    /// zero when a single block does not fit.
    pub fn max_active_blocks_per_multiprocessor(
        &self,
        threads_per_block: u32,
        shared_mem_bytes: usize,
    ) -> u32 {
        if threads_per_block == 0
            || threads_per_block > self.max_threads_per_block
            || shared_mem_bytes > self.max_shared_memory_per_block
        {
            return 0;
        }
        let by_threads = self.max_threads_per_multiprocessor / threads_per_block;
        let by_shared = if shared_mem_bytes == 0 {
            u32::MAX
        } else {
            u32::try_from(self.max_shared_memory_per_multiprocessor / shared_mem_bytes)
                .unwrap_or(u32::MAX)
        };
        by_threads
            .min(by_shared)
            .min(self.max_blocks_per_multiprocessor)
    }

    /// Largest grid a cooperative launch of the given block shape may use.
    pub fn max_cooperative_grid_blocks(&self, threads_per_block: u32, shared_mem_bytes: usize) -> usize {
        self.multiprocessor_count as usize
            * self.max_active_blocks_per_multiprocessor(threads_per_block, shared_mem_bytes)
                as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cluster_support_needs_hopper() {
        assert!(DeviceProperties::h100().supports_cluster_launch());
        assert!(!DeviceProperties::a100().supports_cluster_launch());

        let mut forged = DeviceProperties::a100();
        forged.cluster_launch = true;
        assert!(!forged.supports_cluster_launch());
    }

    #[test]
    fn occupancy_is_bounded_by_shared_memory() {
        let props = DeviceProperties::a100();
        assert_eq!(props.max_active_blocks_per_multiprocessor(128, 0), 16);
        assert_eq!(props.max_active_blocks_per_multiprocessor(128, 80_000), 2);
        assert_eq!(props.max_active_blocks_per_multiprocessor(128, 200_000), 0);
        assert_eq!(props.max_active_blocks_per_multiprocessor(2048, 0), 0);
        assert_eq!(props.max_cooperative_grid_blocks(128, 80_000), 216);
    }

    #[test]
    fn toml_description() {
        let props = DeviceProperties::h100();
        let content = toml::to_string(&props).unwrap();
        assert_eq!(DeviceProperties::from_toml_str(&content).unwrap(), props);
    }
}
