//! Kernel launches.
//!
//! A kernel is a block program: [`Kernel::run_block`] is executed once per block of the launch
//! grid. The three launch modes differ in how blocks are scheduled and what they may synchronize
//! with:
//!
//! ```text
//!  Regular      blocks run in any order, no inter-block synchronization
//!  Cooperative  every block of the grid is resident at once, BlockContext::grid_sync
//!  Cluster      blocks are grouped in clusters that are co-scheduled, BlockContext::cluster_sync
//!               and read access to the shared memory of the other blocks of the cluster
//! ```
//!
//! Launch configurations are checked against the [`DeviceProperties`] when the launch executes,
//! the same way a real driver refuses a launch exceeding the device limits.

use crate::device::GpuDevice;
use crate::error::DeviceError;
use crate::memory::SharedMemory;
use crate::properties::DeviceProperties;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, PoisonError};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub grid_dim: (u32, u32, u32),
    pub block_dim: (u32, u32, u32),
    pub shared_mem_bytes: u32,
}

impl LaunchConfig {
    pub fn grid_blocks(&self) -> usize {
        let (x, y, z) = self.grid_dim;
        x as usize * y as usize * z as usize
    }

    pub fn threads_per_block(&self) -> u32 {
        let (x, y, z) = self.block_dim;
        x.saturating_mul(y).saturating_mul(z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchMode {
    Regular,
    Cooperative,
    Cluster { cluster_dim: (u32, u32, u32) },
}

pub trait Kernel: Send + Sync {
    fn name(&self) -> &'static str;

    fn run_block(&self, ctx: &BlockContext<'_>);
}

enum BlockSync<'a> {
    Independent,
    Grid(&'a GroupBarrier),
    Cluster {
        barrier: &'a GroupBarrier,
        members: &'a [SharedMemory],
        rank: usize,
    },
}

/// What a block sees of the launch it belongs to.
pub struct BlockContext<'a> {
    block_idx: (u32, u32, u32),
    grid_dim: (u32, u32, u32),
    block_dim: (u32, u32, u32),
    shared: &'a SharedMemory,
    sync: BlockSync<'a>,
}

impl BlockContext<'_> {
    pub fn block_idx(&self) -> (u32, u32, u32) {
        self.block_idx
    }

    pub fn grid_dim(&self) -> (u32, u32, u32) {
        self.grid_dim
    }

    pub fn block_dim(&self) -> (u32, u32, u32) {
        self.block_dim
    }

    pub fn shared(&self) -> &SharedMemory {
        self.shared
    }

    /// Grid wide barrier.
    ///
    /// # Panics
    ///
    /// Outside of a cooperative launch.
    pub fn grid_sync(&self) {
        match self.sync {
            BlockSync::Grid(barrier) => barrier.wait(),
            _ => panic!("grid_sync called outside of a cooperative launch"),
        }
    }

    /// Cluster wide barrier.
    ///
    /// # Panics
    ///
    /// Outside of a cluster launch.
    pub fn cluster_sync(&self) {
        match self.sync {
            BlockSync::Cluster { barrier, .. } => barrier.wait(),
            _ => panic!("cluster_sync called outside of a cluster launch"),
        }
    }

    /// Rank of this block within its cluster, x fastest.
    pub fn cluster_rank(&self) -> usize {
        match self.sync {
            BlockSync::Cluster { rank, .. } => rank,
            _ => panic!("cluster_rank called outside of a cluster launch"),
        }
    }

    /// Shared memory of the block of rank `rank` in this cluster.
    pub fn cluster_shared(&self, rank: usize) -> &SharedMemory {
        match self.sync {
            BlockSync::Cluster { members, .. } => &members[rank],
            _ => panic!("cluster_shared called outside of a cluster launch"),
        }
    }
}

/// Payload of the panic raised in blocks waiting on a barrier that another block will never
/// reach.
struct BarrierBroken;

struct BarrierState {
    arrived: usize,
    generation: u64,
    broken: bool,
}

/// Reusable barrier that can be broken when one of its participants aborts, so that the other
/// participants do not wait forever.
struct GroupBarrier {
    size: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl GroupBarrier {
    fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            cvar: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.broken {
            drop(state);
            std::panic::panic_any(BarrierBroken);
        }
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return;
        }
        while state.generation == generation && !state.broken {
            state = self
                .cvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.broken {
            drop(state);
            std::panic::panic_any(BarrierBroken);
        }
    }

    fn break_all(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.broken = true;
        self.cvar.notify_all();
    }
}

enum BlockOutcome {
    Done,
    Aborted(String),
    Released,
}

fn panic_message(payload: Box<dyn Any + Send>) -> BlockOutcome {
    if payload.is::<BarrierBroken>() {
        BlockOutcome::Released
    } else if let Some(msg) = payload.downcast_ref::<&str>() {
        BlockOutcome::Aborted((*msg).to_string())
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        BlockOutcome::Aborted(msg.clone())
    } else {
        BlockOutcome::Aborted("unknown abort".to_string())
    }
}

fn unlinearize(id: usize, dim: (u32, u32, u32)) -> (u32, u32, u32) {
    let (x, y, _) = (dim.0 as usize, dim.1 as usize, dim.2 as usize);
    ((id % x) as u32, ((id / x) % y) as u32, (id / (x * y)) as u32)
}

fn run_block(kernel: &dyn Kernel, ctx: &BlockContext<'_>, barrier: Option<&GroupBarrier>) -> BlockOutcome {
    match catch_unwind(AssertUnwindSafe(|| kernel.run_block(ctx))) {
        Ok(()) => BlockOutcome::Done,
        Err(payload) => {
            if let Some(barrier) = barrier {
                barrier.break_all();
            }
            panic_message(payload)
        }
    }
}

fn first_fault(kernel: &dyn Kernel, outcomes: impl IntoIterator<Item = BlockOutcome>) -> Result<(), DeviceError> {
    let mut released = false;
    for outcome in outcomes {
        match outcome {
            BlockOutcome::Done => {}
            BlockOutcome::Released => released = true,
            BlockOutcome::Aborted(message) => {
                return Err(DeviceError::KernelFault {
                    kernel: kernel.name().to_string(),
                    message,
                })
            }
        }
    }
    if released {
        return Err(DeviceError::KernelFault {
            kernel: kernel.name().to_string(),
            message: "a block left a barrier".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_launch(
    props: &DeviceProperties,
    kernel: &str,
    config: &LaunchConfig,
    mode: &LaunchMode,
) -> Result<(), DeviceError> {
    let invalid = |reason: String| DeviceError::InvalidLaunch {
        kernel: kernel.to_string(),
        reason,
    };
    let (gx, gy, gz) = config.grid_dim;
    let (mx, my, mz) = props.max_grid_dim;
    if config.grid_blocks() == 0 || config.threads_per_block() == 0 {
        return Err(invalid("empty grid or block".to_string()));
    }
    if gx > mx || gy > my || gz > mz {
        return Err(invalid(format!(
            "grid {:?} exceeds the maximum grid {:?}",
            config.grid_dim, props.max_grid_dim
        )));
    }
    if config.threads_per_block() > props.max_threads_per_block {
        return Err(invalid(format!(
            "{} threads per block, at most {} supported",
            config.threads_per_block(),
            props.max_threads_per_block
        )));
    }
    if config.shared_mem_bytes as usize > props.max_shared_memory_per_block {
        return Err(invalid(format!(
            "{} bytes of shared memory per block, at most {} supported",
            config.shared_mem_bytes, props.max_shared_memory_per_block
        )));
    }
    match mode {
        LaunchMode::Regular => Ok(()),
        LaunchMode::Cooperative => {
            if !props.supports_cooperative_launch() {
                return Err(invalid("cooperative launch not supported".to_string()));
            }
            let max_blocks = props.max_cooperative_grid_blocks(
                config.threads_per_block(),
                config.shared_mem_bytes as usize,
            );
            if config.grid_blocks() > max_blocks {
                return Err(invalid(format!(
                    "cooperative grid of {} blocks exceeds the {max_blocks} co-resident blocks",
                    config.grid_blocks()
                )));
            }
            Ok(())
        }
        LaunchMode::Cluster { cluster_dim } => {
            if !props.supports_cluster_launch() {
                return Err(invalid("cluster launch not supported".to_string()));
            }
            let (cx, cy, cz) = *cluster_dim;
            if cx == 0 || cy == 0 || cz == 0 || gx % cx != 0 || gy % cy != 0 || gz % cz != 0 {
                return Err(invalid(format!(
                    "cluster {cluster_dim:?} does not tile the grid {:?}",
                    config.grid_dim
                )));
            }
            let cluster_size = cx * cy * cz;
            if cluster_size > props.max_cluster_size {
                return Err(invalid(format!(
                    "cluster of {cluster_size} blocks, at most {} supported",
                    props.max_cluster_size
                )));
            }
            Ok(())
        }
    }
}

/// Runs kernels on behalf of a stream.
///
/// Operations enqueued on a stream receive a `KernelExecutor` and may execute any number of
/// kernels synchronously with respect to that stream.
pub struct KernelExecutor<'a> {
    device: &'a GpuDevice,
}

impl<'a> KernelExecutor<'a> {
    pub(crate) fn new(device: &'a GpuDevice) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &GpuDevice {
        self.device
    }

    pub fn execute(
        &self,
        config: &LaunchConfig,
        mode: &LaunchMode,
        kernel: &dyn Kernel,
    ) -> Result<(), DeviceError> {
        validate_launch(self.device.properties(), kernel.name(), config, mode)?;
        if self.device.take_launch_fault() {
            return Err(DeviceError::LaunchFailure {
                kernel: kernel.name().to_string(),
            });
        }
        let faulty;
        let kernel: &dyn Kernel = if self.device.take_kernel_fault(kernel.name()) {
            faulty = InjectedFault { kernel };
            &faulty
        } else {
            kernel
        };
        trace!(
            kernel = kernel.name(),
            grid = ?config.grid_dim,
            block = ?config.block_dim,
            shared = config.shared_mem_bytes,
            ?mode,
            "launch"
        );
        match mode {
            LaunchMode::Regular => execute_regular(config, kernel),
            LaunchMode::Cooperative => execute_cooperative(config, kernel),
            LaunchMode::Cluster { cluster_dim } => execute_clusters(config, *cluster_dim, kernel),
        }
    }
}

/// Aborts the first block of the grid, every other block runs `kernel`.
struct InjectedFault<'k> {
    kernel: &'k dyn Kernel,
}

impl Kernel for InjectedFault<'_> {
    fn name(&self) -> &'static str {
        self.kernel.name()
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        if ctx.block_idx() == (0, 0, 0) {
            panic!("injected fault");
        }
        self.kernel.run_block(ctx);
    }
}

fn execute_regular(config: &LaunchConfig, kernel: &dyn Kernel) -> Result<(), DeviceError> {
    let outcomes: Vec<BlockOutcome> = (0..config.grid_blocks())
        .into_par_iter()
        .map(|id| {
            let shared = SharedMemory::new(config.shared_mem_bytes as usize);
            let ctx = BlockContext {
                block_idx: unlinearize(id, config.grid_dim),
                grid_dim: config.grid_dim,
                block_dim: config.block_dim,
                shared: &shared,
                sync: BlockSync::Independent,
            };
            run_block(kernel, &ctx, None)
        })
        .collect();
    first_fault(kernel, outcomes)
}

fn execute_cooperative(config: &LaunchConfig, kernel: &dyn Kernel) -> Result<(), DeviceError> {
    let blocks = config.grid_blocks();
    let barrier = GroupBarrier::new(blocks);
    let shared: Vec<SharedMemory> = (0..blocks)
        .map(|_| SharedMemory::new(config.shared_mem_bytes as usize))
        .collect();

    let outcomes: Vec<BlockOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = shared
            .iter()
            .enumerate()
            .map(|(id, shared)| {
                let barrier = &barrier;
                scope.spawn(move || {
                    let ctx = BlockContext {
                        block_idx: unlinearize(id, config.grid_dim),
                        grid_dim: config.grid_dim,
                        block_dim: config.block_dim,
                        shared,
                        sync: BlockSync::Grid(barrier),
                    };
                    run_block(kernel, &ctx, Some(barrier))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| BlockOutcome::Aborted("block thread died".to_string()))
            })
            .collect()
    });
    first_fault(kernel, outcomes)
}

fn execute_clusters(
    config: &LaunchConfig,
    cluster_dim: (u32, u32, u32),
    kernel: &dyn Kernel,
) -> Result<(), DeviceError> {
    let (gx, gy, gz) = config.grid_dim;
    let (cx, cy, cz) = cluster_dim;
    let cluster_grid = (gx / cx, gy / cy, gz / cz);
    let cluster_count = cluster_grid.0 as usize * cluster_grid.1 as usize * cluster_grid.2 as usize;
    let cluster_size = (cx * cy * cz) as usize;

    let outcomes: Vec<BlockOutcome> = (0..cluster_count)
        .into_par_iter()
        .flat_map_iter(|cluster_id| {
            let (ox, oy, oz) = unlinearize(cluster_id, cluster_grid);
            let barrier = GroupBarrier::new(cluster_size);
            let members: Vec<SharedMemory> = (0..cluster_size)
                .map(|_| SharedMemory::new(config.shared_mem_bytes as usize))
                .collect();

            let outcomes: Vec<BlockOutcome> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..cluster_size)
                    .map(|rank| {
                        let barrier = &barrier;
                        let members = &members;
                        scope.spawn(move || {
                            let (rx, ry, rz) = unlinearize(rank, cluster_dim);
                            let ctx = BlockContext {
                                block_idx: (ox * cx + rx, oy * cy + ry, oz * cz + rz),
                                grid_dim: config.grid_dim,
                                block_dim: config.block_dim,
                                shared: &members[rank],
                                sync: BlockSync::Cluster {
                                    barrier,
                                    members,
                                    rank,
                                },
                            };
                            run_block(kernel, &ctx, Some(barrier))
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|_| {
                            BlockOutcome::Aborted("block thread died".to_string())
                        })
                    })
                    .collect()
            });
            outcomes
        })
        .collect();
    first_fault(kernel, outcomes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::GpuDevice;
    use crate::memory::GpuIndex;
    use std::sync::Arc;

    struct BlockIds {
        out: crate::GpuVec,
    }

    impl Kernel for BlockIds {
        fn name(&self) -> &'static str {
            "block_ids"
        }

        fn run_block(&self, ctx: &BlockContext<'_>) {
            let (x, y, z) = ctx.block_idx();
            let (gx, gy, _) = ctx.grid_dim();
            let id = x + y * gx + z * gx * gy;
            self.out.set(id as usize, id as u64 + 1);
        }
    }

    /// Every block publishes a value, then reads the value of its right neighbour after the
    /// barrier.
    struct NeighbourExchange {
        published: crate::GpuVec,
        out: crate::GpuVec,
    }

    impl Kernel for NeighbourExchange {
        fn name(&self) -> &'static str {
            "neighbour_exchange"
        }

        fn run_block(&self, ctx: &BlockContext<'_>) {
            let id = ctx.block_idx().0 as usize;
            let n = ctx.grid_dim().0 as usize;
            for round in 0..3u64 {
                self.published.set(id, (id as u64 + 1) * 10 + round);
                ctx.grid_sync();
                let neighbour = self.published.get((id + 1) % n);
                self.out.set(id, self.out.get(id) + neighbour);
                ctx.grid_sync();
            }
        }
    }

    struct ClusterSum {
        out: crate::GpuVec,
    }

    impl Kernel for ClusterSum {
        fn name(&self) -> &'static str {
            "cluster_sum"
        }

        fn run_block(&self, ctx: &BlockContext<'_>) {
            let (x, _, z) = ctx.block_idx();
            ctx.shared().store(0, &[x as u64 + 1]);
            ctx.cluster_sync();
            let (cx, cy, cz) = (ctx.grid_dim().0 as usize, 1, 1);
            let mut total = 0;
            for rank in 0..cx * cy * cz {
                let mut word = [0u64];
                ctx.cluster_shared(rank).load(0, &mut word);
                total += word[0];
            }
            ctx.cluster_sync();
            if ctx.cluster_rank() == 0 {
                self.out.set(z as usize, total);
            }
        }
    }

    struct Faulty;

    impl Kernel for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn run_block(&self, ctx: &BlockContext<'_>) {
            if ctx.block_idx().0 == 1 {
                panic!("illegal address");
            }
            ctx.grid_sync();
        }
    }

    fn device() -> Arc<GpuDevice> {
        GpuDevice::new(GpuIndex(0), DeviceProperties::h100())
    }

    fn config(grid_dim: (u32, u32, u32), shared_mem_bytes: u32) -> LaunchConfig {
        LaunchConfig {
            grid_dim,
            block_dim: (32, 1, 1),
            shared_mem_bytes,
        }
    }

    #[test]
    fn regular_grid_covers_every_block() {
        let device = device();
        let out = device.malloc(24).unwrap();
        let kernel = BlockIds { out: out.clone() };
        KernelExecutor::new(&device)
            .execute(&config((2, 3, 4), 0), &LaunchMode::Regular, &kernel)
            .unwrap();
        let mut host = vec![0u64; 24];
        out.load(0, &mut host);
        assert_eq!(host, (1..=24).collect::<Vec<_>>());
    }

    #[test]
    fn cooperative_grid_sync_orders_rounds() {
        let device = device();
        let n = 5;
        let published = device.malloc(n).unwrap();
        let out = device.malloc(n).unwrap();
        let kernel = NeighbourExchange {
            published,
            out: out.clone(),
        };
        KernelExecutor::new(&device)
            .execute(&config((n as u32, 1, 1), 0), &LaunchMode::Cooperative, &kernel)
            .unwrap();
        for id in 0..n {
            let neighbour = ((id + 1) % n) as u64 + 1;
            assert_eq!(out.get(id), 3 * neighbour * 10 + 3);
        }
    }

    #[test]
    fn cluster_blocks_read_each_other_shared_memory() {
        let device = device();
        let out = device.malloc(3).unwrap();
        let kernel = ClusterSum { out: out.clone() };
        KernelExecutor::new(&device)
            .execute(
                &config((4, 1, 3), 8),
                &LaunchMode::Cluster {
                    cluster_dim: (4, 1, 1),
                },
                &kernel,
            )
            .unwrap();
        for z in 0..3 {
            assert_eq!(out.get(z), 1 + 2 + 3 + 4);
        }
    }

    #[test]
    fn injected_fault_hits_only_the_named_kernel() {
        let device = device();
        let n = 4;
        let published = device.malloc(n).unwrap();
        let out = device.malloc(n).unwrap();
        let kernel = NeighbourExchange {
            published,
            out: out.clone(),
        };
        let executor = KernelExecutor::new(&device);

        device.inject_kernel_fault("neighbour_exchange");
        let ids = BlockIds {
            out: device.malloc(1).unwrap(),
        };
        executor
            .execute(&config((1, 1, 1), 0), &LaunchMode::Regular, &ids)
            .unwrap();

        // Blocks waiting on the grid barrier are released
        let err = executor
            .execute(&config((n as u32, 1, 1), 0), &LaunchMode::Cooperative, &kernel)
            .unwrap_err();
        assert_eq!(
            err,
            DeviceError::KernelFault {
                kernel: "neighbour_exchange".to_string(),
                message: "injected fault".to_string(),
            }
        );

        for id in 0..n {
            out.set(id, 0);
        }
        executor
            .execute(&config((n as u32, 1, 1), 0), &LaunchMode::Cooperative, &kernel)
            .unwrap();
        assert_eq!(out.get(0), 3 * 20 + 3);
    }

    #[test]
    fn launches_beyond_limits_are_refused() {
        let device = device();
        let props = device.properties().clone();
        let executor = KernelExecutor::new(&device);
        let out = device.malloc(1).unwrap();
        let kernel = BlockIds { out };

        let too_much_shared = config((1, 1, 1), props.max_shared_memory_per_block as u32 + 8);
        assert!(matches!(
            executor.execute(&too_much_shared, &LaunchMode::Regular, &kernel),
            Err(DeviceError::InvalidLaunch { .. })
        ));

        let too_big_cluster = LaunchMode::Cluster {
            cluster_dim: (props.max_cluster_size * 2, 1, 1),
        };
        assert!(matches!(
            executor.execute(
                &config((props.max_cluster_size * 2, 1, 1), 0),
                &too_big_cluster,
                &kernel
            ),
            Err(DeviceError::InvalidLaunch { .. })
        ));

        let no_cluster = GpuDevice::new(GpuIndex(1), DeviceProperties::a100());
        assert!(matches!(
            KernelExecutor::new(&no_cluster).execute(
                &config((2, 1, 1), 0),
                &LaunchMode::Cluster {
                    cluster_dim: (2, 1, 1)
                },
                &kernel
            ),
            Err(DeviceError::InvalidLaunch { .. })
        ));
    }

    #[test]
    fn aborted_block_releases_the_grid() {
        let device = device();
        let result =
            KernelExecutor::new(&device).execute(&config((4, 1, 1), 0), &LaunchMode::Cooperative, &Faulty);
        assert_eq!(
            result,
            Err(DeviceError::KernelFault {
                kernel: "faulty".to_string(),
                message: "illegal address".to_string()
            })
        );
    }
}
