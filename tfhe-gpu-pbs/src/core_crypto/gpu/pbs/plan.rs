//! Kernel launch planning.
//!
//! The planner turns a selection and validated parameters into an [`ExecutionPlan`]: the launch
//! geometry of every kernel of the bootstrap, where their polynomial slots live, the multi bit
//! chunking and the device buffer layout. Every device limit is checked here, before anything is
//! enqueued, so that a plan never asks for more than the device offers.
//!
//! Kernels working on polynomials need a fixed number of polynomial slots of `N` words:
//!
//! ```text
//!  variant   slots              modes
//!  DEFAULT   1                  Full, NoSharedMemory (slot in global scratch)
//!  CG        2 (acc, digits)    Full, Partial (digits in global scratch)
//!  TBC       1 + glwe_size      Full (slots are exchanged through distributed shared memory)
//! ```

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::gpu::pbs::config::PlannerConfig;
use crate::core_crypto::gpu::pbs::selection::{check_compatibility, PbsSelection};
use crate::core_crypto::gpu::pbs::validation::ValidatedPbsParameters;
use crate::core_crypto::gpu::pbs::{PbsType, PbsVariant};
use crate::error::{Error, Resource};
use tfhe_gpu_sim::{DeviceProperties, LaunchConfig, LaunchMode, WARP_SIZE};
use tracing::debug;

/// Largest block of the key switch kernel.
pub const KEYSWITCH_MAX_THREADS: u32 = 256;

const WORD_BYTES: usize = std::mem::size_of::<u64>();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SharedMemoryMode {
    /// Every polynomial slot of the kernels is in shared memory.
    Full,
    /// Some slots are in shared memory, the others in a global scratch buffer.
    Partial,
    /// Every slot is in a global scratch buffer.
    NoSharedMemory,
}

/// Where the polynomial slots of a kernel live: slots below `shared_slots` are in the shared
/// memory of the block, the others in the global scratch buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotLayout {
    pub shared_slots: usize,
    pub total_slots: usize,
}

impl SlotLayout {
    pub const NONE: Self = Self {
        shared_slots: 0,
        total_slots: 0,
    };

    pub fn full(slots: usize) -> Self {
        Self {
            shared_slots: slots,
            total_slots: slots,
        }
    }

    pub fn mode(&self) -> SharedMemoryMode {
        if self.shared_slots == self.total_slots {
            SharedMemoryMode::Full
        } else if self.shared_slots == 0 {
            SharedMemoryMode::NoSharedMemory
        } else {
            SharedMemoryMode::Partial
        }
    }

    pub fn spills(&self) -> bool {
        self.shared_slots < self.total_slots
    }

    fn shared_bytes(&self, polynomial_size: PolynomialSize) -> usize {
        self.shared_slots * polynomial_size.0 * WORD_BYTES
    }
}

/// Launch geometry of one kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelGeometry {
    pub grid_dim: (u32, u32, u32),
    pub block_dim: (u32, u32, u32),
    pub shared_mem_bytes: u32,
    pub mode: LaunchMode,
    pub slots: SlotLayout,
}

impl KernelGeometry {
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            grid_dim: self.grid_dim,
            block_dim: self.block_dim,
            shared_mem_bytes: self.shared_mem_bytes,
        }
    }

    pub fn grid_blocks(&self) -> usize {
        self.launch_config().grid_blocks()
    }

    /// The same kernel on a grid with a different x dimension, for the last, shorter, multi bit
    /// chunk.
    pub fn with_grid_x(&self, grid_x: u32) -> Self {
        let (_, y, z) = self.grid_dim;
        Self {
            grid_dim: (grid_x, y, z),
            ..*self
        }
    }
}

/// How the steps of the blind rotation are launched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationSchedule {
    /// Two regular launches per step: decomposition, then products and accumulation.
    Default {
        step_one: KernelGeometry,
        step_two: KernelGeometry,
    },
    /// One cooperative launch for all the steps of a classical batch, or of a multi bit chunk.
    Cooperative { rotation: KernelGeometry },
    /// One cluster launch for all the steps of a classical batch, or of a multi bit chunk.
    Cluster { rotation: KernelGeometry },
}

/// Sizes, in 64 bits words, of the device buffers of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    /// One GLWE accumulator per ciphertext.
    pub accumulator: usize,
    /// Digit polynomials exchanged between the two steps of the default variant.
    pub digits: usize,
    /// Partial products exchanged by the blocks of a cooperative rotation.
    pub join: usize,
    /// Keybundles of one multi bit chunk.
    pub keybundle: usize,
    /// Polynomial slots that do not fit in shared memory.
    pub scratch: usize,
    /// Samples extracted from the accumulators.
    pub extracted: usize,
    /// Outputs of the key switch, before they are scattered to the caller's list.
    pub keyswitched: usize,
    /// Length of each of the input, output and look-up table index arrays.
    pub indexes: usize,
}

impl BufferLayout {
    pub fn total_words(&self) -> usize {
        self.accumulator
            + self.digits
            + self.join
            + self.keybundle
            + self.scratch
            + self.extracted
            + self.keyswitched
            + 3 * self.indexes
    }

    pub fn total_bytes(&self) -> usize {
        self.total_words() * WORD_BYTES
    }

    /// True when buffers allocated for `self` can serve a batch needing `other`.
    pub fn covers(&self, other: &Self) -> bool {
        self.accumulator >= other.accumulator
            && self.digits >= other.digits
            && self.join >= other.join
            && self.keybundle >= other.keybundle
            && self.scratch >= other.scratch
            && self.extracted >= other.extracted
            && self.keyswitched >= other.keyswitched
            && self.indexes >= other.indexes
    }
}

/// Everything needed to enqueue a batch, derived once per call and never modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub selection: PbsSelection,
    pub params: ValidatedPbsParameters,
    /// Threads per block of the polynomial kernels.
    pub threads_per_block: u32,
    /// Mode of the blind rotation kernels.
    pub shared_memory_mode: SharedMemoryMode,
    pub init: KernelGeometry,
    pub rotation: RotationSchedule,
    /// Keybundle kernel of a multi bit bootstrap, for a full chunk.
    pub keybundle: Option<KernelGeometry>,
    /// Number of multi bit groups per chunk.
    pub lwe_chunk_size: Option<usize>,
    pub sample_extraction: KernelGeometry,
    pub keyswitch: KernelGeometry,
    pub scatter: KernelGeometry,
    pub buffers: BufferLayout,
}

impl ExecutionPlan {
    /// `(first group, group count)` of every multi bit chunk, in processing order.
    pub fn multi_bit_chunks(&self) -> Vec<(usize, usize)> {
        match (self.params.group_count(), self.lwe_chunk_size) {
            (Some(group_count), Some(chunk_size)) => (0..group_count)
                .step_by(chunk_size)
                .map(|start| (start, chunk_size.min(group_count - start)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Threads per block of the kernels working on polynomials, `N / 8` within the device bounds.
pub fn polynomial_kernel_threads(
    polynomial_size: PolynomialSize,
    props: &DeviceProperties,
) -> Result<u32, Error> {
    if props.max_threads_per_block < WARP_SIZE {
        return Err(Error::resource_exceeded(
            Resource::ThreadsPerBlock,
            WARP_SIZE as usize,
            props.max_threads_per_block as usize,
        ));
    }
    let wanted = u32::try_from(polynomial_size.0 / 8).unwrap_or(u32::MAX);
    Ok(wanted.clamp(WARP_SIZE, props.max_threads_per_block))
}

pub fn keyswitch_threads(props: &DeviceProperties) -> u32 {
    KEYSWITCH_MAX_THREADS.min(props.max_threads_per_block)
}

fn polynomial_bytes(polynomial_size: PolynomialSize) -> usize {
    polynomial_size.0 * WORD_BYTES
}

/// Slots of the regular kernels: step one and two of the default variant and the keybundle.
pub(crate) fn regular_slot_layout(
    polynomial_size: PolynomialSize,
    props: &DeviceProperties,
) -> SlotLayout {
    if polynomial_bytes(polynomial_size) <= props.max_shared_memory_per_block {
        SlotLayout::full(1)
    } else {
        SlotLayout {
            shared_slots: 0,
            total_slots: 1,
        }
    }
}

fn rotation_grid(params: &ValidatedPbsParameters) -> (u32, u32, u32) {
    (
        params.level_count().0 as u32,
        params.glwe_size().0 as u32,
        params.batch_size() as u32,
    )
}

/// Slots of the cooperative rotation: both slots in shared memory when the grid stays
/// co-resident, else only the accumulator.
pub(crate) fn cooperative_slot_layout(
    params: &ValidatedPbsParameters,
    props: &DeviceProperties,
) -> Result<SlotLayout, Error> {
    let threads = polynomial_kernel_threads(params.polynomial_size(), props)?;
    let (x, y, z) = rotation_grid(params);
    let grid_blocks = x as usize * y as usize * z as usize;
    let polynomial_bytes = polynomial_bytes(params.polynomial_size());

    for slots in [SlotLayout::full(2), SlotLayout {
        shared_slots: 1,
        total_slots: 2,
    }] {
        let shared_bytes = slots.shared_bytes(params.polynomial_size());
        if shared_bytes <= props.max_shared_memory_per_block
            && grid_blocks <= props.max_cooperative_grid_blocks(threads, shared_bytes)
        {
            return Ok(slots);
        }
    }

    if polynomial_bytes > props.max_shared_memory_per_block {
        Err(Error::resource_exceeded(
            Resource::SharedMemory,
            polynomial_bytes,
            props.max_shared_memory_per_block,
        ))
    } else {
        Err(Error::resource_exceeded(
            Resource::CooperativeGrid,
            grid_blocks,
            props.max_cooperative_grid_blocks(threads, polynomial_bytes),
        ))
    }
}

/// Slots of the cluster rotation: the accumulator row and one partial product per column, all
/// in shared memory.
pub(crate) fn cluster_slot_layout(
    params: &ValidatedPbsParameters,
    props: &DeviceProperties,
) -> Result<SlotLayout, Error> {
    let cluster_size = params.level_count().0 * params.glwe_size().0;
    if cluster_size > props.max_cluster_size as usize {
        return Err(Error::resource_exceeded(
            Resource::ClusterSize,
            cluster_size,
            props.max_cluster_size as usize,
        ));
    }
    let slots = SlotLayout::full(1 + params.glwe_size().0);
    let shared_bytes = slots.shared_bytes(params.polynomial_size());
    if shared_bytes > props.max_shared_memory_per_block {
        return Err(Error::resource_exceeded(
            Resource::SharedMemory,
            shared_bytes,
            props.max_shared_memory_per_block,
        ));
    }
    Ok(slots)
}

fn geometry(
    grid_dim: (u32, u32, u32),
    threads: u32,
    slots: SlotLayout,
    polynomial_size: PolynomialSize,
    mode: LaunchMode,
) -> KernelGeometry {
    KernelGeometry {
        grid_dim,
        block_dim: (threads, 1, 1),
        // Slots are at most a few polynomials of at most 2^14 words
        shared_mem_bytes: slots.shared_bytes(polynomial_size) as u32,
        mode,
        slots,
    }
}

fn scratch_words(polynomial_size: PolynomialSize, kernels: &[Option<KernelGeometry>]) -> usize {
    kernels
        .iter()
        .flatten()
        .filter(|kernel| kernel.slots.spills())
        .map(|kernel| kernel.grid_blocks() * kernel.slots.total_slots * polynomial_size.0)
        .max()
        .unwrap_or(0)
}

fn buffer_layout(
    selection: PbsSelection,
    params: &ValidatedPbsParameters,
    lwe_chunk_size: Option<usize>,
    scratch: usize,
) -> BufferLayout {
    let p = params.params();
    let batch = params.batch_size();
    let glwe_size = params.glwe_size().0;
    let level = params.level_count().0;
    let polynomial_size = params.polynomial_size().0;
    let glwe_words = glwe_size * polynomial_size;

    BufferLayout {
        accumulator: batch * glwe_words,
        digits: match selection.variant {
            PbsVariant::Default => batch * level * glwe_words,
            PbsVariant::Cg | PbsVariant::Tbc => 0,
        },
        join: match selection.variant {
            PbsVariant::Cg => batch * level * glwe_size * glwe_words,
            PbsVariant::Default | PbsVariant::Tbc => 0,
        },
        keybundle: lwe_chunk_size
            .map(|chunk| batch * chunk * level * glwe_size * glwe_words)
            .unwrap_or(0),
        scratch,
        extracted: batch * params.extracted_lwe_dimension().to_lwe_size().0,
        keyswitched: batch * p.output_lwe_dimension.to_lwe_size().0,
        indexes: batch,
    }
}

/// Compute the execution plan of a batch.
///
/// The compatibility of the selection is checked again with the predicate the selector uses,
/// then every device limit the plan touches is checked.
pub fn plan_pbs(
    selection: PbsSelection,
    params: &ValidatedPbsParameters,
    props: &DeviceProperties,
    config: &PlannerConfig,
) -> Result<ExecutionPlan, Error> {
    check_compatibility(selection.pbs_type, selection.variant, params, props)?;

    let polynomial_size = params.polynomial_size();
    let batch = params.batch_size();
    let glwe_size = params.glwe_size().0 as u32;
    let level = params.level_count().0 as u32;

    let max_batch = props.max_grid_dim.1.min(props.max_grid_dim.2) as usize;
    if batch > max_batch {
        return Err(Error::resource_exceeded(
            Resource::GridDimension,
            batch,
            max_batch,
        ));
    }
    let batch = batch as u32;

    let threads = polynomial_kernel_threads(polynomial_size, props)?;
    let regular_slots = regular_slot_layout(polynomial_size, props);

    let (shared_memory_mode, rotation) = match selection.variant {
        PbsVariant::Default => (
            regular_slots.mode(),
            RotationSchedule::Default {
                step_one: geometry(
                    rotation_grid(params),
                    threads,
                    regular_slots,
                    polynomial_size,
                    LaunchMode::Regular,
                ),
                step_two: geometry(
                    (glwe_size, batch, 1),
                    threads,
                    regular_slots,
                    polynomial_size,
                    LaunchMode::Regular,
                ),
            },
        ),
        PbsVariant::Cg => {
            let slots = cooperative_slot_layout(params, props)?;
            (
                slots.mode(),
                RotationSchedule::Cooperative {
                    rotation: geometry(
                        rotation_grid(params),
                        threads,
                        slots,
                        polynomial_size,
                        LaunchMode::Cooperative,
                    ),
                },
            )
        }
        PbsVariant::Tbc => {
            let slots = cluster_slot_layout(params, props)?;
            (
                slots.mode(),
                RotationSchedule::Cluster {
                    rotation: geometry(
                        rotation_grid(params),
                        threads,
                        slots,
                        polynomial_size,
                        LaunchMode::Cluster {
                            cluster_dim: (level, glwe_size, 1),
                        },
                    ),
                },
            )
        }
    };
    let rotation_kernels = match rotation {
        RotationSchedule::Default { step_one, step_two } => [Some(step_one), Some(step_two)],
        RotationSchedule::Cooperative { rotation } | RotationSchedule::Cluster { rotation } => {
            [Some(rotation), None]
        }
    };

    let keybundle_geometry = |chunk: usize| {
        geometry(
            (chunk as u32, level * glwe_size, batch),
            threads,
            regular_slots,
            polynomial_size,
            LaunchMode::Regular,
        )
    };

    // Multi bit chunks are shrunk until the buffers of the batch fit in global memory
    let mut lwe_chunk_size = match selection.pbs_type {
        PbsType::MultiBit => params
            .group_count()
            .map(|group_count| config.max_lwe_chunk_size.clamp(1, group_count.max(1))),
        PbsType::Classical => None,
    };
    let (keybundle, buffers) = loop {
        let keybundle = lwe_chunk_size.map(keybundle_geometry);
        let scratch = scratch_words(
            polynomial_size,
            &[rotation_kernels[0], rotation_kernels[1], keybundle],
        );
        let buffers = buffer_layout(selection, params, lwe_chunk_size, scratch);
        if buffers.total_bytes() <= props.global_memory_bytes {
            break (keybundle, buffers);
        }
        match lwe_chunk_size {
            Some(chunk) if chunk > 1 => lwe_chunk_size = Some(chunk - 1),
            _ => {
                return Err(Error::resource_exceeded(
                    Resource::GlobalMemory,
                    buffers.total_bytes(),
                    props.global_memory_bytes,
                ))
            }
        }
    };
    if let Some(chunk) = lwe_chunk_size {
        if chunk > props.max_grid_dim.0 as usize {
            return Err(Error::resource_exceeded(
                Resource::GridDimension,
                chunk,
                props.max_grid_dim.0 as usize,
            ));
        }
    }

    let ks_threads = keyswitch_threads(props);
    let ks_outputs = params.params().output_lwe_dimension.to_lwe_size().0 as u32;
    let keyswitch = KernelGeometry {
        grid_dim: (ks_outputs.div_ceil(ks_threads), batch, 1),
        block_dim: (ks_threads, 1, 1),
        shared_mem_bytes: 0,
        mode: LaunchMode::Regular,
        slots: SlotLayout::NONE,
    };
    let no_slot_kernel = |grid_dim| KernelGeometry {
        grid_dim,
        block_dim: (threads, 1, 1),
        shared_mem_bytes: 0,
        mode: LaunchMode::Regular,
        slots: SlotLayout::NONE,
    };

    let plan = ExecutionPlan {
        selection,
        params: *params,
        threads_per_block: threads,
        shared_memory_mode,
        init: no_slot_kernel((glwe_size, batch, 1)),
        rotation,
        keybundle,
        lwe_chunk_size,
        sample_extraction: no_slot_kernel((batch, 1, 1)),
        keyswitch,
        scatter: no_slot_kernel((batch, 1, 1)),
        buffers,
    };

    debug!(
        pbs_type = ?selection.pbs_type,
        variant = ?selection.variant,
        threads,
        ?shared_memory_mode,
        lwe_chunk_size = ?plan.lwe_chunk_size,
        buffer_bytes = plan.buffers.total_bytes(),
        "planned bootstrap"
    );
    Ok(plan)
}
