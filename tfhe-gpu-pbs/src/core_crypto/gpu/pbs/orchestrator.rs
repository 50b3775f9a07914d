//! The bootstrap engine: checks a batch, plans it and enqueues its stages.
//!
//! Per batch, on one stream and in this order: copy of the index arrays, accumulator
//! initialization, blind rotation, sample extraction, key switch and scatter of the results to
//! the output list, closed by a stream event. Results only reach the output through the final
//! scatter and stream errors are sticky, so a batch that fails on the device leaves its output
//! list untouched. The event takes the error of the batch it closes: each batch reports its own
//! failure, and the batches enqueued after it on the same stream still run.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::gpu::entities::{
    GpuBootstrapKey, GpuGlweCiphertextList, GpuLweCiphertextList, GpuLweKeyswitchKey,
};
use crate::core_crypto::gpu::pbs::blind_rotation::enqueue_blind_rotation;
use crate::core_crypto::gpu::pbs::buffer::PbsBuffer;
use crate::core_crypto::gpu::pbs::config::PbsEngineConfig;
use crate::core_crypto::gpu::pbs::kernels::enqueue_kernel;
use crate::core_crypto::gpu::pbs::kernels::scatter::ScatterKernel;
use crate::core_crypto::gpu::pbs::keyswitch::{
    check_keyswitch_dimensions, enqueue_keyswitch, keyswitch_geometry,
};
use crate::core_crypto::gpu::pbs::plan::{plan_pbs, ExecutionPlan};
use crate::core_crypto::gpu::pbs::sample_extraction::enqueue_sample_extraction;
use crate::core_crypto::gpu::pbs::selection::{select_pbs, PbsSelectionHint};
use crate::core_crypto::gpu::pbs::validation::{
    validate_pbs_indexes, validate_pbs_parameters, PbsIndexes, PbsParameters,
};
use crate::core_crypto::gpu::{GpuStreams, GpuTarget};
use crate::error::Error;
use std::sync::Arc;
use tfhe_gpu_sim::{Event, GpuIndex, Stream};
use tracing::{debug, warn};

/// The keys of a bootstrap.
#[derive(Clone, Copy, Debug)]
pub struct PbsKeys<'a> {
    pub bootstrap_key: &'a GpuBootstrapKey,
    pub keyswitch_key: &'a GpuLweKeyswitchKey,
}

impl<'a> PbsKeys<'a> {
    pub fn new(bootstrap_key: &'a GpuBootstrapKey, keyswitch_key: &'a GpuLweKeyswitchKey) -> Self {
        Self {
            bootstrap_key,
            keyswitch_key,
        }
    }
}

/// One batch of ciphertexts to bootstrap.
///
/// Without explicit indexes, ciphertext `i` of the input is bootstrapped with the look-up table
/// 0 into ciphertext `i` of the output.
#[derive(Clone, Copy, Debug)]
pub struct PbsRequest<'a> {
    pub input: &'a GpuLweCiphertextList,
    pub luts: &'a GpuGlweCiphertextList,
    pub keys: PbsKeys<'a>,
    pub indexes: Option<&'a PbsIndexes>,
    pub hint: PbsSelectionHint,
}

impl<'a> PbsRequest<'a> {
    pub fn new(
        input: &'a GpuLweCiphertextList,
        luts: &'a GpuGlweCiphertextList,
        keys: PbsKeys<'a>,
    ) -> Self {
        Self {
            input,
            luts,
            keys,
            indexes: None,
            hint: PbsSelectionHint::default(),
        }
    }

    pub fn with_indexes(self, indexes: &'a PbsIndexes) -> Self {
        Self {
            indexes: Some(indexes),
            ..self
        }
    }

    pub fn with_hint(self, hint: PbsSelectionHint) -> Self {
        Self { hint, ..self }
    }

    pub fn batch_size(&self) -> usize {
        self.indexes.map_or(self.input.lwe_ciphertext_count().0, |indexes| {
            indexes.batch_size()
        })
    }

    /// The parameters of the batch, as read from its entities.
    pub fn parameters(&self, output: &GpuLweCiphertextList) -> PbsParameters {
        let bsk = self.keys.bootstrap_key;
        let ksk = self.keys.keyswitch_key;
        PbsParameters {
            ciphertext_modulus: self.input.ciphertext_modulus(),
            lwe_dimension: self.input.lwe_dimension(),
            glwe_dimension: self.luts.glwe_dimension(),
            polynomial_size: self.luts.polynomial_size(),
            pbs_base_log: bsk.decomp_base_log(),
            pbs_level: bsk.decomp_level_count(),
            ks_base_log: ksk.decomposition_base_log(),
            ks_level: ksk.decomposition_level_count(),
            grouping_factor: bsk.grouping_factor(),
            batch_size: LweCiphertextCount(self.batch_size()),
            bsk_input_lwe_dimension: bsk.input_lwe_dimension(),
            bsk_glwe_dimension: bsk.glwe_dimension(),
            bsk_polynomial_size: bsk.polynomial_size(),
            lut_count: self.luts.glwe_ciphertext_count(),
            input_lwe_count: self.input.lwe_ciphertext_count(),
            output_lwe_count: output.lwe_ciphertext_count(),
            output_lwe_dimension: output.lwe_dimension(),
        }
    }

    fn gpu_indexes(&self) -> [(&'static str, GpuIndex); 4] {
        [
            ("input", self.input.gpu_index()),
            ("luts", self.luts.gpu_index()),
            ("bootstrap_key", self.keys.bootstrap_key.gpu_index()),
            ("keyswitch_key", self.keys.keyswitch_key.gpu_index()),
        ]
    }

    fn ciphertext_moduli(&self) -> [(&'static str, CiphertextModulus); 3] {
        [
            ("luts", self.luts.ciphertext_modulus()),
            ("bootstrap_key", self.keys.bootstrap_key.ciphertext_modulus()),
            ("keyswitch_key", self.keys.keyswitch_key.ciphertext_modulus()),
        ]
    }
}

/// A checked and planned batch, nothing enqueued yet.
struct PreparedBatch {
    plan: ExecutionPlan,
    indexes: PbsIndexes,
}

/// A bootstrap running on a stream.
///
/// The output list stays borrowed until the batch completes. Dropping the handle without
/// calling [`InFlightBootstrap::wait`] blocks until the batch completes, device errors are then
/// only logged.
#[must_use = "dropping an in-flight bootstrap blocks until it completes"]
pub struct InFlightBootstrap<'a> {
    done: Event,
    plan: ExecutionPlan,
    _buffer: PbsBuffer,
    _output: &'a mut GpuLweCiphertextList,
    completed: bool,
}

impl InFlightBootstrap<'_> {
    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Block until the batch completes.
    ///
    /// Only reports the failures of this batch, work enqueued on the stream after it is not
    /// waited for.
    pub fn wait(mut self) -> Result<ExecutionPlan, Error> {
        self.completed = true;
        self.done.synchronize()?;
        Ok(self.plan)
    }
}

impl Drop for InFlightBootstrap<'_> {
    fn drop(&mut self) {
        if !self.completed {
            if let Err(err) = self.done.synchronize() {
                warn!(%err, "bootstrap dropped while in flight failed");
            }
        }
    }
}

/// Programmable bootstrapping on one device.
#[derive(Clone, Debug)]
pub struct PbsEngine {
    target: GpuTarget,
    config: PbsEngineConfig,
}

impl PbsEngine {
    pub fn new(target: &GpuTarget, config: PbsEngineConfig) -> Self {
        Self {
            target: target.clone(),
            config,
        }
    }

    pub fn target(&self) -> &GpuTarget {
        &self.target
    }

    pub fn config(&self) -> &PbsEngineConfig {
        &self.config
    }

    fn check_gpu_index(&self, what: &'static str, gpu_index: GpuIndex) -> Result<(), Error> {
        let expected = self.target.gpu_index();
        if gpu_index != expected {
            return Err(Error::invalid_parameters(
                what,
                format!(
                    "lives on GPU {} but the engine runs on GPU {}",
                    gpu_index.0, expected.0
                ),
            ));
        }
        Ok(())
    }

    /// Validate, select and plan a batch, and check its key switch dimensions.
    fn prepare(
        &self,
        request: &PbsRequest<'_>,
        output: &GpuLweCiphertextList,
    ) -> Result<PreparedBatch, Error> {
        let params = validate_pbs_parameters(&request.parameters(output), &self.config.limits)?;
        for (what, modulus) in request.ciphertext_moduli() {
            if modulus != request.input.ciphertext_modulus() {
                return Err(Error::invalid_parameters(
                    what,
                    "ciphertext modulus differs from the input ciphertexts'",
                ));
            }
        }

        let indexes = request
            .indexes
            .cloned()
            .unwrap_or_else(|| PbsIndexes::identity(params.batch_size()));
        validate_pbs_indexes(&indexes, &params)?;

        let props = self.target.properties();
        let selection = select_pbs(&params, props, request.hint, &self.config.thresholds)?;
        let plan = plan_pbs(selection, &params, props, &self.config.planner)?;

        check_keyswitch_dimensions(
            request.keys.keyswitch_key,
            params.extracted_lwe_dimension(),
            output.lwe_dimension(),
        )?;
        for (what, gpu_index) in request.gpu_indexes() {
            self.check_gpu_index(what, gpu_index)?;
        }
        self.check_gpu_index("output", output.gpu_index())?;

        debug!(
            pbs_type = ?plan.selection.pbs_type,
            variant = ?plan.selection.variant,
            batch_size = params.batch_size(),
            "prepared bootstrap batch"
        );
        Ok(PreparedBatch { plan, indexes })
    }

    /// The execution plan a batch would run with, without running it.
    pub fn plan(
        &self,
        request: &PbsRequest<'_>,
        output: &GpuLweCiphertextList,
    ) -> Result<ExecutionPlan, Error> {
        self.prepare(request, output).map(|prepared| prepared.plan)
    }

    fn enqueue(
        stream: &Stream,
        prepared: &PreparedBatch,
        buffer: &PbsBuffer,
        request: &PbsRequest<'_>,
        output: &GpuLweCiphertextList,
    ) -> Event {
        let plan = &prepared.plan;
        let as_words =
            |indexes: &[usize]| -> Vec<u64> { indexes.iter().map(|&i| i as u64).collect() };
        stream.copy_to_gpu_async(
            &buffer.input_indexes,
            0,
            &as_words(&prepared.indexes.input_indexes),
        );
        stream.copy_to_gpu_async(
            &buffer.output_indexes,
            0,
            &as_words(&prepared.indexes.output_indexes),
        );
        stream.copy_to_gpu_async(
            &buffer.lut_indexes,
            0,
            &as_words(&prepared.indexes.lut_indexes),
        );

        enqueue_blind_rotation(
            stream,
            plan,
            buffer,
            request.input,
            request.luts,
            request.keys.bootstrap_key,
        );
        enqueue_sample_extraction(stream, plan, buffer);
        enqueue_keyswitch(
            stream,
            &plan.keyswitch,
            request.keys.keyswitch_key,
            &buffer.extracted,
            &buffer.keyswitched,
        );

        let scatter = ScatterKernel {
            lwe_size: output.lwe_size().0,
            source: buffer.keyswitched.clone(),
            output: output.d_vec.clone(),
            output_indexes: buffer.output_indexes.clone(),
        };
        enqueue_kernel(stream, &plan.scatter, Arc::new(scatter));
        stream.record_event()
    }

    /// Bootstrap a batch on the main stream of `streams` and wait for the result.
    ///
    /// Returns the plan the batch ran with. On error nothing was written to `output`.
    pub fn programmable_bootstrap(
        &self,
        streams: &GpuStreams,
        request: &PbsRequest<'_>,
        output: &mut GpuLweCiphertextList,
    ) -> Result<ExecutionPlan, Error> {
        self.programmable_bootstrap_async(streams.main_stream(), request, output)?
            .wait()
    }

    /// Bootstrap a batch in the caller's pre-provisioned `buffer`.
    pub fn programmable_bootstrap_with_buffer(
        &self,
        streams: &GpuStreams,
        request: &PbsRequest<'_>,
        output: &mut GpuLweCiphertextList,
        buffer: &mut PbsBuffer,
    ) -> Result<ExecutionPlan, Error> {
        let prepared = self.prepare(request, output)?;
        buffer.check_fits(&prepared.plan, self.target.gpu_index())?;
        Self::enqueue(streams.main_stream(), &prepared, buffer, request, output).synchronize()?;
        Ok(prepared.plan)
    }

    /// Enqueue a batch on `stream` and return without waiting.
    ///
    /// Every check runs before anything is enqueued, an error returned here leaves the stream
    /// and `output` untouched.
    pub fn programmable_bootstrap_async<'a>(
        &self,
        stream: &Stream,
        request: &PbsRequest<'_>,
        output: &'a mut GpuLweCiphertextList,
    ) -> Result<InFlightBootstrap<'a>, Error> {
        let prepared = self.prepare(request, output)?;
        let buffer = PbsBuffer::new(&prepared.plan, &self.target)?;
        let done = Self::enqueue(stream, &prepared, &buffer, request, output);
        Ok(InFlightBootstrap {
            done,
            plan: prepared.plan,
            _buffer: buffer,
            _output: output,
            completed: false,
        })
    }

    /// Bootstrap independent batches, spread round-robin over the streams of `streams`, batch
    /// `i` writing to `outputs[i]`.
    ///
    /// Every batch is checked and gets its buffers before the first one is enqueued. All the
    /// batches are waited for, the first failure is returned and the outputs of the batches that
    /// failed are untouched.
    pub fn programmable_bootstrap_batches(
        &self,
        streams: &GpuStreams,
        requests: &[PbsRequest<'_>],
        outputs: &mut [GpuLweCiphertextList],
    ) -> Result<Vec<ExecutionPlan>, Error> {
        if requests.len() != outputs.len() {
            return Err(Error::invalid_parameters(
                "outputs",
                format!(
                    "{} output lists for {} batches",
                    outputs.len(),
                    requests.len()
                ),
            ));
        }

        let prepared = requests
            .iter()
            .zip(outputs.iter())
            .map(|(request, output)| {
                let prepared = self.prepare(request, output)?;
                let buffer = PbsBuffer::new(&prepared.plan, &self.target)?;
                Ok((prepared, buffer))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let done: Vec<Event> = prepared
            .iter()
            .zip(requests.iter().zip(outputs.iter()))
            .enumerate()
            .map(|(batch, ((prepared, buffer), (request, output)))| {
                let stream = streams.stream(batch % streams.len());
                Self::enqueue(stream, prepared, buffer, request, output)
            })
            .collect();
        let outcomes: Vec<Result<(), _>> = done.iter().map(Event::synchronize).collect();
        outcomes.into_iter().collect::<Result<Vec<()>, _>>()?;

        Ok(prepared.into_iter().map(|(prepared, _)| prepared.plan).collect())
    }

    /// Key switch every ciphertext of `input` into the ciphertext of same position in `output`.
    pub fn keyswitch(
        &self,
        streams: &GpuStreams,
        input: &GpuLweCiphertextList,
        output: &mut GpuLweCiphertextList,
        keyswitch_key: &GpuLweKeyswitchKey,
    ) -> Result<(), Error> {
        check_keyswitch_dimensions(keyswitch_key, input.lwe_dimension(), output.lwe_dimension())?;
        if output.lwe_ciphertext_count().0 < input.lwe_ciphertext_count().0 {
            return Err(Error::invalid_parameters(
                "output_lwe_count",
                format!(
                    "{} output ciphertexts cannot hold {} inputs",
                    output.lwe_ciphertext_count().0,
                    input.lwe_ciphertext_count().0
                ),
            ));
        }
        self.check_gpu_index("input", input.gpu_index())?;
        self.check_gpu_index("output", output.gpu_index())?;
        self.check_gpu_index("keyswitch_key", keyswitch_key.gpu_index())?;
        let geometry = keyswitch_geometry(
            output.lwe_dimension(),
            input.lwe_ciphertext_count(),
            self.target.properties(),
        )?;
        if input.lwe_ciphertext_count().0 == 0 {
            return Ok(());
        }

        let stream = streams.main_stream();
        enqueue_keyswitch(stream, &geometry, keyswitch_key, &input.d_vec, &output.d_vec);
        stream.synchronize()?;
        Ok(())
    }
}
