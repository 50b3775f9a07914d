use tfhe_gpu_sim::{BlockContext, GpuVec, Kernel};

/// Grid `(batch)`, block `s` copies `source[s]` to `output[output_indexes[s]]`.
pub(crate) struct ScatterKernel {
    pub lwe_size: usize,
    pub source: GpuVec,
    pub output: GpuVec,
    pub output_indexes: GpuVec,
}

impl Kernel for ScatterKernel {
    fn name(&self) -> &'static str {
        "pbs_output_scatter"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let s = ctx.block_idx().0 as usize;
        let destination = self.output_indexes.get(s) as usize;
        let mut ciphertext = vec![0u64; self.lwe_size];
        self.source.load(s * self.lwe_size, &mut ciphertext);
        self.output
            .store(destination * self.lwe_size, &ciphertext);
    }
}
