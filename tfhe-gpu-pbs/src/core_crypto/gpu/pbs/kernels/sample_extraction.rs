use super::PbsDims;
use crate::core_crypto::algorithms::glwe_sample_extraction::extract_lwe_sample_mask_polynomial;
use crate::core_crypto::commons::parameters::MonomialDegree;
use tfhe_gpu_sim::{BlockContext, GpuVec, Kernel};

/// Extraction of coefficient 0 of every accumulator.
///
/// Grid `(batch)`, block `s` writes the LWE ciphertext of dimension `k * N` of `s` to
/// `extracted[s]`.
pub(crate) struct SampleExtractionKernel {
    pub dims: PbsDims,
    pub accumulator: GpuVec,
    pub extracted: GpuVec,
}

impl Kernel for SampleExtractionKernel {
    fn name(&self) -> &'static str {
        "pbs_sample_extraction"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let s = ctx.block_idx().0 as usize;
        let dims = &self.dims;
        let n = dims.polynomial_size;
        let glwe_dimension = dims.glwe_size - 1;
        let extracted_size = glwe_dimension * n + 1;
        let out_offset = s * extracted_size;

        let mut glwe_polynomial = vec![0u64; n];
        let mut lwe_polynomial = vec![0u64; n];
        for row in 0..glwe_dimension {
            self.accumulator
                .load(dims.accumulator_offset(s, row), &mut glwe_polynomial);
            extract_lwe_sample_mask_polynomial(
                &glwe_polynomial,
                &mut lwe_polynomial,
                MonomialDegree(0),
            );
            self.extracted.store(out_offset + row * n, &lwe_polynomial);
        }

        let body = self
            .accumulator
            .get(dims.accumulator_offset(s, glwe_dimension));
        self.extracted.set(out_offset + glwe_dimension * n, body);
    }
}
