use crate::core_crypto::commons::math::decomposition::SignedDecomposer;
use tfhe_gpu_sim::{BlockContext, GpuVec, Kernel};

/// Key switch of a list of LWE ciphertexts.
///
/// Grid `(ceil((n_out + 1) / threads), count)`, block `(x, s)` computes the output coefficients
/// `x * threads..(x + 1) * threads` of ciphertext `s`:
/// `out[k] = (k == n_out ? b : 0) - sum_i sum_j d_{i,j} * KSK[i][j][k]`.
pub(crate) struct KeyswitchKernel {
    pub decomposer: SignedDecomposer,
    pub input_lwe_dimension: usize,
    pub output_lwe_dimension: usize,
    pub input: GpuVec,
    pub output: GpuVec,
    pub ksk: GpuVec,
}

impl Kernel for KeyswitchKernel {
    fn name(&self) -> &'static str {
        "keyswitch_lwe_ciphertext"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let (chunk, s, _) = ctx.block_idx();
        let (chunk, s) = (chunk as usize, s as usize);
        let threads = ctx.block_dim().0 as usize;
        let input_size = self.input_lwe_dimension + 1;
        let output_size = self.output_lwe_dimension + 1;
        let level_count = self.decomposer.level_count().0;

        let start = chunk * threads;
        let end = ((chunk + 1) * threads).min(output_size);
        if start >= end {
            return;
        }

        let mut out = vec![0u64; end - start];
        if end == output_size {
            // The body coefficient belongs to the last chunk
            out[end - start - 1] = self.input.get(s * input_size + self.input_lwe_dimension);
        }

        let mut mask = vec![0u64; self.input_lwe_dimension];
        self.input.load(s * input_size, &mut mask);
        let mut digits = vec![0u64; level_count];
        let mut key_coefficients = vec![0u64; end - start];
        for (input_key_index, &mask_element) in mask.iter().enumerate() {
            self.decomposer.decompose_into(mask_element, &mut digits);
            for (level_index, &digit) in digits.iter().enumerate() {
                let key_offset = (input_key_index * level_count + level_index) * output_size;
                self.ksk.load(key_offset + start, &mut key_coefficients);
                for (o, &k) in out.iter_mut().zip(key_coefficients.iter()) {
                    *o = o.wrapping_sub(k.wrapping_mul(digit));
                }
            }
        }
        self.output.store(s * output_size + start, &out);
    }
}
