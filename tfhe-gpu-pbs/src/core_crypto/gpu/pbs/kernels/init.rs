use super::PbsDims;
use crate::core_crypto::algorithms::lwe_programmable_bootstrapping::pbs_modulus_switch;
use crate::core_crypto::algorithms::polynomial_algorithms::polynomial_wrapping_monic_monomial_div_assign;
use crate::core_crypto::commons::parameters::{MonomialDegree, PolynomialSize};
use tfhe_gpu_sim::{BlockContext, GpuVec, Kernel};

/// `acc[s] = LUT[lut_indexes[s]] / X^b~` where `b~` is the switched body of the input of `s`.
///
/// Grid `(glwe_size, batch)`, block `(r, s)` writes row `r` of the accumulator of `s`.
pub(crate) struct InitAccumulatorKernel {
    pub dims: PbsDims,
    pub input: GpuVec,
    pub input_indexes: GpuVec,
    pub luts: GpuVec,
    pub lut_indexes: GpuVec,
    pub accumulator: GpuVec,
}

impl Kernel for InitAccumulatorKernel {
    fn name(&self) -> &'static str {
        "pbs_init_accumulator"
    }

    fn run_block(&self, ctx: &BlockContext<'_>) {
        let (row, s, _) = ctx.block_idx();
        let (row, s) = (row as usize, s as usize);
        let dims = &self.dims;

        let input_index = self.input_indexes.get(s) as usize;
        let body = self
            .input
            .get(input_index * dims.lwe_size() + dims.lwe_dimension);
        let degree = pbs_modulus_switch(body, PolynomialSize(dims.polynomial_size));

        let lut_index = self.lut_indexes.get(s) as usize;
        let mut polynomial = vec![0u64; dims.polynomial_size];
        self.luts.load(
            lut_index * dims.glwe_words() + row * dims.polynomial_size,
            &mut polynomial,
        );
        polynomial_wrapping_monic_monomial_div_assign(&mut polynomial, MonomialDegree(degree));
        self.accumulator
            .store(dims.accumulator_offset(s, row), &polynomial);
    }
}
