//!
//! Print the bootstrap variant and the launch plan the engine would use for a set of parameters
//! on a given device, without running anything.

use clap::Parser;
use tfhe_gpu_pbs::core_crypto::gpu::pbs::{
    plan_pbs, select_pbs, validate_pbs_parameters, PbsEngineConfig, PbsParameters,
    PbsSelectionHint, PbsType, PbsVariant, SelectorThresholds,
};
use tfhe_gpu_pbs::core_crypto::prelude::*;
use tfhe_gpu_sim::DeviceProperties;
use tracing::info;

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum DevicePreset {
    H100,
    A100,
    T4,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum TypeArg {
    Classical,
    MultiBit,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum VariantArg {
    Default,
    Cg,
    Tbc,
}

/// Define CLI arguments
#[derive(clap::Parser, Debug, Clone)]
#[clap(long_about = "Show the PBS variant selection and launch plan for a parameter set")]
pub struct Args {
    // Device ------------------------------------------------------------
    /// Device preset
    #[clap(long, value_enum, default_value = "h100")]
    device: DevicePreset,

    /// Device description file, overrides the preset
    #[clap(long, value_parser)]
    device_file: Option<String>,

    /// Engine configuration file (selector thresholds, limits, planner)
    #[clap(long, value_parser)]
    config: Option<String>,

    // Parameters ---------------------------------------------------------
    #[clap(long, value_parser, default_value_t = 742)]
    lwe_dimension: usize,

    #[clap(long, value_parser, default_value_t = 1)]
    glwe_dimension: usize,

    #[clap(long, value_parser, default_value_t = 2048)]
    polynomial_size: usize,

    #[clap(long, value_parser, default_value_t = 23)]
    pbs_base_log: usize,

    #[clap(long, value_parser, default_value_t = 1)]
    pbs_level: usize,

    #[clap(long, value_parser, default_value_t = 3)]
    ks_base_log: usize,

    #[clap(long, value_parser, default_value_t = 5)]
    ks_level: usize,

    /// Grouping factor of a multi bit key, classical key when absent
    #[clap(long, value_parser)]
    grouping_factor: Option<usize>,

    #[clap(long, value_parser, default_value_t = 1)]
    batch_size: usize,

    #[clap(long, value_parser, default_value_t = 1)]
    lut_count: usize,

    // Hint ---------------------------------------------------------------
    /// Requested bootstrap type
    #[clap(long, value_enum)]
    pbs_type: Option<TypeArg>,

    /// Requested variant
    #[clap(long, value_enum)]
    variant: Option<VariantArg>,
}

impl Args {
    fn device_properties(&self) -> anyhow::Result<DeviceProperties> {
        if let Some(file) = self.device_file.as_ref() {
            let content = std::fs::read_to_string(file)?;
            return Ok(DeviceProperties::from_toml_str(&content)?);
        }
        Ok(match self.device {
            DevicePreset::H100 => DeviceProperties::h100(),
            DevicePreset::A100 => DeviceProperties::a100(),
            DevicePreset::T4 => DeviceProperties::t4(),
        })
    }

    fn engine_config(&self) -> anyhow::Result<PbsEngineConfig> {
        match self.config.as_ref() {
            Some(file) => Ok(PbsEngineConfig::from_toml(file)?),
            None => Ok(PbsEngineConfig::new(SelectorThresholds {
                tbc_min_polynomial_size: PolynomialSize(1024),
                cg_min_batch_size: 8,
            })),
        }
    }

    fn parameters(&self) -> PbsParameters {
        let lwe_dimension = LweDimension(self.lwe_dimension);
        let glwe_dimension = GlweDimension(self.glwe_dimension);
        let polynomial_size = PolynomialSize(self.polynomial_size);
        let batch_size = LweCiphertextCount(self.batch_size);
        PbsParameters {
            ciphertext_modulus: CiphertextModulus::new_native(),
            lwe_dimension,
            glwe_dimension,
            polynomial_size,
            pbs_base_log: DecompositionBaseLog(self.pbs_base_log),
            pbs_level: DecompositionLevelCount(self.pbs_level),
            ks_base_log: DecompositionBaseLog(self.ks_base_log),
            ks_level: DecompositionLevelCount(self.ks_level),
            grouping_factor: self.grouping_factor.map(LweBskGroupingFactor),
            batch_size,
            bsk_input_lwe_dimension: lwe_dimension,
            bsk_glwe_dimension: glwe_dimension,
            bsk_polynomial_size: polynomial_size,
            lut_count: GlweCiphertextCount(self.lut_count),
            input_lwe_count: batch_size,
            output_lwe_count: batch_size,
            output_lwe_dimension: lwe_dimension,
        }
    }

    fn hint(&self) -> PbsSelectionHint {
        PbsSelectionHint {
            pbs_type: self.pbs_type.map(|pbs_type| match pbs_type {
                TypeArg::Classical => PbsType::Classical,
                TypeArg::MultiBit => PbsType::MultiBit,
            }),
            variant: self.variant.map(|variant| match variant {
                VariantArg::Default => PbsVariant::Default,
                VariantArg::Cg => PbsVariant::Cg,
                VariantArg::Tbc => PbsVariant::Tbc,
            }),
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    // Register tracing subscriber that use env-filter
    // Select verbosity with env_var: e.g. `RUST_LOG=tfhe_gpu_pbs=debug`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .init();

    let props = args.device_properties()?;
    let config = args.engine_config()?;
    info!(device = %props.name, ?config, "planning bootstrap");

    let params = validate_pbs_parameters(&args.parameters(), &config.limits)?;
    let selection = select_pbs(&params, &props, args.hint(), &config.thresholds)?;
    info!(pbs_type = ?selection.pbs_type, variant = ?selection.variant, "selected");

    let plan = plan_pbs(selection, &params, &props, &config.planner)?;
    println!("{plan:#?}");
    println!(
        "device buffers: {} bytes per batch",
        plan.buffers.total_bytes()
    );
    Ok(())
}
