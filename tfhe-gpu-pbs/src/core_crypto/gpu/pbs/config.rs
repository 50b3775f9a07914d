//! Engine configuration.
//!
//! The configuration can be built in code or loaded from a TOML file:
//!
//! ```toml
//! [thresholds]
//! tbc_min_polynomial_size = 1024
//! cg_min_batch_size = 8
//!
//! [limits]
//! max_batch_size = 4096
//!
//! [planner]
//! max_lwe_chunk_size = 8
//! ```
//!
//! The `limits` and `planner` tables are optional, the selector thresholds are not.

use crate::core_crypto::commons::parameters::PolynomialSize;
use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

/// Thresholds driving the automatic choice of the execution variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorThresholds {
    /// Thread block clusters are picked from this polynomial size on, when supported.
    pub tbc_min_polynomial_size: PolynomialSize,
    /// Cooperative launches are picked from this batch size on, when supported.
    pub cg_min_batch_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub max_batch_size: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        // Batches index the y and z dimensions of grids
        Self {
            max_batch_size: 65535,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Largest number of multi bit groups whose keybundles are computed by one launch.
    pub max_lwe_chunk_size: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_lwe_chunk_size: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PbsEngineConfig {
    pub thresholds: SelectorThresholds,
    #[serde(default)]
    pub limits: ValidationLimits,
    #[serde(default)]
    pub planner: PlannerConfig,
}

impl PbsEngineConfig {
    /// Default limits and planner settings with the given selector thresholds.
    pub fn new(thresholds: SelectorThresholds) -> Self {
        Self {
            thresholds,
            limits: ValidationLimits::default(),
            planner: PlannerConfig::default(),
        }
    }

    /// Provide Serde mechanisms from TOML file
    pub fn from_toml(file: &str) -> Result<Self, Error> {
        let content = std::fs::read_to_string(file)
            .map_err(|err| Error::from(ErrorKind::Config(format!("`{file}`: {err}"))))?;
        Self::from_toml_str(&content)
            .map_err(|err| Error::from(ErrorKind::Config(format!("`{file}`: {err}"))))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|err| Error::from(ErrorKind::Config(err.to_string())))
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string(self).map_err(|err| Error::from(ErrorKind::Config(err.to_string())))
    }
}
