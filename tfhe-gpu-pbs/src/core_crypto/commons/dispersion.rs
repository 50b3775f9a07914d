//! Noise distribution parameters.
//!
//! The noise is specified by the standard deviation of a gaussian distribution over the torus,
//! usually of the form $\sigma = 2^p$ with $p$ a negative number. Depending on the use case the
//! same quantity is handled as:
//!
//! + $\sigma$ in the [`StandardDev`] type,
//! + $p$ in the [`LogStandardDev`] type,
//! + $\sigma^2$ in the [`Variance`] type.
//!
//! All of them implement [`DispersionParameter`] so noise can be defined generically.

use serde::{Deserialize, Serialize};

/// A trait for types representing distribution parameters.
pub trait DispersionParameter: Copy {
    /// Return the standard deviation of the distribution, i.e. $\sigma = 2^p$.
    fn get_standard_dev(&self) -> StandardDev;
    /// Return the variance of the distribution, i.e. $\sigma^2 = 2^{2p}$.
    fn get_variance(&self) -> Variance;
    /// Return base 2 logarithm of the standard deviation of the distribution, i.e.
    /// $\log\_2(\sigma)=p$
    fn get_log_standard_dev(&self) -> LogStandardDev;
    /// For an integer representing $\mathbb{Z}/2^q\mathbb{Z}$, return $2^{q+p}$.
    fn get_modular_standard_dev(&self, modulus: f64) -> f64 {
        self.get_standard_dev().0 * modulus
    }
}

/// A distribution parameter that uses the base-2 logarithm of the standard deviation as
/// representation.
///
/// # Example:
///
/// ```rust
/// use tfhe_gpu_pbs::core_crypto::commons::dispersion::{DispersionParameter, LogStandardDev};
/// let params = LogStandardDev::from_log_standard_dev(-25.);
/// assert_eq!(params.get_standard_dev().0, 2_f64.powf(-25.));
/// assert_eq!(params.get_variance().0, 2_f64.powf(-50.));
/// assert_eq!(params.get_modular_standard_dev(2_f64.powi(32)), 2_f64.powf(7.));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct LogStandardDev(pub f64);

impl LogStandardDev {
    pub fn from_log_standard_dev(log_std: f64) -> Self {
        Self(log_std)
    }

    pub fn from_modular_log_standard_dev(log_std: f64, log2_modulus: u32) -> Self {
        Self(log_std - log2_modulus as f64)
    }
}

impl DispersionParameter for LogStandardDev {
    fn get_standard_dev(&self) -> StandardDev {
        StandardDev(f64::powf(2., self.0))
    }
    fn get_variance(&self) -> Variance {
        Variance(f64::powf(2., self.0 * 2.))
    }
    fn get_log_standard_dev(&self) -> Self {
        Self(self.0)
    }
}

/// A distribution parameter that uses the standard deviation as representation.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct StandardDev(pub f64);

impl StandardDev {
    pub fn from_standard_dev(std: f64) -> Self {
        Self(std)
    }

    pub fn from_modular_standard_dev(std: f64, log2_modulus: u32) -> Self {
        Self(std / 2_f64.powf(log2_modulus as f64))
    }
}

impl DispersionParameter for StandardDev {
    fn get_standard_dev(&self) -> Self {
        Self(self.0)
    }
    fn get_variance(&self) -> Variance {
        Variance(self.0.powi(2))
    }
    fn get_log_standard_dev(&self) -> LogStandardDev {
        LogStandardDev(self.0.log2())
    }
}

/// A distribution parameter that uses the variance as representation.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Variance(pub f64);

impl Variance {
    pub fn from_variance(var: f64) -> Self {
        Self(var)
    }
}

impl DispersionParameter for Variance {
    fn get_standard_dev(&self) -> StandardDev {
        StandardDev(self.0.sqrt())
    }
    fn get_variance(&self) -> Self {
        Self(self.0)
    }
    fn get_log_standard_dev(&self) -> LogStandardDev {
        LogStandardDev(self.0.sqrt().log2())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn representations_agree() {
        let std = StandardDev::from_standard_dev(2_f64.powi(-20));
        assert_eq!(std.get_log_standard_dev(), LogStandardDev(-20.));
        assert_eq!(std.get_variance(), Variance(2_f64.powi(-40)));
        assert_eq!(Variance(2_f64.powi(-40)).get_standard_dev(), std);
        assert_eq!(
            StandardDev::from_modular_standard_dev(2_f64.powi(12), 32),
            std
        );
        assert_eq!(
            LogStandardDev::from_modular_log_standard_dev(12., 32),
            LogStandardDev(-20.)
        );
    }
}
