//! Error type shared by the reservoir, the estimator and config loading.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, SamplingError>;

#[derive(Debug, Error)]
pub enum SamplingError {
    /// Reservoir or sampler configuration that can never work.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Quantile query outside `[0, 1]`.
    #[error("quantile {0} is not in [0..1]")]
    InvalidQuantile(f64),
    /// Config file could not be read or parsed.
    #[error("config load failed: {0}")]
    ConfigLoad(String),
}
