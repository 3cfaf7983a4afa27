//! Sampler configuration (strict YAML parsing).

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SamplingError};

/// Default retained samples per reservoir.
const DEFAULT_WINDOW_SIZE: usize = 1028;
/// Default window span in seconds.
const DEFAULT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub load: LoadConfig,
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        self.load.validate()?;
        Ok(())
    }
}

/// Shape of every reservoir the collector creates.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(default = "default_window_size")]
    pub size: usize,

    #[serde(default = "default_window_secs")]
    pub duration_secs: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: default_window_size(),
            duration_secs: default_window_secs(),
        }
    }
}

impl WindowConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(SamplingError::InvalidConfig(
                "window.size must be greater than 0".into(),
            ));
        }
        if self.duration_secs == 0 {
            return Err(SamplingError::InvalidConfig(
                "window.duration_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Synthetic producer settings for the demo binary.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadConfig {
    #[serde(default = "default_producers")]
    pub producers: u32,

    #[serde(default = "default_load_secs")]
    pub duration_secs: u64,

    /// Observations each producer fires back-to-back per burst.
    #[serde(default = "default_burst_len")]
    pub burst_len: u32,

    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            producers: default_producers(),
            duration_secs: default_load_secs(),
            burst_len: default_burst_len(),
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

impl LoadConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1024).contains(&self.producers) {
            return Err(SamplingError::InvalidConfig(
                "load.producers must be between 1 and 1024".into(),
            ));
        }
        if self.burst_len == 0 {
            return Err(SamplingError::InvalidConfig(
                "load.burst_len must be greater than 0".into(),
            ));
        }
        if self.report_interval_ms < 10 {
            return Err(SamplingError::InvalidConfig(
                "load.report_interval_ms must be at least 10".into(),
            ));
        }
        Ok(())
    }
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}
fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}
fn default_producers() -> u32 {
    8
}
fn default_load_secs() -> u64 {
    10
}
fn default_burst_len() -> u32 {
    64
}
fn default_report_interval_ms() -> u64 {
    1000
}

pub fn load_from_file(path: &str) -> Result<SamplerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SamplingError::ConfigLoad(format!("read {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<SamplerConfig> {
    let cfg: SamplerConfig = serde_yaml::from_str(s)
        .map_err(|e| SamplingError::ConfigLoad(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = load_from_str("{}").unwrap();
        assert_eq!(cfg.window.size, 1028);
        assert_eq!(cfg.window.duration(), Duration::from_secs(60));
        assert_eq!(cfg.load.producers, 8);
    }

    #[test]
    fn partial_sections_are_filled_in() {
        let cfg = load_from_str("window:\n  size: 16\nload:\n  burst_len: 3\n").unwrap();
        assert_eq!(cfg.window.size, 16);
        assert_eq!(cfg.window.duration_secs, 60);
        assert_eq!(cfg.load.burst_len, 3);
    }

    #[test]
    fn zero_window_size_is_rejected() {
        let err = load_from_str("window:\n  size: 0\n").unwrap_err();
        assert!(matches!(err, SamplingError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_from_str("window:\n  slices: 4\n").unwrap_err();
        assert!(matches!(err, SamplingError::ConfigLoad(_)));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_from_file("/nonexistent/sampler.yaml").unwrap_err();
        assert!(matches!(err, SamplingError::ConfigLoad(_)));
    }
}
