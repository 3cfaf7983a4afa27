//! Windowed latency sampling.
//!
//! - [`metrics::SlidingWindowReservoir`]: bounded, time-windowed sample with
//!   one uniformly chosen survivor per time slice, safe under bursty writers
//! - [`metrics::WeightedQuantileEstimator`]: interpolated quantiles over a
//!   weighted value set, usually a reservoir snapshot
//! - [`metrics::MetricsCollector`]: named series on top of both

pub mod config;
pub mod error;
pub mod load_generator;
pub mod metrics;

pub use error::{Result, SamplingError};
pub use metrics::{PercentileSet, SlidingWindowReservoir, WeightedQuantileEstimator, WeightedValue};
