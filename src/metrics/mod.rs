pub mod collector;
pub mod percentiles;
pub mod reservoir;
pub mod score;
pub mod stream;

pub use collector::{CollectorSnapshot, MetricsCollector, SeriesSnapshot};
pub use percentiles::{PercentileSet, WeightedQuantileEstimator, WeightedValue};
pub use reservoir::SlidingWindowReservoir;
pub use score::{ScoreFunction, XxScore};
