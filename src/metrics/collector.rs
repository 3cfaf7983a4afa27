use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use super::percentiles::PercentileSet;
use super::reservoir::SlidingWindowReservoir;
use crate::config::WindowConfig;
use crate::error::{Result, SamplingError};

// ─── Configuration ───────────────────────────────────────────────

/// Lifetime histogram range: 1 → 1e12, 3 significant figures.
/// Observations outside the range are clamped into it.
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 1_000_000_000_000;
const HIST_SIGFIG: u8 = 3;

// ─── Public types ────────────────────────────────────────────────

/// Named series of observations, each summarized by a sliding-window
/// reservoir plus lifetime totals.
/// Producers call `record()`, reporters call `snapshot()`.
pub struct MetricsCollector {
    window: WindowConfig,
    series: RwLock<HashMap<String, Arc<Series>>>,
}

/// Point-in-time view of one series.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSnapshot {
    pub name: String,
    pub count: u64,
    pub lifetime_min: u64,
    pub lifetime_max: u64,
    pub lifetime_mean: f64,
    /// Percentiles over the reservoir's current window.
    pub window: PercentileSet,
}

/// Every series, sorted by name.
#[derive(Debug, Clone, Serialize)]
pub struct CollectorSnapshot {
    pub taken_at: DateTime<Utc>,
    pub series: Vec<SeriesSnapshot>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Series {
    reservoir: SlidingWindowReservoir,
    lifetime: Mutex<Lifetime>,
}

struct Lifetime {
    count: u64,
    hist: Histogram<u64>,
}

impl Series {
    fn new(window: &WindowConfig) -> Result<Self> {
        let hist = Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
            .map_err(|e| SamplingError::InvalidConfig(format!("histogram creation: {e}")))?;
        Ok(Self {
            reservoir: SlidingWindowReservoir::new(window.size, window.duration())?,
            lifetime: Mutex::new(Lifetime { count: 0, hist }),
        })
    }

    fn snapshot(&self, name: &str) -> SeriesSnapshot {
        // Reservoir copy first, estimator work after its lock is gone.
        let window = PercentileSet::from_estimator(&self.reservoir.make_snapshot());

        let lifetime = self.lifetime.lock();
        let (lifetime_min, lifetime_max, lifetime_mean) = if lifetime.count == 0 {
            (0, 0, 0.0)
        } else {
            (lifetime.hist.min(), lifetime.hist.max(), lifetime.hist.mean())
        };

        SeriesSnapshot {
            name: name.to_owned(),
            count: lifetime.count,
            lifetime_min,
            lifetime_max,
            lifetime_mean,
            window,
        }
    }
}

// ─── MetricsCollector impl ───────────────────────────────────────

impl MetricsCollector {
    pub fn new(window: WindowConfig) -> Result<Self> {
        window.validate()?;
        Ok(Self {
            window,
            series: RwLock::new(HashMap::new()),
        })
    }

    /// Record one observation for `name`, creating the series on first use.
    pub fn record(&self, name: &str, value: i64) -> Result<()> {
        let series = self.series_for(name)?;
        series.reservoir.update(value);

        let mut lifetime = series.lifetime.lock();
        lifetime.count += 1;
        // Lifetime stats cover [HIST_LOW, HIST_HIGH] only.
        let clamped = value.clamp(HIST_LOW as i64, HIST_HIGH as i64) as u64;
        lifetime.hist.saturating_record(clamped);
        Ok(())
    }

    /// Wipe all series.
    pub fn reset(&self) {
        self.series.write().clear();
        tracing::debug!("metrics collector reset");
    }

    /// Produce a read-only snapshot of every series.
    pub fn snapshot(&self) -> CollectorSnapshot {
        let mut entries: Vec<(String, Arc<Series>)> = self
            .series
            .read()
            .iter()
            .map(|(name, s)| (name.clone(), s.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        CollectorSnapshot {
            taken_at: Utc::now(),
            series: entries.iter().map(|(name, s)| s.snapshot(name)).collect(),
        }
    }

    fn series_for(&self, name: &str) -> Result<Arc<Series>> {
        if let Some(s) = self.series.read().get(name) {
            return Ok(s.clone());
        }

        let mut map = self.series.write();
        // Another producer may have won the race for the write lock.
        if let Some(s) = map.get(name) {
            return Ok(s.clone());
        }
        let s = Arc::new(Series::new(&self.window)?);
        map.insert(name.to_owned(), s.clone());
        tracing::debug!(series = name, "new series");
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> MetricsCollector {
        MetricsCollector::new(WindowConfig {
            size: 16,
            duration_secs: 60,
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_window() {
        let res = MetricsCollector::new(WindowConfig {
            size: 0,
            duration_secs: 60,
        });
        assert!(res.is_err());
    }

    #[test]
    fn series_are_created_lazily_and_sorted() {
        let c = collector();
        assert!(c.snapshot().series.is_empty());

        c.record("write", 40).unwrap();
        c.record("read", 10).unwrap();
        c.record("read", 30).unwrap();

        let snap = c.snapshot();
        let names: Vec<_> = snap.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["read", "write"]);

        let read = &snap.series[0];
        assert_eq!(read.count, 2);
        assert_eq!(read.lifetime_min, 10);
        assert_eq!(read.lifetime_max, 30);
        // Both land in one slice, so only one survives in the window.
        assert_eq!(read.window.weight, 1.0);
        assert!(read.window.p50 == 10.0 || read.window.p50 == 30.0);
    }

    #[test]
    fn lifetime_stats_clamp_into_histogram_range() {
        let c = collector();
        c.record("skew", -5).unwrap();
        c.record("skew", 2_000_000_000_000).unwrap();

        let snap = c.snapshot();
        let s = &snap.series[0];
        assert_eq!(s.count, 2);
        assert_eq!(s.lifetime_min, 1);
        // 3 significant figures around the upper bound.
        assert!(s.lifetime_max >= 999_000_000_000);
        assert!(s.lifetime_max <= 1_001_000_000_000);
    }

    #[test]
    fn reset_drops_everything() {
        let c = collector();
        c.record("read", 1).unwrap();
        c.reset();
        assert!(c.snapshot().series.is_empty());
    }

    #[test]
    fn snapshot_serializes() {
        let c = collector();
        c.record("read", 5).unwrap();
        let json = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(json["series"][0]["name"], "read");
        assert_eq!(json["series"][0]["window"]["p99"], 5.0);
        assert!(json["taken_at"].is_string());
    }
}
