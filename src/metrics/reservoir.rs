use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::percentiles::WeightedQuantileEstimator;
use super::score::{ScoreFunction, XxScore};
use crate::error::{Result, SamplingError};

/// Bounded sample of the most recent `window_duration` of observations.
///
/// The window is cut into `window_size` slices of `window_duration /
/// window_size` each, and at most one observation survives per slice.
/// When several observations land in the same slice, the one with the
/// highest [`ScoreFunction`] score under that slice's random seed wins,
/// which is a uniform draw among them regardless of how many arrived or
/// in which order.
///
/// Observations arrive as `i64` and are kept as `f64`, so values beyond
/// ±2^53 lose precision.
pub struct SlidingWindowReservoir<S = XxScore> {
    window_size: usize,
    window_duration: Duration,
    time_slice: Duration,
    score: S,
    inner: Mutex<Inner>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner {
    // (value, slice anchor), non-decreasing by anchor
    samples: VecDeque<(f64, Instant)>,
    slice_randomizer: u32,
    // 0 = no winner yet in this slice
    winning_score: u64,
    rng: StdRng,
}

impl SlidingWindowReservoir<XxScore> {
    pub fn new(window_size: usize, window_duration: Duration) -> Result<Self> {
        Self::build(window_size, window_duration, XxScore, StdRng::from_entropy())
    }

    /// Fixed randomizer seed: the same update sequence retains the same values.
    pub fn with_seed(window_size: usize, window_duration: Duration, seed: u64) -> Result<Self> {
        Self::build(window_size, window_duration, XxScore, StdRng::seed_from_u64(seed))
    }
}

impl<S: ScoreFunction> SlidingWindowReservoir<S> {
    pub fn with_score_function(
        window_size: usize,
        window_duration: Duration,
        score: S,
        seed: u64,
    ) -> Result<Self> {
        Self::build(window_size, window_duration, score, StdRng::seed_from_u64(seed))
    }

    fn build(window_size: usize, window_duration: Duration, score: S, mut rng: StdRng) -> Result<Self> {
        if window_size == 0 {
            return Err(SamplingError::InvalidConfig(
                "window size must be greater than 0".into(),
            ));
        }
        let slice_nanos = window_duration.as_nanos() / window_size as u128;
        if slice_nanos == 0 {
            return Err(SamplingError::InvalidConfig(format!(
                "window of {window_duration:?} cannot be split into {window_size} slices"
            )));
        }
        let slice_nanos = u64::try_from(slice_nanos).map_err(|_| {
            SamplingError::InvalidConfig(format!(
                "window of {window_duration:?} over {window_size} slices exceeds the maximum slice length"
            ))
        })?;
        let time_slice = Duration::from_nanos(slice_nanos);

        tracing::debug!(window_size, ?window_duration, ?time_slice, "sliding window reservoir created");

        let slice_randomizer = rng.gen();
        Ok(Self {
            window_size,
            window_duration,
            time_slice,
            score,
            inner: Mutex::new(Inner {
                samples: VecDeque::with_capacity(window_size + 1),
                slice_randomizer,
                winning_score: 0,
                rng,
            }),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }

    pub fn time_slice(&self) -> Duration {
        self.time_slice
    }

    /// Record an observation taken now.
    pub fn update(&self, value: i64) {
        self.update_at(value, Instant::now());
    }

    /// Record an observation with an explicit timestamp.
    pub fn update_at(&self, value: i64, timestamp: Instant) {
        let value = value as f64;
        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        // ── Stragglers more than a slice behind the tail are dropped ──
        if let Some(&(_, anchor)) = inner.samples.back() {
            if anchor
                .checked_sub(self.time_slice)
                .is_some_and(|floor| timestamp < floor)
            {
                return;
            }
        }

        // ── New slice: reseed and forget the previous winner ────
        if let Some(&(_, anchor)) = inner.samples.back() {
            if timestamp > anchor + self.time_slice {
                inner.slice_randomizer = inner.rng.gen();
                inner.winning_score = 0;
                tracing::trace!(seed = inner.slice_randomizer, "new time slice");
            }
        }

        // ── Age out anything older than the window ──────────────
        if let Some(expiry) = timestamp.checked_sub(self.window_duration) {
            let before = inner.samples.len();
            while inner.samples.front().is_some_and(|&(_, ts)| ts < expiry) {
                inner.samples.pop_front();
            }
            let expired = before - inner.samples.len();
            if expired > 0 {
                tracing::trace!(expired, "trimmed expired samples");
            }
        }

        let h = self.score.score(value, inner.slice_randomizer);

        match inner.samples.back_mut() {
            // Same slice as the tail: keep whichever scores higher
            Some(tail) if timestamp <= tail.1 + self.time_slice => {
                if h > inner.winning_score {
                    tail.0 = value;
                    inner.winning_score = h;
                }
            }
            // New slice or empty window: open a slice anchored here
            _ => {
                inner.samples.push_back((value, timestamp));
                inner.winning_score = h;
                if inner.samples.len() > self.window_size {
                    inner.samples.pop_front();
                }
            }
        }
    }

    /// Drop every retained sample.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.samples.clear();
        inner.winning_score = 0;
    }

    pub fn size(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// Copy of the retained values, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        let inner = self.inner.lock();
        inner.samples.iter().map(|&(value, _)| value).collect()
    }

    /// Estimator over the current window. Values are copied under the lock;
    /// sorting happens after it is released.
    pub fn make_snapshot(&self) -> WeightedQuantileEstimator {
        WeightedQuantileEstimator::from_values(self.snapshot())
    }

    #[cfg(test)]
    fn anchors(&self) -> Vec<Instant> {
        self.inner.lock().samples.iter().map(|&(_, ts)| ts).collect()
    }
}
