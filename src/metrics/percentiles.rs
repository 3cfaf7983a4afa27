use serde::Serialize;

use crate::error::{Result, SamplingError};

const MEDIAN_Q: f64 = 0.5;
const P75_Q: f64 = 0.75;
const P95_Q: f64 = 0.95;
const P98_Q: f64 = 0.98;
const P99_Q: f64 = 0.99;
const P999_Q: f64 = 0.999;

/// One value with its multiplicity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedValue {
    pub value: f64,
    pub weight: f64,
}

impl WeightedValue {
    pub fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// Quantiles over a fixed weighted value set, by linear interpolation of
/// the weighted empirical CDF.
///
/// Built once (sort, merge equal values, sum weights) and immutable
/// afterwards, so it can be shared across threads without locking.
#[derive(Debug, Clone, Default)]
pub struct WeightedQuantileEstimator {
    /// Distinct values, ascending, with summed weights.
    values: Vec<WeightedValue>,
    total_weight: f64,
}

impl WeightedQuantileEstimator {
    /// Entries whose weight is not a finite, strictly positive number are
    /// dropped.
    pub fn new(mut input: Vec<WeightedValue>) -> Self {
        input.retain(|v| v.weight > 0.0 && v.weight.is_finite());
        input.sort_by(|a, b| a.value.total_cmp(&b.value));

        let mut values: Vec<WeightedValue> = Vec::with_capacity(input.len());
        let mut total_weight = 0.0;
        for wv in input {
            total_weight += wv.weight;
            match values.last_mut() {
                Some(last) if last.value == wv.value => last.weight += wv.weight,
                _ => values.push(wv),
            }
        }

        Self { values, total_weight }
    }

    /// Every value gets weight 1, as for a reservoir snapshot.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::new(
            values
                .into_iter()
                .map(|value| WeightedValue::new(value, 1.0))
                .collect(),
        )
    }

    /// Value at `quantile`. An empty set (or zero total weight) yields 0.0.
    pub fn value(&self, quantile: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&quantile) {
            return Err(SamplingError::InvalidQuantile(quantile));
        }

        if self.values.is_empty() || self.total_weight == 0.0 {
            return Ok(0.0);
        }

        let q_weight = quantile * self.total_weight;

        // Each distinct value sits at the midpoint of its share of the
        // cumulative weight; targets between two midpoints interpolate.
        let mut cum = 0.0;
        let mut prev_mid = 0.0;
        for (i, wv) in self.values.iter().enumerate() {
            let mid = cum + wv.weight / 2.0;
            cum += wv.weight;
            if mid >= q_weight {
                if i == 0 {
                    return Ok(wv.value);
                }
                let prev = self.values[i - 1].value;
                return Ok(prev + (q_weight - prev_mid) * (wv.value - prev) / (mid - prev_mid));
            }
            prev_mid = mid;
        }

        // Past the last midpoint.
        Ok(self.values[self.values.len() - 1].value)
    }

    // The fixed quantiles below are always in range.

    pub fn median(&self) -> f64 {
        self.value(MEDIAN_Q).unwrap_or_default()
    }

    pub fn p75(&self) -> f64 {
        self.value(P75_Q).unwrap_or_default()
    }

    pub fn p95(&self) -> f64 {
        self.value(P95_Q).unwrap_or_default()
    }

    pub fn p98(&self) -> f64 {
        self.value(P98_Q).unwrap_or_default()
    }

    pub fn p99(&self) -> f64 {
        self.value(P99_Q).unwrap_or_default()
    }

    pub fn p999(&self) -> f64 {
        self.value(P999_Q).unwrap_or_default()
    }

    /// Number of distinct values.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Distinct values in ascending order.
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().map(|wv| wv.value).collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn min(&self) -> f64 {
        self.values.first().map_or(0.0, |wv| wv.value)
    }

    pub fn max(&self) -> f64 {
        self.values.last().map_or(0.0, |wv| wv.value)
    }

    /// Weighted mean; 0.0 when there is no mass.
    pub fn mean(&self) -> f64 {
        if self.total_weight == 0.0 {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|wv| wv.value * wv.weight).sum();
        sum / self.total_weight
    }
}

/// A complete percentile breakdown for one sampled series.
#[derive(Debug, Clone, Serialize)]
pub struct PercentileSet {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
    /// Sum of weights; the sample count for unit-weight snapshots.
    pub weight: f64,
}

impl PercentileSet {
    /// Zeroed when the estimator is empty.
    pub fn from_estimator(est: &WeightedQuantileEstimator) -> Self {
        Self {
            min: est.min(),
            max: est.max(),
            mean: est.mean(),
            p50: est.median(),
            p75: est.p75(),
            p95: est.p95(),
            p98: est.p98(),
            p99: est.p99(),
            p999: est.p999(),
            weight: est.total_weight(),
        }
    }

    /// Convenience: is this set backed by at least one observation?
    pub fn has_data(&self) -> bool {
        self.weight > 0.0
    }
}
