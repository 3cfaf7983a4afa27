use std::time::{Duration, Instant};

use proptest::prelude::*;

use window_sampler::{SamplingError, SlidingWindowReservoir, WeightedQuantileEstimator, WeightedValue};

fn weighted(pairs: &[(f64, f64)]) -> WeightedQuantileEstimator {
    WeightedQuantileEstimator::new(pairs.iter().map(|&(v, w)| WeightedValue::new(v, w)).collect())
}

#[test]
fn reservoir_snapshot_into_percentiles() {
    let r = SlidingWindowReservoir::with_seed(100, Duration::from_secs(100), 11).unwrap();
    let t0 = Instant::now();
    for v in 1..=100i64 {
        // One observation per slice, plus a burst that competes for it.
        let ts = t0 + Duration::from_millis(v as u64 * 1_001);
        r.update_at(v, ts);
        r.update_at(v, ts + Duration::from_millis(1));
    }

    let snap = r.snapshot();
    assert_eq!(snap.len(), 100);
    assert!(snap.windows(2).all(|w| w[0] < w[1]));

    let est = WeightedQuantileEstimator::from_values(snap);
    assert_eq!(est.value(0.0).unwrap(), 1.0);
    assert_eq!(est.value(1.0).unwrap(), 100.0);
    assert_eq!(est.median(), 50.5);
    assert!(est.p95() > 94.0 && est.p95() < 96.0);
    assert!(est.p99() <= est.p999());
}

#[test]
fn snapshot_is_detached_from_later_updates() {
    let r = SlidingWindowReservoir::with_seed(10, Duration::from_secs(10), 1).unwrap();
    let t0 = Instant::now();
    r.update_at(1, t0);
    let before = r.snapshot();
    r.update_at(2, t0 + Duration::from_secs(3));
    assert_eq!(before, vec![1.0]);
    assert_eq!(r.snapshot(), vec![1.0, 2.0]);
}

#[test]
fn clear_then_snapshot_is_empty() {
    let r = SlidingWindowReservoir::new(10, Duration::from_secs(10)).unwrap();
    r.update(5);
    r.clear();
    assert_eq!(r.size(), 0);
    assert!(r.snapshot().is_empty());
    assert_eq!(r.make_snapshot().median(), 0.0);
}

#[test]
fn invalid_quantiles_are_reported() {
    let est = WeightedQuantileEstimator::from_values([1.0, 2.0, 3.0]);
    for q in [-0.1, 1.1] {
        match est.value(q) {
            Err(SamplingError::InvalidQuantile(got)) => assert_eq!(got, q),
            other => panic!("expected InvalidQuantile for {q}, got {other:?}"),
        }
    }
}

proptest! {
    #[test]
    fn split_weights_match_merged_weights(
        pairs in prop::collection::vec((0i32..20, 1u8..5), 1..40),
        q in 0.0f64..=1.0,
    ) {
        // Same values split into unit weights vs. pre-summed weights.
        let mut split = Vec::new();
        let mut merged = std::collections::BTreeMap::new();
        for (v, w) in pairs {
            for _ in 0..w {
                split.push((f64::from(v), 1.0));
            }
            *merged.entry(v).or_insert(0.0) += f64::from(w);
        }
        let merged: Vec<(f64, f64)> = merged.into_iter().map(|(v, w)| (f64::from(v), w)).collect();

        let a = weighted(&split).value(q).unwrap();
        let b = weighted(&merged).value(q).unwrap();
        prop_assert!((a - b).abs() < 1e-9, "q={} split={} merged={}", q, a, b);
    }

    #[test]
    fn quantiles_are_monotone_and_bounded(
        values in prop::collection::vec(-1_000i64..1_000, 1..200),
        q1 in 0.0f64..=1.0,
        q2 in 0.0f64..=1.0,
    ) {
        let est = WeightedQuantileEstimator::from_values(values.iter().map(|&v| v as f64));
        let (lo, hi) = if q1 <= q2 { (q1, q2) } else { (q2, q1) };
        let a = est.value(lo).unwrap();
        let b = est.value(hi).unwrap();
        prop_assert!(a <= b + 1e-9);
        prop_assert!(a >= est.min() && b <= est.max());
    }
}
