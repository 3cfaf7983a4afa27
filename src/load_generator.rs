use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::Instant;

use crate::config::LoadConfig;
use crate::metrics::MetricsCollector;

/// Series the synthetic producers write to.
pub const SERIES: [&str; 3] = ["cache.read", "db.query", "rpc.call"];

/// Chance that an observation is a rare slow outlier.
const SPIKE_PROBABILITY: f64 = 0.01;

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `cfg.producers` Tokio tasks that fire bursts of synthetic
/// latencies until the deadline or until `running` is set to false.
/// Returns the total number of observations recorded.
pub async fn run(running: Arc<AtomicBool>, metrics: Arc<MetricsCollector>, cfg: LoadConfig) -> u64 {
    let deadline = Instant::now() + Duration::from_secs(cfg.duration_secs);

    let mut handles = Vec::with_capacity(cfg.producers as usize);

    for producer_id in 0..cfg.producers {
        let running = running.clone();
        let metrics = metrics.clone();

        handles.push(tokio::spawn(async move {
            producer(producer_id, running, metrics, deadline, cfg.burst_len).await
        }));
    }

    let mut total = 0;
    for h in handles {
        match h.await {
            Ok(n) => total += n,
            Err(e) => tracing::warn!(error = %e, "producer task failed"),
        }
    }

    running.store(false, Ordering::SeqCst);
    total
}

/// Observation total from a finished `run` task; a failed task is logged
/// and counts as zero.
pub fn total_or_log(res: Result<u64, JoinError>) -> u64 {
    match res {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(error = %e, "load generator task failed");
            0
        }
    }
}

// ─── Producer loop ───────────────────────────────────────────────

async fn producer(
    id: u32,
    running: Arc<AtomicBool>,
    metrics: Arc<MetricsCollector>,
    deadline: Instant,
    burst_len: u32,
) -> u64 {
    // Each producer gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);
    let mut recorded = 0u64;

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        let series = SERIES[rng.gen_range(0..SERIES.len())];

        // Back-to-back burst, far faster than any time slice
        for _ in 0..burst_len {
            if let Err(e) = metrics.record(series, synthetic_latency(&mut rng)) {
                tracing::error!(producer = id, error = %e, "record failed");
                return recorded;
            }
            recorded += 1;
        }

        let pause = rng.gen_range(1..20u64);
        tokio::time::sleep(Duration::from_millis(pause)).await;
    }

    tracing::debug!(producer = id, recorded, "producer finished");
    recorded
}

/// Microsecond latency: mostly 50 to 500, with rare slow outliers.
fn synthetic_latency(rng: &mut StdRng) -> i64 {
    if rng.gen_bool(SPIKE_PROBABILITY) {
        rng.gen_range(5_000..50_000)
    } else {
        rng.gen_range(50..500)
    }
}
