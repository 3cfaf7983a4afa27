use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tokio_stream::StreamExt;
use tracing_subscriber::{fmt, EnvFilter};

use window_sampler::config::{self, SamplerConfig};
use window_sampler::load_generator;
use window_sampler::metrics::{stream, MetricsCollector};

/// Path of an optional YAML config; defaults apply when unset.
const CONFIG_ENV: &str = "SAMPLER_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // ── 1. Load config ───────────────────────────────────────────
    let cfg = match std::env::var(CONFIG_ENV) {
        Ok(path) => match config::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(%path, error = %e, "config load failed");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => SamplerConfig::default(),
    };

    // ── 2. Build the collector ───────────────────────────────────
    let metrics = match MetricsCollector::new(cfg.window) {
        Ok(m) => Arc::new(m),
        Err(e) => {
            tracing::error!(error = %e, "invalid window config");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        window_size = cfg.window.size,
        window_secs = cfg.window.duration_secs,
        producers = cfg.load.producers,
        burst_len = cfg.load.burst_len,
        "window sampler starting"
    );

    // ── 3. Start producers ───────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let mut load = tokio::spawn(load_generator::run(running, metrics.clone(), cfg.load));

    // ── 4. Report until the load finishes ────────────────────────
    let mut reports = Box::pin(stream::snapshot_stream(
        metrics.clone(),
        Duration::from_millis(cfg.load.report_interval_ms),
    ));
    let total = loop {
        tokio::select! {
            res = &mut load => break load_generator::total_or_log(res),
            Some(snapshot) = reports.next() => stream::log_snapshot(&snapshot),
        }
    };

    // ── 5. Final snapshot as JSON ────────────────────────────────
    let snapshot = metrics.snapshot();
    tracing::info!(observations = total, series = snapshot.series.len(), "load finished");
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "snapshot serialization failed");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
