use std::sync::Arc;
use std::time::Duration;

use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

use super::collector::{CollectorSnapshot, MetricsCollector};

/// Periodic snapshots of `collector`, one per `every`.
/// The first tick fires immediately.
pub fn snapshot_stream(
    collector: Arc<MetricsCollector>,
    every: Duration,
) -> impl Stream<Item = CollectorSnapshot> {
    let interval = tokio::time::interval(every);
    IntervalStream::new(interval).map(move |_| collector.snapshot())
}

/// Emit one structured log line per series in `snapshot`.
pub fn log_snapshot(snapshot: &CollectorSnapshot) {
    for s in &snapshot.series {
        tracing::info!(
            series = %s.name,
            count = s.count,
            samples = s.window.weight,
            p50 = s.window.p50,
            p75 = s.window.p75,
            p95 = s.window.p95,
            p99 = s.window.p99,
            p999 = s.window.p999,
            max = s.window.max,
            "window percentiles"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;

    #[tokio::test]
    async fn ticks_yield_fresh_snapshots() {
        let collector = Arc::new(
            MetricsCollector::new(WindowConfig {
                size: 8,
                duration_secs: 8,
            })
            .unwrap(),
        );
        let mut stream = Box::pin(snapshot_stream(collector.clone(), Duration::from_millis(100)));

        let first = stream.next().await.unwrap();
        assert!(first.series.is_empty());

        collector.record("latency", 7).unwrap();
        let second = stream.next().await.unwrap();
        assert_eq!(second.series.len(), 1);
        assert_eq!(second.series[0].window.p50, 7.0);
        log_snapshot(&second);
    }
}
