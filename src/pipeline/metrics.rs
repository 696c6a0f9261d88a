// src/pipeline/metrics.rs
//
// Loop observability. Counters are atomics so a reporter thread can read
// them while the loop runs; the summary is logged as JSON at the end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub ticks: Arc<AtomicU64>,
    pub skipped_unavailable: Arc<AtomicU64>,
    pub skipped_empty: Arc<AtomicU64>,
    pub targets_found: Arc<AtomicU64>,
    pub targets_lost: Arc<AtomicU64>,
    pub land_decisions: Arc<AtomicU64>,
    pub actuator_failures: Arc<AtomicU64>,
    pub snapshots_written: Arc<AtomicU64>,
    pub tick_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(0)),
            skipped_unavailable: Arc::new(AtomicU64::new(0)),
            skipped_empty: Arc::new(AtomicU64::new(0)),
            targets_found: Arc::new(AtomicU64::new(0)),
            targets_lost: Arc::new(AtomicU64::new(0)),
            land_decisions: Arc::new(AtomicU64::new(0)),
            actuator_failures: Arc::new(AtomicU64::new(0)),
            snapshots_written: Arc::new(AtomicU64::new(0)),
            tick_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let ticks = self.ticks.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            ticks as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            ticks: self.ticks.load(Ordering::Relaxed),
            fps: self.fps(),
            skipped_unavailable: self.skipped_unavailable.load(Ordering::Relaxed),
            skipped_empty: self.skipped_empty.load(Ordering::Relaxed),
            targets_found: self.targets_found.load(Ordering::Relaxed),
            targets_lost: self.targets_lost.load(Ordering::Relaxed),
            land_decisions: self.land_decisions.load(Ordering::Relaxed),
            actuator_failures: self.actuator_failures.load(Ordering::Relaxed),
            snapshots_written: self.snapshots_written.load(Ordering::Relaxed),
            last_tick_us: self.tick_time_us.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub ticks: u64,
    pub fps: f64,
    pub skipped_unavailable: u64,
    pub skipped_empty: u64,
    pub targets_found: u64,
    pub targets_lost: u64,
    pub land_decisions: u64,
    pub actuator_failures: u64,
    pub snapshots_written: u64,
    pub last_tick_us: u64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = PipelineMetrics::new();
        let reporter = metrics.clone();
        metrics.inc(&metrics.ticks);
        metrics.add(&metrics.actuator_failures, 3);
        metrics.set_timing(&metrics.tick_time_us, 1500);

        let summary = reporter.summary();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.actuator_failures, 3);
        assert_eq!(summary.last_tick_us, 1500);
    }

    #[test]
    fn test_summary_serializes() {
        let json = serde_json::to_value(PipelineMetrics::new().summary()).unwrap();
        assert_eq!(json["ticks"], 0);
        assert!(json.get("land_decisions").is_some());
    }
}
