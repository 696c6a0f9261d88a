// src/pipeline/runner.rs
//
// The tick loop. Blocks on the source, runs one tick to completion, hands
// the output to the actuator, and only then looks at whether to stop.

use super::diagnostics::SnapshotWriter;
use super::metrics::PipelineMetrics;
use super::servo::{ServoPipeline, TickReport};
use crate::actuator::Actuator;
use crate::control::RangeState;
use crate::error::SourceError;
use crate::frame_source::FrameSource;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct LoopOptions {
    /// Stop after this many consecutive skipped ticks; `None` never gives up
    pub retry_limit: Option<u32>,
    /// Stop after this many processed ticks
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    SourceExhausted,
    RetryLimit,
    TickLimit,
}

/// What changed since the previous tick, for transition logging only.
#[derive(Default)]
struct Transitions {
    had_target: Option<bool>,
    range: Option<RangeState>,
    landing: bool,
}

pub fn run_loop<S, A>(
    source: &mut S,
    pipeline: &ServoPipeline,
    actuator: &mut A,
    metrics: &PipelineMetrics,
    snapshots: Option<&SnapshotWriter>,
    options: &LoopOptions,
) -> LoopExit
where
    S: FrameSource + ?Sized,
    A: Actuator + ?Sized,
{
    info!("▶ Control loop running on {}", source.name());

    let mut consecutive_failures: u32 = 0;
    let mut ticks: u64 = 0;
    let mut seen = Transitions::default();

    let exit = loop {
        if let Some(max) = options.max_ticks {
            if ticks >= max {
                break LoopExit::TickLimit;
            }
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(SourceError::Exhausted) => {
                info!("Frame source exhausted");
                break LoopExit::SourceExhausted;
            }
            Err(e @ SourceError::Unavailable(_)) => {
                metrics.inc(&metrics.skipped_unavailable);
                warn!("Skipping tick: {}", e);
                consecutive_failures += 1;
                if retry_limit_hit(options, consecutive_failures) {
                    break LoopExit::RetryLimit;
                }
                continue;
            }
        };

        let started = Instant::now();
        let report = match pipeline.tick(&frame) {
            Ok(report) => report,
            Err(e) => {
                metrics.inc(&metrics.skipped_empty);
                warn!("Skipping frame {}: {}", frame.frame_id, e);
                consecutive_failures += 1;
                if retry_limit_hit(options, consecutive_failures) {
                    break LoopExit::RetryLimit;
                }
                continue;
            }
        };
        consecutive_failures = 0;

        let failures = actuator.apply(&report.output);
        metrics.add(&metrics.actuator_failures, failures as u64);

        metrics.inc(&metrics.ticks);
        metrics.set_timing(&metrics.tick_time_us, started.elapsed().as_micros() as u64);

        if report.has_target() {
            metrics.inc(&metrics.targets_found);
        } else {
            metrics.inc(&metrics.targets_lost);
        }
        if report.output.land {
            metrics.inc(&metrics.land_decisions);
        }

        log_transitions(&mut seen, &report);

        if let Some(writer) = snapshots {
            if writer.is_due(ticks) {
                match writer.write(&report) {
                    Ok(_) => metrics.inc(&metrics.snapshots_written),
                    Err(e) => warn!("Snapshot failed: {:#}", e),
                }
            }
        }

        ticks += 1;
    };

    info!("■ Control loop stopped after {} ticks ({:?})", ticks, exit);
    exit
}

fn retry_limit_hit(options: &LoopOptions, consecutive: u32) -> bool {
    match options.retry_limit {
        Some(limit) if consecutive >= limit => {
            warn!("{} consecutive ticks skipped, giving up", consecutive);
            true
        }
        _ => false,
    }
}

fn log_transitions(seen: &mut Transitions, report: &TickReport) {
    let has_target = report.has_target();
    if seen.had_target != Some(has_target) {
        if has_target {
            info!("🎯 Target acquired (frame {})", report.frame_id);
        } else {
            info!("Target lost, hovering (frame {})", report.frame_id);
        }
        seen.had_target = Some(has_target);
    }

    if let Some(e) = &report.error {
        debug!("Frame {}: dx={} dy={} area={}", report.frame_id, e.dx, e.dy, e.area);
    }

    let range = report.output.range;
    if range != seen.range {
        match range {
            Some(RangeState::TooSmall) => info!("Range: target lost/too small"),
            Some(RangeState::TooFar) => info!("Range: too far, moving forward"),
            Some(RangeState::TooClose) => info!("Range: too close, moving backward"),
            Some(RangeState::JustRight) => info!("Range: just right"),
            None if has_target => info!("Range: no decision"),
            None => {}
        }
        seen.range = range;
    }

    if report.output.land && !seen.landing {
        warn!("🛬 Target too close, landing (frame {})", report.frame_id);
    }
    seen.landing = report.output.land;
}
