// src/main.rs

mod actuator;
mod color_analysis;
mod config;
mod control;
mod detection;
mod error;
mod frame_source;
mod morphology;
mod pipeline;
mod preprocessing;
mod types;

#[cfg(test)]
mod test_utils;

use actuator::{Actuator, JsonLinesActuator, LogActuator};
use anyhow::{Context, Result};
use frame_source::{FrameSource, ImageDirSource, MailboxSource, RawStreamSource};
use pipeline::{run_loop, LoopOptions, PipelineMetrics, ServoPipeline, SnapshotWriter};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use types::{ActuatorKind, Config, SourceKind};

const CONFIG_ENV: &str = "VISUAL_SERVO_CONFIG";
const DEFAULT_CONFIG: &str = "config.yaml";

fn main() -> Result<()> {
    let explicit_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    // Only the default path may be absent; an explicit one must load
    let config = if explicit_path.is_some() || Path::new(&config_path).exists() {
        Some(Config::load(&config_path)?)
    } else {
        None
    };
    let using_defaults = config.is_none();
    let config = config.unwrap_or_default();

    // stdout may carry actuator commands, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("🚁 Visual Servo Controller Starting");
    if using_defaults {
        warn!("{} not found, using built-in defaults", config_path);
    } else {
        info!("✓ Configuration loaded from {}", config_path);
    }

    config.validate().context("Invalid configuration")?;

    let range = &config.segmentation.color_range;
    info!(
        "Target: HSV {:?}..={:?}, min area {:.0}, reference ({}, {}), working {}x{}",
        range.lower,
        range.upper,
        config.tracking.min_area,
        config.tracking.reference_point.x,
        config.tracking.reference_point.y,
        config.segmentation.working_width,
        config.segmentation.working_height
    );

    let mut source = open_source(&config)?;
    info!("✓ Frame source ready: {}", source.name());

    let mut actuator = open_actuator(&config);
    let pipeline = ServoPipeline::new(&config);

    let snapshots = match &config.diagnostics.snapshot_dir {
        Some(dir) => {
            let writer = SnapshotWriter::create(
                dir,
                config.diagnostics.snapshot_every,
                pipeline.reference_point(),
            )?;
            info!(
                "Snapshots every {} ticks into {}",
                config.diagnostics.snapshot_every, dir
            );
            Some(writer)
        }
        None => None,
    };

    if config.actuator.take_off_on_start {
        if let Err(e) = actuator.take_off() {
            warn!("Take off failed: {:#}", e);
        }
    }

    let metrics = PipelineMetrics::new();
    let options = LoopOptions {
        retry_limit: config.video.retry_limit,
        max_ticks: None,
    };

    let exit = run_loop(
        &mut source,
        &pipeline,
        &mut actuator,
        &metrics,
        snapshots.as_ref(),
        &options,
    );

    if config.actuator.land_on_exit {
        if let Err(e) = actuator.land() {
            warn!("Land on exit failed: {:#}", e);
        }
    }

    let summary = metrics.summary();
    info!("\n========================================");
    info!("Run finished: {:?}", exit);
    info!("  Ticks: {} ({:.1} FPS)", summary.ticks, summary.fps);
    info!(
        "  Target found / lost: {} / {}",
        summary.targets_found, summary.targets_lost
    );
    info!(
        "  Skipped: {} unavailable, {} empty",
        summary.skipped_unavailable, summary.skipped_empty
    );
    info!("  Land decisions: {}", summary.land_decisions);
    info!("========================================");
    info!("{}", serde_json::to_string(&summary)?);

    Ok(())
}

fn open_source(config: &Config) -> Result<Box<dyn FrameSource>> {
    let video = &config.video;

    let source: Box<dyn FrameSource> = match video.source {
        SourceKind::Stdin => Box::new(RawStreamSource::new(
            std::io::stdin(),
            video.source_width,
            video.source_height,
        )),
        // Replays must not drop frames, so they never go through the mailbox
        SourceKind::Images => return Ok(Box::new(ImageDirSource::open(&video.image_dir)?)),
        SourceKind::Camera | SourceKind::File => open_capture(config)?,
    };

    let live = video.source != SourceKind::File;
    if video.use_mailbox && live {
        let timeout = Duration::from_millis(video.frame_timeout_ms);
        return Ok(Box::new(MailboxSource::spawn(source, timeout)?));
    }
    Ok(source)
}

#[cfg(feature = "opencv")]
fn open_capture(config: &Config) -> Result<Box<dyn FrameSource>> {
    use anyhow::bail;
    use frame_source::CaptureSource;

    let video = &config.video;
    let capture = match (video.source, &video.file_path) {
        (SourceKind::File, Some(path)) => CaptureSource::open_file(path)?,
        (SourceKind::File, None) => bail!("video.file_path is required for source: file"),
        _ => CaptureSource::open_camera(video.device_index)?,
    };
    Ok(Box::new(capture))
}

#[cfg(not(feature = "opencv"))]
fn open_capture(config: &Config) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "video source {:?} needs OpenCV; rebuild with `--features opencv`",
        config.video.source
    )
}

fn open_actuator(config: &Config) -> Box<dyn Actuator> {
    match config.actuator.sink {
        ActuatorKind::Log => Box::new(LogActuator::new()),
        ActuatorKind::JsonLines => Box::new(JsonLinesActuator::new(std::io::stdout())),
    }
}
