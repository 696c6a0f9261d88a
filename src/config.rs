// src/config.rs

use crate::types::{Config, SourceKind};
use anyhow::{ensure, Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path))?;
        Ok(config)
    }

    /// Startup checks. Anything that fails here is fatal; nothing is
    /// re-validated once the loop runs.
    pub fn validate(&self) -> Result<()> {
        let video = &self.video;
        ensure!(
            video.source_width > 0 && video.source_height > 0,
            "video: source resolution must be positive, got {}x{}",
            video.source_width,
            video.source_height
        );
        ensure!(video.frame_timeout_ms > 0, "video.frame_timeout_ms must be positive");
        if let Some(limit) = video.retry_limit {
            ensure!(limit > 0, "video.retry_limit must be at least 1 when set");
        }
        if video.source == SourceKind::File {
            ensure!(
                video.file_path.is_some(),
                "video.file_path is required for source: file"
            );
        }

        let seg = &self.segmentation;
        ensure!(
            !seg.color_range.is_empty(),
            "segmentation.color_range: lower {:?} exceeds upper {:?}",
            seg.color_range.lower,
            seg.color_range.upper
        );
        ensure!(
            seg.working_width > 0 && seg.working_height > 0,
            "segmentation: working resolution must be positive, got {}x{}",
            seg.working_width,
            seg.working_height
        );
        ensure!(
            seg.blur_kernel % 2 == 1,
            "segmentation.blur_kernel must be odd and positive, got {}",
            seg.blur_kernel
        );

        let tracking = &self.tracking;
        ensure!(
            tracking.min_area.is_finite() && tracking.min_area >= 0.0,
            "tracking.min_area must be non-negative, got {}",
            tracking.min_area
        );
        let p = tracking.reference_point;
        ensure!(
            p.x >= 0
                && p.y >= 0
                && (p.x as usize) < seg.working_width
                && (p.y as usize) < seg.working_height,
            "tracking.reference_point ({}, {}) lies outside the {}x{} working frame",
            p.x,
            p.y,
            seg.working_width,
            seg.working_height
        );

        self.control.validate()?;

        ensure!(
            self.diagnostics.snapshot_every > 0,
            "diagnostics.snapshot_every must be positive"
        );

        Ok(())
    }
}
