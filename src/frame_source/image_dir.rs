// src/frame_source/image_dir.rs

use super::{FrameSource, FrameStamper};
use crate::error::SourceError;
use crate::types::Frame;
use anyhow::{ensure, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Replays still images from a directory tree, in path order.
pub struct ImageDirSource {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
    stamper: FrameStamper,
}

impl ImageDirSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        ensure!(dir.is_dir(), "image directory {} does not exist", dir.display());

        let mut images: Vec<PathBuf> = WalkDir::new(&dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| is_image(p))
            .collect();
        images.sort();

        if images.is_empty() {
            warn!("No images found in {}", dir.display());
        } else {
            info!("Found {} images in {}", images.len(), dir.display());
        }

        Ok(Self {
            dir,
            pending: images.into(),
            stamper: FrameStamper::new(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let path = self.pending.pop_front().ok_or(SourceError::Exhausted)?;

        let rgb = image::open(&path)
            .map_err(|e| SourceError::unavailable(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut data = rgb.into_raw();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }

        Ok(self.stamper.stamp(data, width as usize, height as usize))
    }

    fn name(&self) -> String {
        format!(
            "image directory {} ({} queued)",
            self.dir.display(),
            self.remaining()
        )
    }
}
