// src/frame_source/capture.rs

use super::{FrameSource, FrameStamper};
use crate::error::SourceError;
use crate::types::Frame;
use anyhow::{bail, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use tracing::info;

/// Camera device or video file read through OpenCV.
pub struct CaptureSource {
    cap: VideoCapture,
    label: String,
    /// Files end; cameras only ever stall
    finite: bool,
    stamper: FrameStamper,
}

impl CaptureSource {
    pub fn open_camera(index: i32) -> Result<Self> {
        info!("Opening camera {}", index);
        let cap = VideoCapture::new(index, videoio::CAP_ANY)?;
        Self::from_capture(cap, format!("camera {}", index), false)
    }

    pub fn open_file(path: &str) -> Result<Self> {
        info!("Opening video: {}", path);
        let cap = VideoCapture::from_file(path, videoio::CAP_ANY)?;
        Self::from_capture(cap, format!("video {}", path), true)
    }

    fn from_capture(cap: VideoCapture, label: String, finite: bool) -> Result<Self> {
        if !cap.is_opened()? {
            bail!("Failed to open {}", label);
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        info!("Capture properties: {}x{} @ {:.1} FPS", width, height, fps);

        Ok(Self {
            cap,
            label,
            finite,
            stamper: FrameStamper::new(),
        })
    }

    fn read_mat(&mut self) -> opencv::Result<Option<Mat>> {
        let mut mat = Mat::default();
        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }
        Ok(Some(mat))
    }
}

impl FrameSource for CaptureSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        let mat = match self.read_mat() {
            Ok(Some(mat)) => mat,
            Ok(None) if self.finite => return Err(SourceError::Exhausted),
            Ok(None) => return Err(SourceError::unavailable(format!("{}: no frame", self.label))),
            Err(e) => return Err(SourceError::unavailable(format!("{}: {}", self.label, e))),
        };

        let width = mat.cols() as usize;
        let height = mat.rows() as usize;
        // VideoCapture already delivers 8-bit BGR
        let data = mat
            .data_bytes()
            .map_err(|e| SourceError::unavailable(format!("{}: {}", self.label, e)))?
            .to_vec();

        Ok(self.stamper.stamp(data, width, height))
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}
