// src/types.rs

use crate::control::ControlConfig;
use crate::error::FrameError;
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub segmentation: SegmentationConfig,
    pub tracking: TrackingConfig,
    pub control: ControlConfig,
    pub actuator: ActuatorConfig,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Raw bgr24 frames piped into stdin by an external decoder
    Stdin,
    /// Still images replayed from `image_dir`
    Images,
    /// Camera device through OpenCV (feature `opencv`)
    Camera,
    /// Video file through OpenCV (feature `opencv`)
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub source: SourceKind,
    pub source_width: usize,
    pub source_height: usize,
    pub image_dir: String,
    pub device_index: i32,
    pub file_path: Option<String>,
    /// Run the source on a reader thread behind a latest-frame mailbox
    pub use_mailbox: bool,
    pub frame_timeout_ms: u64,
    /// Consecutive unavailable ticks before giving up; `None` retries forever
    pub retry_limit: Option<u32>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Stdin,
            source_width: 960,
            source_height: 720,
            image_dir: "frames".to_string(),
            device_index: 0,
            file_path: None,
            use_mailbox: true,
            frame_timeout_ms: 1000,
            retry_limit: None,
        }
    }
}

/// Inclusive HSV bounds, OpenCV 8-bit convention (H 0-180, S and V 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl Default for ColorRange {
    // Saturated reds (and anything else fully saturated and bright enough)
    fn default() -> Self {
        Self {
            lower: [0, 255, 100],
            upper: [255, 255, 255],
        }
    }
}

impl ColorRange {
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    /// A range with any channel inverted can never match a pixel
    pub fn is_empty(&self) -> bool {
        (0..3).any(|c| self.lower[c] > self.upper[c])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Mirror frames so corrections match the operator's view
    pub flip_horizontal: bool,
    pub working_width: usize,
    pub working_height: usize,
    /// Odd Gaussian kernel side; sigma is derived from it
    pub blur_kernel: usize,
    pub color_range: ColorRange,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            flip_horizontal: true,
            working_width: 600,
            working_height: 600,
            blur_kernel: 11,
            color_range: ColorRange::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// A contour must enclose strictly more than this to count as the target
    pub min_area: f64,
    /// Where the target should sit in the working frame
    pub reference_point: Point,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            min_area: 2000.0,
            reference_point: Point::new(300, 300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// Dry run: every command goes to the log
    Log,
    /// One JSON object per command on stdout, for an external driver
    JsonLines,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub sink: ActuatorKind,
    pub take_off_on_start: bool,
    pub land_on_exit: bool,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            sink: ActuatorKind::Log,
            take_off_on_start: true,
            land_on_exit: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub snapshot_dir: Option<String>,
    pub snapshot_every: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: None,
            snapshot_every: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "visual_servo=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Interleaved BGR, 3 bytes per pixel, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub frame_id: u64,
    pub timestamp_ms: f64,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    /// Reject degenerate frames before any pixel work happens
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width * self.height * Self::CHANNELS;
        if self.data.len() != expected {
            return Err(FrameError::DimensionMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Binary image, one byte per pixel: 255 inside, 0 outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0; width * height],
            width,
            height,
        }
    }

    #[cfg(test)]
    pub fn is_set(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.data[y as usize * self.width + x as usize] != 0
    }

    #[cfg(test)]
    pub fn set(&mut self, x: usize, y: usize) {
        self.data[y * self.width + x] = 255;
    }

    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Copy into an `image` buffer for the `imageproc` passes.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Luma([self.data[y as usize * self.width + x as usize]])
        })
    }

    pub fn from_image(image: GrayImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        Self {
            data: image.into_raw(),
            width,
            height,
        }
    }
}

/// Axis-aligned box with an exclusive max corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2, (self.min.y + self.max.y) / 2)
    }
}

/// The selected target: its outer border and the box around it.
#[derive(Debug, Clone)]
pub struct Region {
    pub contour: Vec<Point>,
    pub contour_area: f64,
    pub bbox: BoundingBox,
}

/// Offset of the target from the reference point, plus its size as a range proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorVector {
    pub dx: i32,
    pub dy: i32,
    pub area: i64,
}
