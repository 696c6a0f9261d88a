// src/detection/segmenter.rs
//
// Frame -> binary target mask.
//
//   flip (mirror) -> resize to working size -> Gaussian blur
//     -> BGR to HSV -> color range threshold -> erode -> dilate
//
// Every intermediate buffer belongs to the call; the only thing that
// outlives it is the returned mask.

use crate::color_analysis::{bgr_image_to_hsv, in_range};
use crate::error::FrameError;
use crate::morphology;
use crate::preprocessing::{flip_horizontal, gaussian_blur, resize_bilinear};
use crate::types::{Frame, Mask, SegmentationConfig};
use image::RgbImage;

/// Output of one segmentation pass. The working image is kept so
/// diagnostics can draw on what the mask was computed from.
pub struct Segmentation {
    pub working: Frame,
    pub mask: Mask,
}

pub struct Segmenter {
    config: SegmentationConfig,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn working_size(&self) -> (usize, usize) {
        (self.config.working_width, self.config.working_height)
    }

    pub fn segment(&self, frame: &Frame) -> Result<Segmentation, FrameError> {
        frame.validate()?;
        let channels = Frame::CHANNELS;
        let (work_w, work_h) = self.working_size();

        let mirrored;
        let oriented: &[u8] = if self.config.flip_horizontal {
            mirrored = flip_horizontal(&frame.data, frame.width, frame.height, channels);
            &mirrored
        } else {
            &frame.data
        };

        let resized = resize_bilinear(oriented, frame.width, frame.height, work_w, work_h, channels);
        let actual = resized.len();
        // Channel order rides along unchanged; the blur treats all three alike
        let working = RgbImage::from_raw(work_w as u32, work_h as u32, resized).ok_or(
            FrameError::DimensionMismatch {
                expected: work_w * work_h * channels,
                actual,
            },
        )?;
        let blurred = gaussian_blur(&working, self.config.blur_kernel);
        let hsv = bgr_image_to_hsv(blurred.as_raw());

        let raw = in_range(&hsv, work_w, work_h, &self.config.color_range);
        let mask = morphology::open(&raw);

        Ok(Segmentation {
            working: Frame {
                data: working.into_raw(),
                width: work_w,
                height: work_h,
                frame_id: frame.frame_id,
                timestamp_ms: frame.timestamp_ms,
            },
            mask,
        })
    }
}
