// src/pipeline/servo.rs
//
// One tick: segment -> select -> estimate -> decide. Everything computed is
// handed back in the report; nothing survives into the next tick.

use crate::control::{ControlLaw, ControlOutput};
use crate::detection::{estimate_error, select_best, Segmentation, Segmenter};
use crate::error::FrameError;
use crate::types::{Config, ErrorVector, Frame, Mask, Point, Region};

/// Read-only view of what a tick saw and decided.
pub struct TickReport {
    pub frame_id: u64,
    /// Mirrored, resized frame the mask was computed from
    pub working: Frame,
    pub mask: Mask,
    pub region: Option<Region>,
    pub error: Option<ErrorVector>,
    pub output: ControlOutput,
}

impl TickReport {
    pub fn has_target(&self) -> bool {
        self.region.is_some()
    }
}

pub struct ServoPipeline {
    segmenter: Segmenter,
    law: ControlLaw,
    min_area: f64,
    reference: Point,
}

impl ServoPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            segmenter: Segmenter::new(config.segmentation.clone()),
            law: ControlLaw::new(config.control.clone()),
            min_area: config.tracking.min_area,
            reference: config.tracking.reference_point,
        }
    }

    pub fn reference_point(&self) -> Point {
        self.reference
    }

    pub fn tick(&self, frame: &Frame) -> Result<TickReport, FrameError> {
        let Segmentation { working, mask } = self.segmenter.segment(frame)?;

        let region = select_best(&mask, self.min_area);
        let error = region.as_ref().map(|r| estimate_error(r, self.reference));
        let output = self.law.decide(error.as_ref());

        Ok(TickReport {
            frame_id: frame.frame_id,
            working,
            mask,
            region,
            error,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Axis, Direction, RangeState, VelocityCommand};
    use crate::test_utils::frame_with_rect;

    const RED: [u8; 3] = [0, 0, 255];

    #[test]
    fn test_red_square_drives_toward_center() {
        // 100x100 red square at (350,100) mirrors to center (200,150):
        // dx = +100 (right 7), dy = +150 (up 7), area ~10000 (too far)
        let pipeline = ServoPipeline::new(&Config::default());
        let frame = frame_with_rect(600, 600, (350, 100, 100, 100), RED);

        let report = pipeline.tick(&frame).unwrap();
        assert!(report.has_target());

        let error = report.error.unwrap();
        assert!((99..=101).contains(&error.dx), "dx {}", error.dx);
        assert!((149..=151).contains(&error.dy), "dy {}", error.dy);
        assert!((9_000..=11_000).contains(&error.area), "area {}", error.area);

        let output = &report.output;
        assert_eq!(
            output.motion(Axis::Lateral),
            Some(&VelocityCommand::new(Axis::Lateral, Direction::Positive, 7))
        );
        assert_eq!(
            output.motion(Axis::Vertical),
            Some(&VelocityCommand::new(Axis::Vertical, Direction::Positive, 7))
        );
        assert_eq!(
            output.motion(Axis::Longitudinal),
            Some(&VelocityCommand::new(Axis::Longitudinal, Direction::Positive, 10))
        );
        assert_eq!(output.range, Some(RangeState::TooFar));
        assert!(!output.hover);
        assert!(!output.land);
    }

    #[test]
    fn test_small_blob_takes_no_target_branch() {
        let pipeline = ServoPipeline::new(&Config::default());
        let frame = frame_with_rect(600, 600, (100, 100, 30, 30), RED);

        let report = pipeline.tick(&frame).unwrap();
        assert!(report.mask.count_set() > 0);
        assert!(report.region.is_none());
        assert!(report.error.is_none());
        assert!(report.output.hover);
        assert!(!report.output.land);
    }

    #[test]
    fn test_too_small_target_steers_then_hovers() {
        // 47x47 clears min area but its box stays under 2500
        let pipeline = ServoPipeline::new(&Config::default());
        let frame = frame_with_rect(600, 600, (350, 100, 47, 47), RED);

        let report = pipeline.tick(&frame).unwrap();
        assert!(report.has_target());
        let error = report.error.unwrap();
        assert!(error.area < 2_500, "area {}", error.area);

        let output = &report.output;
        assert_eq!(output.range, Some(RangeState::TooSmall));
        assert!(output.hover);
        assert!(!output.land);
        let lateral = output.motion(Axis::Lateral).unwrap();
        assert_eq!(lateral.direction, Direction::Positive);
        assert_eq!(
            output.commands.last(),
            Some(&VelocityCommand::neutral(Axis::Longitudinal))
        );
    }

    #[test]
    fn test_off_color_frame_hovers() {
        let pipeline = ServoPipeline::new(&Config::default());
        let frame = frame_with_rect(600, 600, (200, 200, 200, 200), [200, 200, 200]);
        let report = pipeline.tick(&frame).unwrap();
        assert_eq!(report.mask.count_set(), 0);
        assert!(report.output.hover);
    }

    #[test]
    fn test_source_resolution_is_rescaled() {
        let pipeline = ServoPipeline::new(&Config::default());
        let frame = frame_with_rect(960, 720, (0, 0, 10, 10), RED);
        let report = pipeline.tick(&frame).unwrap();
        assert_eq!((report.working.width, report.working.height), (600, 600));
        assert_eq!((report.mask.width, report.mask.height), (600, 600));
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let pipeline = ServoPipeline::new(&Config::default());
        let frame = Frame {
            data: Vec::new(),
            width: 0,
            height: 0,
            frame_id: 7,
            timestamp_ms: 0.0,
        };
        assert!(matches!(
            pipeline.tick(&frame),
            Err(FrameError::EmptyFrame { .. })
        ));
    }
}
