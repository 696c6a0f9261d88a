// src/test_utils.rs
//
// Synthetic inputs shared by unit tests.

use crate::actuator::Actuator;
use crate::control::{Axis, Direction, VelocityCommand};
use crate::types::{Frame, Mask};
use anyhow::{bail, Result};

/// Black BGR frame with one filled rectangle `(x, y, w, h)` of color `bgr`.
pub fn frame_with_rect(
    width: usize,
    height: usize,
    rect: (usize, usize, usize, usize),
    bgr: [u8; 3],
) -> Frame {
    let mut data = vec![0u8; width * height * 3];
    let (x0, y0, w, h) = rect;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let idx = (y * width + x) * 3;
            data[idx..idx + 3].copy_from_slice(&bgr);
        }
    }
    Frame {
        data,
        width,
        height,
        frame_id: 0,
        timestamp_ms: 0.0,
    }
}

pub fn mask_with_rects(width: usize, height: usize, rects: &[(usize, usize, usize, usize)]) -> Mask {
    let mut mask = Mask::new(width, height);
    for &(x0, y0, w, h) in rects {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.set(x, y);
            }
        }
    }
    mask
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    TakeOff,
    Velocity(VelocityCommand),
    Hover,
    Land,
}

/// Records every successful call; optionally rejects lateral commands.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    pub calls: Vec<ActuatorCall>,
    pub fail_lateral: bool,
}

impl RecordingActuator {
    fn record(&mut self, axis: Axis, direction: Direction, magnitude: u32) -> Result<()> {
        self.calls.push(ActuatorCall::Velocity(VelocityCommand::new(
            axis, direction, magnitude,
        )));
        Ok(())
    }
}

impl Actuator for RecordingActuator {
    fn take_off(&mut self) -> Result<()> {
        self.calls.push(ActuatorCall::TakeOff);
        Ok(())
    }

    fn set_lateral(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        if self.fail_lateral {
            bail!("lateral channel down");
        }
        self.record(Axis::Lateral, direction, magnitude)
    }

    fn set_vertical(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.record(Axis::Vertical, direction, magnitude)
    }

    fn set_longitudinal(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.record(Axis::Longitudinal, direction, magnitude)
    }

    fn hover(&mut self) -> Result<()> {
        self.calls.push(ActuatorCall::Hover);
        Ok(())
    }

    fn land(&mut self) -> Result<()> {
        self.calls.push(ActuatorCall::Land);
        Ok(())
    }
}
