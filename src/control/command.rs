// src/control/command.rs

use super::bands::RangeState;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Left / right
    Lateral,
    /// Up / down
    Vertical,
    /// Forward / back
    Longitudinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Right, up, forward
    Positive,
    /// Left, down, backward
    Negative,
    /// Neutral
    None,
}

impl Direction {
    /// Human-readable name of this direction on `axis`.
    pub fn label(&self, axis: Axis) -> &'static str {
        match (axis, self) {
            (_, Direction::None) => "neutral",
            (Axis::Lateral, Direction::Positive) => "right",
            (Axis::Lateral, Direction::Negative) => "left",
            (Axis::Vertical, Direction::Positive) => "up",
            (Axis::Vertical, Direction::Negative) => "down",
            (Axis::Longitudinal, Direction::Positive) => "forward",
            (Axis::Longitudinal, Direction::Negative) => "backward",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VelocityCommand {
    pub axis: Axis,
    pub direction: Direction,
    pub magnitude: u32,
}

impl VelocityCommand {
    pub const fn new(axis: Axis, direction: Direction, magnitude: u32) -> Self {
        Self {
            axis,
            direction,
            magnitude,
        }
    }

    pub const fn neutral(axis: Axis) -> Self {
        Self::new(axis, Direction::None, 0)
    }

    /// Zero-speed command in `direction`, used to cancel motion that way.
    pub const fn stop(axis: Axis, direction: Direction) -> Self {
        Self::new(axis, direction, 0)
    }
}

/// Everything the control law decided for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlOutput {
    /// Issued in order
    pub commands: Vec<VelocityCommand>,
    pub hover: bool,
    pub land: bool,
    /// Longitudinal band that matched, if any
    pub range: Option<RangeState>,
}

impl ControlOutput {
    /// Last non-zero command on `axis`, i.e. the motion the tick asks for.
    pub fn motion(&self, axis: Axis) -> Option<&VelocityCommand> {
        self.commands
            .iter()
            .rev()
            .find(|c| c.axis == axis && c.magnitude > 0)
    }

    #[cfg(test)]
    pub fn commands_for(&self, axis: Axis) -> impl Iterator<Item = &VelocityCommand> {
        self.commands.iter().filter(move |c| c.axis == axis)
    }
}
