// src/control/law.rs
//
// Banded proportional control law.
//
// Maps one tick's error vector to velocity commands on three axes plus the
// hover / land flags. Pure: the output depends only on the input and the
// band tables, nothing is carried between ticks.

use super::bands::{first_match, AxisBands, ControlConfig, RangeState};
use super::command::{Axis, ControlOutput, Direction, VelocityCommand};
use crate::types::ErrorVector;
use tracing::debug;

pub struct ControlLaw {
    config: ControlConfig,
}

impl ControlLaw {
    pub fn new(config: ControlConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, error: Option<&ErrorVector>) -> ControlOutput {
        let Some(error) = error else {
            return Self::hold_position();
        };

        let mut output = ControlOutput::default();

        Self::signed_axis(
            Axis::Lateral,
            &self.config.lateral,
            error.dx,
            &mut output.commands,
        );
        Self::signed_axis(
            Axis::Vertical,
            &self.config.vertical,
            error.dy,
            &mut output.commands,
        );
        output.range = self.range_axis(error.area, &mut output.commands);
        // Too small to trust: zero the whole vehicle after the axis commands
        if output.range == Some(RangeState::TooSmall) {
            output.hover = true;
        }

        // Safety cutoff, independent of whatever the range axis decided
        if error.area > self.config.land_area_threshold {
            debug!(
                "Target area {} above land threshold {}",
                error.area, self.config.land_area_threshold
            );
            output.land = true;
        }

        output
    }

    /// No target: neutral on every axis and hover.
    fn hold_position() -> ControlOutput {
        ControlOutput {
            commands: vec![
                VelocityCommand::neutral(Axis::Lateral),
                VelocityCommand::neutral(Axis::Vertical),
                VelocityCommand::neutral(Axis::Longitudinal),
            ],
            hover: true,
            land: false,
            range: None,
        }
    }

    /// One signed axis: cancel the opposite direction, then pick a band.
    /// An offset of exactly 0 issues nothing.
    fn signed_axis(axis: Axis, bands: &AxisBands, offset: i32, out: &mut Vec<VelocityCommand>) {
        let (direction, opposite, table) = match offset {
            0 => return,
            o if o < 0 => (Direction::Negative, Direction::Positive, &bands.negative),
            _ => (Direction::Positive, Direction::Negative, &bands.positive),
        };

        out.push(VelocityCommand::stop(axis, opposite));

        match first_match(table, i64::from(offset)) {
            Some(band) => {
                debug!(
                    "{:?} offset {} -> {} {}",
                    axis,
                    offset,
                    direction.label(axis),
                    band.magnitude
                );
                out.push(VelocityCommand::new(axis, direction, band.magnitude));
            }
            None => debug!("{:?} offset {}: no decision", axis, offset),
        }
    }

    fn range_axis(&self, area: i64, out: &mut Vec<VelocityCommand>) -> Option<RangeState> {
        let Some(range) = self
            .config
            .longitudinal
            .iter()
            .find(|r| r.band.contains(area))
        else {
            debug!("Target area {}: no decision", area);
            return None;
        };

        debug!("Target area {} -> {}", area, range.state.as_str());

        let axis = Axis::Longitudinal;
        match range.state {
            RangeState::TooSmall => out.push(VelocityCommand::neutral(axis)),
            RangeState::TooFar => {
                out.push(VelocityCommand::new(axis, Direction::Positive, range.band.magnitude))
            }
            RangeState::TooClose => {
                out.push(VelocityCommand::new(axis, Direction::Negative, range.band.magnitude))
            }
            RangeState::JustRight => {
                out.push(VelocityCommand::stop(axis, Direction::Positive));
                out.push(VelocityCommand::stop(axis, Direction::Negative));
            }
        }

        Some(range.state)
    }
}

impl Default for ControlLaw {
    fn default() -> Self {
        Self::new(ControlConfig::default())
    }
}
