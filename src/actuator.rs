// src/actuator.rs
//
// Vehicle-facing side of the loop. The transport to the vehicle lives in an
// external driver; actuators here either log commands (dry run) or emit them
// as JSON lines for that driver to consume.

use crate::control::{Axis, ControlOutput, Direction, VelocityCommand};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, warn};

/// Fire-and-forget command sink. Every call is idempotent.
pub trait Actuator {
    fn take_off(&mut self) -> Result<()>;
    fn set_lateral(&mut self, direction: Direction, magnitude: u32) -> Result<()>;
    fn set_vertical(&mut self, direction: Direction, magnitude: u32) -> Result<()>;
    fn set_longitudinal(&mut self, direction: Direction, magnitude: u32) -> Result<()>;
    fn hover(&mut self) -> Result<()>;
    fn land(&mut self) -> Result<()>;

    fn send(&mut self, command: &VelocityCommand) -> Result<()> {
        match command.axis {
            Axis::Lateral => self.set_lateral(command.direction, command.magnitude),
            Axis::Vertical => self.set_vertical(command.direction, command.magnitude),
            Axis::Longitudinal => self.set_longitudinal(command.direction, command.magnitude),
        }
    }

    /// Issue one tick's output: commands in order, then hover, then land.
    ///
    /// A failing call is logged and skipped; the rest of the tick still goes
    /// out, since a half-applied tick (a move without its paired stop) is
    /// worse than a missing command. Returns the number of failed calls.
    fn apply(&mut self, output: &ControlOutput) -> usize {
        let mut failures = 0;

        for command in &output.commands {
            if let Err(e) = self.send(command) {
                warn!(
                    "Failed to send {} {}: {:#}",
                    command.direction.label(command.axis),
                    command.magnitude,
                    e
                );
                failures += 1;
            }
        }

        if output.hover {
            if let Err(e) = self.hover() {
                warn!("Failed to send hover: {:#}", e);
                failures += 1;
            }
        }

        if output.land {
            if let Err(e) = self.land() {
                warn!("Failed to send land: {:#}", e);
                failures += 1;
            }
        }

        failures
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn take_off(&mut self) -> Result<()> {
        (**self).take_off()
    }
    fn set_lateral(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        (**self).set_lateral(direction, magnitude)
    }
    fn set_vertical(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        (**self).set_vertical(direction, magnitude)
    }
    fn set_longitudinal(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        (**self).set_longitudinal(direction, magnitude)
    }
    fn hover(&mut self) -> Result<()> {
        (**self).hover()
    }
    fn land(&mut self) -> Result<()> {
        (**self).land()
    }
}

// ============================================================================
// LOG ACTUATOR
// ============================================================================

/// Dry run: commands only reach the log.
#[derive(Debug, Default)]
pub struct LogActuator {
    landed: bool,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    fn velocity(&self, axis: Axis, direction: Direction, magnitude: u32) -> Result<()> {
        debug!("→ {} {}", direction.label(axis), magnitude);
        Ok(())
    }
}

impl Actuator for LogActuator {
    fn take_off(&mut self) -> Result<()> {
        info!("🛫 Take off");
        self.landed = false;
        Ok(())
    }

    fn set_lateral(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.velocity(Axis::Lateral, direction, magnitude)
    }

    fn set_vertical(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.velocity(Axis::Vertical, direction, magnitude)
    }

    fn set_longitudinal(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.velocity(Axis::Longitudinal, direction, magnitude)
    }

    fn hover(&mut self) -> Result<()> {
        debug!("→ hover");
        Ok(())
    }

    fn land(&mut self) -> Result<()> {
        if !self.landed {
            info!("🛬 Land");
            self.landed = true;
        }
        Ok(())
    }
}

// ============================================================================
// JSON LINES ACTUATOR
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Message {
    TakeOff,
    Velocity {
        axis: Axis,
        direction: Direction,
        label: &'static str,
        magnitude: u32,
    },
    Hover,
    Land,
}

/// One JSON object per command, newline-terminated and flushed immediately.
pub struct JsonLinesActuator<W: Write> {
    writer: W,
    sent: u64,
}

impl<W: Write> JsonLinesActuator<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, sent: 0 }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message).context("Failed to encode command")?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .context("Failed to write command")?;
        self.sent += 1;
        debug!("Command {} written", self.sent());
        Ok(())
    }

    fn velocity(&mut self, axis: Axis, direction: Direction, magnitude: u32) -> Result<()> {
        self.emit(&Message::Velocity {
            axis,
            direction,
            label: direction.label(axis),
            magnitude,
        })
    }
}

impl<W: Write> Actuator for JsonLinesActuator<W> {
    fn take_off(&mut self) -> Result<()> {
        self.emit(&Message::TakeOff)
    }

    fn set_lateral(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.velocity(Axis::Lateral, direction, magnitude)
    }

    fn set_vertical(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.velocity(Axis::Vertical, direction, magnitude)
    }

    fn set_longitudinal(&mut self, direction: Direction, magnitude: u32) -> Result<()> {
        self.velocity(Axis::Longitudinal, direction, magnitude)
    }

    fn hover(&mut self) -> Result<()> {
        self.emit(&Message::Hover)
    }

    fn land(&mut self) -> Result<()> {
        self.emit(&Message::Land)
    }
}
