// src/control/mod.rs

pub mod bands;
mod command;
mod law;

// Re-export public APIs
pub use bands::{ControlConfig, RangeState};
pub use command::{Axis, ControlOutput, Direction, VelocityCommand};
pub use law::ControlLaw;
