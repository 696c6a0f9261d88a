// src/error.rs
//
// Per-tick failure taxonomy. None of these stop the control loop on their
// own: an unavailable source or a degenerate frame just skips the tick.
// "No target" is not an error at all, it is a normal control-law input.

use thiserror::Error;

/// Why a frame source could not deliver a frame this tick.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Nothing arrived in time, or the upstream hiccuped. Retry next tick.
    #[error("frame source unavailable: {0}")]
    Unavailable(String),

    /// A finite source (replay directory, closed stream) has no more frames.
    #[error("frame source exhausted")]
    Exhausted,
}

impl SourceError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Why a delivered frame could not be processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty frame ({width}x{height})")]
    EmptyFrame { width: usize, height: usize },

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
