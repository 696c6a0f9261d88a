// src/detection/mod.rs

pub mod contour;
mod position_calculator;
mod segmenter;

// Re-export public APIs
pub use contour::select_best;
pub use position_calculator::estimate_error;
pub use segmenter::{Segmentation, Segmenter};
