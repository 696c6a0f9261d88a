// src/detection/position_calculator.rs
use crate::types::{ErrorVector, Point, Region};

/// Offset of the region's box center from `reference`, and the box area.
///
/// Positive `dx` means the target sits left of the reference point in the
/// (mirrored) working frame, positive `dy` means it sits above it.
pub fn estimate_error(region: &Region, reference: Point) -> ErrorVector {
    let center = region.bbox.center();

    ErrorVector {
        dx: reference.x - center.x,
        dy: reference.y - center.y,
        area: region.bbox.area(),
    }
}
