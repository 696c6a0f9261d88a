// src/morphology.rs
//
// Binary erosion / dilation with a 3x3 square structuring element (L-inf
// radius 1), via `imageproc`. Pixels outside the image are ignored (they
// neither erode nor dilate), so a blob touching the border keeps its border
// pixels.

use crate::types::Mask;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Chebyshev radius of the structuring element
const RADIUS: u8 = 1;

/// Erode then dilate: removes specks smaller than the 3x3 element, keeps
/// blob shape.
pub fn open(mask: &Mask) -> Mask {
    Mask::from_image(morphology::open(&mask.to_image(), Norm::LInf, RADIUS))
}
