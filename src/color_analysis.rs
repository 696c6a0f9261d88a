// src/color_analysis.rs
//
// HSV conversion and color-range thresholding.
//
// HSV is used instead of raw BGR because a painted target keeps roughly the
// same hue and saturation under changing light, while its brightness drifts.
// Values follow the OpenCV 8-bit convention so ranges tuned with OpenCV
// tools carry over unchanged:
//   H: 0-180 (degrees / 2), S: 0-255, V: 0-255

use crate::types::{ColorRange, Mask};

/// Convert one BGR pixel to 8-bit HSV.
#[inline]
pub fn bgr_to_hsv(b: u8, g: u8, r: u8) -> [u8; 3] {
    let (b, g, r) = (b as f32, g as f32, r as f32);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round().min(255.0) as u8,
        v as u8,
    ]
}

/// Convert an interleaved BGR buffer to interleaved HSV.
pub fn bgr_image_to_hsv(src: &[u8]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(src.len());
    for px in src.chunks_exact(3) {
        dst.extend_from_slice(&bgr_to_hsv(px[0], px[1], px[2]));
    }
    dst
}

/// Binary mask of every HSV pixel inside `range` (bounds inclusive).
pub fn in_range(hsv: &[u8], width: usize, height: usize, range: &ColorRange) -> Mask {
    let mut mask = Mask::new(width, height);
    for (i, px) in hsv.chunks_exact(3).enumerate() {
        if range.contains([px[0], px[1], px[2]]) {
            mask.data[i] = 255;
        }
    }
    mask
}
