// src/preprocessing.rs
//
// Geometric and smoothing passes applied before color thresholding.
// All functions take interleaved 8-bit buffers and return freshly allocated
// ones; nothing is reused across ticks.

use image::RgbImage;
use imageproc::filter::gaussian_blur_f32;

/// Mirror an interleaved image left-to-right.
pub fn flip_horizontal(src: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut dst = vec![0u8; src.len()];
    let row_len = width * channels;

    for y in 0..height {
        let row = &src[y * row_len..(y + 1) * row_len];
        let out = &mut dst[y * row_len..(y + 1) * row_len];
        for x in 0..width {
            let mirrored = width - 1 - x;
            out[mirrored * channels..(mirrored + 1) * channels]
                .copy_from_slice(&row[x * channels..(x + 1) * channels]);
        }
    }

    dst
}

/// Bilinear image resize, pixel centers aligned (same sampling grid as
/// OpenCV's INTER_LINEAR). Resizing to the source size is an exact copy.
pub fn resize_bilinear(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    channels: usize,
) -> Vec<u8> {
    if src_w == dst_w && src_h == dst_h {
        return src.to_vec();
    }

    let mut dst = vec![0u8; dst_h * dst_w * channels];

    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h {
        let sy = ((dy as f32 + 0.5) * y_ratio - 0.5).max(0.0);
        let sy0 = (sy.floor() as usize).min(src_h - 1);
        let sy1 = (sy0 + 1).min(src_h - 1);
        let fy = sy - sy0 as f32;

        for dx in 0..dst_w {
            let sx = ((dx as f32 + 0.5) * x_ratio - 0.5).max(0.0);
            let sx0 = (sx.floor() as usize).min(src_w - 1);
            let sx1 = (sx0 + 1).min(src_w - 1);
            let fx = sx - sx0 as f32;

            for c in 0..channels {
                let p00 = src[(sy0 * src_w + sx0) * channels + c] as f32;
                let p10 = src[(sy0 * src_w + sx1) * channels + c] as f32;
                let p01 = src[(sy1 * src_w + sx0) * channels + c] as f32;
                let p11 = src[(sy1 * src_w + sx1) * channels + c] as f32;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                dst[(dy * dst_w + dx) * channels + c] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    dst
}

/// Gaussian blur for a square `ksize` kernel. Sigma follows OpenCV's rule
/// for an unspecified sigma; `imageproc` sizes the kernel from it.
pub fn gaussian_blur(image: &RgbImage, ksize: usize) -> RgbImage {
    if ksize <= 1 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    gaussian_blur_f32(image, kernel_sigma(ksize))
}

fn kernel_sigma(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_horizontal() {
        // 3x1 BGR: red, green, blue
        let src = vec![0, 0, 255, 0, 255, 0, 255, 0, 0];
        let flipped = flip_horizontal(&src, 3, 1, 3);
        assert_eq!(flipped, vec![255, 0, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_resize() {
        let src = vec![255u8; 100 * 100 * 3];
        let dst = resize_bilinear(&src, 100, 100, 50, 50, 3);
        assert_eq!(dst.len(), 50 * 50 * 3);
        assert!(dst.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_resize_reference_stream_to_working_size() {
        let src = vec![40u8; 960 * 720 * 3];
        let dst = resize_bilinear(&src, 960, 720, 600, 600, 3);
        assert_eq!(dst.len(), 600 * 600 * 3);
        assert!(dst.iter().all(|&v| v == 40));
    }

    #[test]
    fn test_resize_same_size_is_identity() {
        let src: Vec<u8> = (0..(7 * 5 * 3)).map(|v| (v * 3 % 256) as u8).collect();
        assert_eq!(resize_bilinear(&src, 7, 5, 7, 5, 3), src);
    }

    #[test]
    fn test_sigma_from_kernel_size() {
        assert!((kernel_sigma(11) - 2.0).abs() < 1e-6);
        assert!((kernel_sigma(3) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_blur_preserves_flat_image() {
        let src = RgbImage::from_pixel(20, 10, image::Rgb([90, 90, 90]));
        let blurred = gaussian_blur(&src, 11);
        assert_eq!(blurred.dimensions(), (20, 10));
        assert!(blurred.as_raw().iter().all(|&v| (89..=90).contains(&v)));
    }

    #[test]
    fn test_blur_softens_edge() {
        // Step: left half 0, right half 200
        let src = RgbImage::from_fn(20, 1, |x, _| {
            let v = if x < 10 { 0 } else { 200 };
            image::Rgb([v, v, v])
        });
        let blurred = gaussian_blur(&src, 5);
        assert!(blurred.get_pixel(0, 0)[0] <= 1);
        assert!(blurred.get_pixel(19, 0)[0] >= 199);
        let left = blurred.get_pixel(9, 0)[0];
        let right = blurred.get_pixel(10, 0)[0];
        assert!(left > 0 && left < 100, "left {left}");
        assert!(right > 100 && right < 200, "right {right}");
    }

    #[test]
    fn test_unit_kernel_is_identity() {
        let src = RgbImage::from_fn(4, 3, |x, y| image::Rgb([x as u8 * 40, y as u8 * 60, 7]));
        assert_eq!(gaussian_blur(&src, 1), src);
    }
}
