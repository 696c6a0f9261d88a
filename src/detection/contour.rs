// src/detection/contour.rs
//
// External contour extraction and best-blob selection.
//
// Borders come from `imageproc`'s border following, which also records the
// hierarchy: a border with no parent is external, anything else outlines a
// hole or a blob sitting inside one. Only external outer borders count.
//
// Area is the shoelace area of the border polygon through pixel centers, so
// a filled w x h rectangle encloses (w-1)*(h-1), while its bounding box
// (exclusive max corner) covers w*h.

use crate::types::{BoundingBox, Mask, Point, Region};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use tracing::debug;

const PAD: u32 = 1;

#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point>,
}

impl Contour {
    /// Enclosed polygon area (shoelace), always non-negative.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }

    /// Box around the traced pixels, max corner exclusive.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut min = Point::new(i32::MAX, i32::MAX);
        let mut max = Point::new(i32::MIN, i32::MIN);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        BoundingBox {
            min,
            max: Point::new(max.x + 1, max.y + 1),
        }
    }
}

/// Outer borders of every external foreground component, in raster order of
/// their first pixel.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour> {
    find_contours::<i32>(&padded_image(mask))
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour {
            points: c
                .points
                .into_iter()
                .map(|p| Point::new(p.x - PAD as i32, p.y - PAD as i32))
                .collect(),
        })
        .collect()
}

/// Mask with a background frame of `PAD` pixels, so blobs touching the image
/// edge still get a background neighbour to start their border from.
fn padded_image(mask: &Mask) -> GrayImage {
    let (w, h) = (mask.width as u32, mask.height as u32);
    GrayImage::from_fn(w + 2 * PAD, h + 2 * PAD, |x, y| {
        let inside = x >= PAD && y >= PAD && x < w + PAD && y < h + PAD;
        if inside {
            Luma([mask.data[(y - PAD) as usize * mask.width + (x - PAD) as usize]])
        } else {
            Luma([0])
        }
    })
}

/// Largest external contour, if its area is strictly above `min_area`.
/// On equal areas the first one in raster order wins.
pub fn select_best(mask: &Mask, min_area: f64) -> Option<Region> {
    let contours = find_external_contours(mask);

    let mut best: Option<(f64, &Contour)> = None;
    for contour in &contours {
        let area = contour.area();
        if area > best.map_or(min_area, |(a, _)| a) {
            best = Some((area, contour));
        }
    }

    let region = best.map(|(area, contour)| Region {
        contour: contour.points.clone(),
        contour_area: area,
        bbox: contour.bounding_box(),
    });

    match &region {
        Some(r) => debug!(
            "{} external contour(s), best area {} (min {}), box {}x{} at ({}, {})",
            contours.len(),
            r.contour_area,
            min_area,
            r.bbox.width(),
            r.bbox.height(),
            r.bbox.min.x,
            r.bbox.min.y
        ),
        None => debug!(
            "{} external contour(s), none above min area {}",
            contours.len(),
            min_area
        ),
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::mask_with_rects;

    #[test]
    fn test_rectangle_contour_follows_border_pixels() {
        let mask = mask_with_rects(20, 20, &[(3, 4, 6, 5)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);

        let c = &contours[0];
        // Every border pixel: 2*6 + 2*3
        let distinct: std::collections::HashSet<_> = c.points.iter().collect();
        assert_eq!(distinct.len(), 18);
        for corner in [(3, 4), (8, 4), (8, 8), (3, 8)] {
            assert!(c.points.contains(&Point::new(corner.0, corner.1)));
        }
        assert_eq!(c.area(), 5.0 * 4.0);
        assert_eq!(
            c.bounding_box(),
            BoundingBox {
                min: Point::new(3, 4),
                max: Point::new(9, 9)
            }
        );
    }

    #[test]
    fn test_single_pixel_and_line() {
        let mut mask = Mask::new(10, 10);
        mask.set(2, 2);
        for x in 5..9 {
            mask.set(x, 7);
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(contours[0].bounding_box().area(), 1);
        assert_eq!(contours[1].area(), 0.0);
        assert_eq!(contours[1].bounding_box().area(), 4);
    }

    #[test]
    fn test_diagonal_pixels_are_one_component() {
        let mut mask = Mask::new(6, 6);
        mask.set(1, 1);
        mask.set(2, 2);
        mask.set(3, 3);
        assert_eq!(find_external_contours(&mask).len(), 1);
    }

    #[test]
    fn test_non_convex_shape_area() {
        // L-shape: 10x3 bar plus 3x10 bar sharing the corner
        let mask = mask_with_rects(30, 30, &[(2, 2, 10, 3), (2, 2, 3, 10)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let bbox = contours[0].bounding_box();
        assert_eq!(bbox.area(), 100);
        // Pixel-center polygon, relative to (2,2):
        // (0,0)-(9,0)-(9,2)-(3,2)-(2,3)-(2,9)-(0,9)
        // The concave corner is cut diagonally, as 8-connected border following does.
        assert_eq!(contours[0].area(), 9.0 * 2.0 + 2.0 * 7.0 + 0.5);
    }

    #[test]
    fn test_blob_inside_hole_is_not_external() {
        // Ring 20x20 with a 12x12 hole, a 4x4 blob inside the hole
        let mut mask = mask_with_rects(40, 40, &[(5, 5, 20, 20)]);
        for y in 9..21 {
            for x in 9..21 {
                mask.data[y * 40 + x] = 0;
            }
        }
        for y in 13..17 {
            for x in 13..17 {
                mask.set(x, y);
            }
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_box().area(), 400);
    }

    #[test]
    fn test_select_best_recovers_blob_area() {
        let mask = mask_with_rects(600, 600, &[(100, 150, 120, 80), (400, 400, 10, 10)]);
        let region = select_best(&mask, 2000.0).expect("blob above threshold");
        assert_eq!(region.bbox.area(), 120 * 80);
        assert_eq!(region.bbox.min, Point::new(100, 150));
        assert_eq!(region.contour_area, 119.0 * 79.0);
    }

    #[test]
    fn test_select_best_rejects_small_blobs() {
        // 40x40 -> contour area 39*39 = 1521, below 2000
        let mask = mask_with_rects(600, 600, &[(10, 10, 40, 40), (300, 300, 30, 30)]);
        assert!(select_best(&mask, 2000.0).is_none());
        assert!(select_best(&Mask::new(600, 600), 2000.0).is_none());
    }

    #[test]
    fn test_select_best_threshold_is_strict() {
        // 51x41 -> 50*40 = 2000, exactly the threshold
        let mask = mask_with_rects(200, 200, &[(10, 10, 51, 41)]);
        assert!(select_best(&mask, 2000.0).is_none());
        assert!(select_best(&mask, 1999.0).is_some());
    }

    #[test]
    fn test_select_best_tie_goes_to_first_in_raster_order() {
        // Equal-area blobs; which one wins is an implementation choice.
        // Here the raster-first blob is kept.
        let mask = mask_with_rects(300, 300, &[(200, 20, 60, 60), (20, 150, 60, 60)]);
        let region = select_best(&mask, 100.0).unwrap();
        assert_eq!(region.bbox.min, Point::new(200, 20));
    }

    #[test]
    fn test_border_touching_blob_is_external() {
        let mask = mask_with_rects(50, 40, &[(0, 0, 10, 8), (40, 30, 10, 10)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].bounding_box().min, Point::new(0, 0));
        assert_eq!(contours[1].bounding_box().max, Point::new(50, 40));
    }

    #[test]
    fn test_select_best_on_densely_speckled_mask() {
        // 4x4 blobs on a 6 px grid fill the frame, one 100x100 block
        // swallows the blobs under it
        let rects: Vec<_> = (0..100)
            .flat_map(|gy| (0..100).map(move |gx| (gx * 6, gy * 6, 4, 4)))
            .collect();
        let mut mask = mask_with_rects(600, 600, &rects);
        for y in 240..340 {
            for x in 240..340 {
                mask.set(x, y);
            }
        }

        let started = std::time::Instant::now();
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 100 * 100 - 17 * 17 + 1);

        let region = select_best(&mask, 2000.0).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(region.bbox.min, Point::new(240, 240));
        assert_eq!(region.bbox.area(), 100 * 100);
        assert_eq!(region.contour_area, 99.0 * 99.0);
    }
}
