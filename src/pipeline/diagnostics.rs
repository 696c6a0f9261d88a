// src/pipeline/diagnostics.rs
//
// Periodic snapshots of what the loop sees: the mask as PNG and the working
// frame, annotated with the selected contour, its box and the reference
// point, as JPEG.

use super::servo::TickReport;
use crate::types::{BoundingBox, Frame, Point};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use tracing::debug;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 128, 255]);
const REFERENCE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

pub struct SnapshotWriter {
    dir: PathBuf,
    every: u64,
    reference: Point,
}

impl SnapshotWriter {
    pub fn create(dir: impl AsRef<Path>, every: u64, reference: Point) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        Ok(Self {
            dir,
            every: every.max(1),
            reference,
        })
    }

    pub fn is_due(&self, tick: u64) -> bool {
        tick % self.every == 0
    }

    /// Writes both images for `report`; returns the annotated frame's path.
    pub fn write(&self, report: &TickReport) -> Result<PathBuf> {
        let mask_path = self.dir.join(format!("mask_{:06}.png", report.frame_id));
        report
            .mask
            .to_image()
            .save(&mask_path)
            .with_context(|| format!("Failed to write {}", mask_path.display()))?;

        let frame_path = self.dir.join(format!("frame_{:06}.jpg", report.frame_id));
        self.annotate(report)
            .save(&frame_path)
            .with_context(|| format!("Failed to write {}", frame_path.display()))?;

        debug!(
            "Snapshot written: {} ({} mask pixels)",
            frame_path.display(),
            report.mask.count_set()
        );
        Ok(frame_path)
    }

    fn annotate(&self, report: &TickReport) -> RgbImage {
        let mut canvas = rgb_image(&report.working);

        if let Some(region) = &report.region {
            draw_contour(&mut canvas, &region.contour, CONTOUR_COLOR);
            draw_box(&mut canvas, &region.bbox, BOX_COLOR);
            let center = region.bbox.center();
            draw_filled_circle_mut(&mut canvas, (center.x, center.y), 4, CENTER_COLOR);
        }

        draw_filled_circle_mut(
            &mut canvas,
            (self.reference.x, self.reference.y),
            6,
            REFERENCE_COLOR,
        );
        canvas
    }
}

fn rgb_image(frame: &Frame) -> RgbImage {
    RgbImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
        let idx = (y as usize * frame.width + x as usize) * Frame::CHANNELS;
        let bgr = &frame.data[idx..idx + 3];
        Rgb([bgr[2], bgr[1], bgr[0]])
    })
}

/// Closed polyline through `points`; segments off the canvas are clipped.
fn draw_contour(canvas: &mut RgbImage, points: &[Point], color: Rgb<u8>) {
    let as_f32 = |p: Point| (p.x as f32, p.y as f32);
    for w in points.windows(2) {
        draw_line_segment_mut(canvas, as_f32(w[0]), as_f32(w[1]), color);
    }
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        draw_line_segment_mut(canvas, as_f32(last), as_f32(first), color);
    }
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    if bbox.width() <= 0 || bbox.height() <= 0 {
        return;
    }
    // Max corner is exclusive, same as `Rect`
    let rect = Rect::at(bbox.min.x, bbox.min.y).of_size(bbox.width() as u32, bbox.height() as u32);
    draw_hollow_rect_mut(canvas, rect, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ServoPipeline;
    use crate::test_utils::frame_with_rect;
    use crate::types::Config;

    #[test]
    fn test_writes_mask_and_annotated_frame() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let pipeline = ServoPipeline::new(&config);
        let mut frame = frame_with_rect(600, 600, (350, 100, 100, 100), [0, 0, 255]);
        frame.frame_id = 42;
        let report = pipeline.tick(&frame).unwrap();

        let writer =
            SnapshotWriter::create(dir.path().join("snaps"), 10, pipeline.reference_point())
                .unwrap();
        let frame_path = writer.write(&report).unwrap();

        assert!(frame_path.ends_with("frame_000042.jpg"));
        let mask = image::open(dir.path().join("snaps/mask_000042.png"))
            .unwrap()
            .to_luma8();
        assert_eq!(mask.dimensions(), (600, 600));
        assert_eq!(mask.get_pixel(200, 150).0, [255]);
        assert_eq!(mask.get_pixel(10, 10).0, [0]);
        assert!(image::open(frame_path).is_ok());
    }

    #[test]
    fn test_annotation_marks_reference_and_box() {
        let config = Config::default();
        let pipeline = ServoPipeline::new(&config);
        let report = pipeline
            .tick(&frame_with_rect(600, 600, (350, 100, 100, 100), [0, 0, 255]))
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path(), 1, Point::new(300, 300)).unwrap();

        let canvas = writer.annotate(&report);
        assert_eq!(*canvas.get_pixel(300, 300), REFERENCE_COLOR);
        let bbox = report.region.unwrap().bbox;
        assert_eq!(
            *canvas.get_pixel(bbox.min.x as u32, (bbox.min.y + bbox.max.y) as u32 / 2),
            BOX_COLOR
        );
    }

    #[test]
    fn test_snapshot_interval() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::create(dir.path(), 30, Point::new(0, 0)).unwrap();
        assert!(writer.is_due(0));
        assert!(!writer.is_due(29));
        assert!(writer.is_due(60));
    }

    #[test]
    fn test_contour_is_closed_and_clipped() {
        let mut canvas = RgbImage::new(5, 5);
        let square = [
            Point::new(1, 1),
            Point::new(3, 1),
            Point::new(3, 3),
            Point::new(1, 3),
        ];
        draw_contour(&mut canvas, &square, CONTOUR_COLOR);
        // Closing segment from the last point back to the first
        assert_eq!(*canvas.get_pixel(1, 2), CONTOUR_COLOR);
        assert_eq!(*canvas.get_pixel(2, 2), Rgb([0, 0, 0]));

        let mut canvas = RgbImage::new(5, 5);
        draw_contour(&mut canvas, &[Point::new(-3, 2), Point::new(9, 2)], BOX_COLOR);
        assert_eq!(*canvas.get_pixel(0, 2), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(4, 2), BOX_COLOR);
    }

    #[test]
    fn test_box_outline_uses_exclusive_corner() {
        let mut canvas = RgbImage::new(10, 10);
        let bbox = BoundingBox {
            min: Point::new(2, 2),
            max: Point::new(6, 5),
        };
        draw_box(&mut canvas, &bbox, BOX_COLOR);
        assert_eq!(*canvas.get_pixel(5, 4), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(6, 4), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(3, 3), Rgb([0, 0, 0]));
    }
}
