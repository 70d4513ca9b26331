// src/backend/annotator.rs - Burns measurement overlays into image copies

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use tracing::debug;

use crate::backend::geometry::midpoint;
use crate::backend::glyphs;
use crate::backend::types::{Frame, Measurement, Point};
use crate::config::AnnotationStyle;

/// Draws point markers, the connecting line and the distance label.
///
/// The source frame is never touched; every call renders onto a fresh copy.
pub struct Annotator {
    style: AnnotationStyle,
}

impl Annotator {
    /// Create a new annotator
    pub fn new(style: AnnotationStyle) -> Self {
        Self { style }
    }

    /// Active style
    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    /// Annotated copy of `frame` for a completed measurement
    pub fn annotate(&self, frame: &Frame, measurement: &Measurement) -> RgbImage {
        let mut canvas = frame.to_image();
        self.draw_measurement(&mut canvas, measurement);
        debug!(
            "🖍️ Annotated {} frame with {}",
            frame.resolution_string(),
            measurement.label()
        );
        canvas
    }

    /// Copy of `frame` with markers only, for points not yet measured
    pub fn mark_points(&self, frame: &Frame, points: &[Point]) -> RgbImage {
        let mut canvas = frame.to_image();
        for point in points {
            self.draw_marker(&mut canvas, *point);
        }
        canvas
    }

    /// Draw a complete measurement overlay onto `canvas`
    pub fn draw_measurement(&self, canvas: &mut RgbImage, measurement: &Measurement) {
        self.draw_marker(canvas, measurement.start);
        self.draw_marker(canvas, measurement.end);
        self.draw_line(canvas, measurement.start, measurement.end);
        self.draw_label(canvas, measurement);
    }

    fn draw_marker(&self, canvas: &mut RgbImage, point: Point) {
        draw_filled_circle_mut(
            canvas,
            (point.x as i32, point.y as i32),
            self.style.marker_radius as i32,
            Rgb(self.style.marker_color),
        );
    }

    /// Thick line as parallel one-pixel strokes offset along the normal
    fn draw_line(&self, canvas: &mut RgbImage, start: Point, end: Point) {
        let color = Rgb(self.style.line_color);
        let (x1, y1) = start.as_f32();
        let (x2, y2) = end.as_f32();
        let length = (x2 - x1).hypot(y2 - y1);
        if length == 0.0 {
            return;
        }

        let normal = (-(y2 - y1) / length, (x2 - x1) / length);
        let thickness = self.style.line_thickness.max(1);
        let center = (thickness - 1) as f32 / 2.0;
        for i in 0..thickness {
            let offset = i as f32 - center;
            let (ox, oy) = (normal.0 * offset, normal.1 * offset);
            draw_line_segment_mut(canvas, (x1 + ox, y1 + oy), (x2 + ox, y2 + oy), color);
        }
    }

    /// Label sits `label_offset` pixels above the midpoint, kept inside the canvas
    fn draw_label(&self, canvas: &mut RgbImage, measurement: &Measurement) {
        let text = measurement.label();
        let scale = self.style.font_scale.max(1);
        let (text_w, text_h) = glyphs::text_size(&text, scale);
        let (width, height) = canvas.dimensions();
        let (x, y) = label_origin(
            midpoint(measurement.start, measurement.end),
            (text_w, text_h),
            (width, height),
            self.style.label_offset,
        );

        if let Some(outline) = self.style.text_outline {
            let outline = Rgb(outline);
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                glyphs::draw_text(canvas, &text, x + dx, y + dy, scale, outline);
            }
        }
        glyphs::draw_text(canvas, &text, x, y, scale, Rgb(self.style.text_color));
    }
}

/// Top-left corner of a label whose bottom edge sits `offset` above `anchor`
fn label_origin(anchor: Point, text: (u32, u32), canvas: (u32, u32), offset: u32) -> (i32, i32) {
    let x = anchor.x as i64;
    let y = anchor.y as i64 - offset as i64 - text.1 as i64;
    let max_x = (canvas.0 as i64 - text.0 as i64).max(0);
    let max_y = (canvas.1 as i64 - text.1 as i64).max(0);
    (x.clamp(0, max_x) as i32, y.clamp(0, max_y) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::FrameOrigin;

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::new(RgbImage::from_pixel(width, height, Rgb([40, 40, 40])), FrameOrigin::Memory)
    }

    #[test]
    fn test_annotate_leaves_source_untouched() {
        let frame = gray_frame(120, 80);
        let before = frame.to_image();
        let annotator = Annotator::new(AnnotationStyle::default());
        let measurement = Measurement::new(Point::new(10, 60), Point::new(110, 60));

        let annotated = annotator.annotate(&frame, &measurement);

        assert_eq!(frame.image(), &before);
        assert_ne!(&annotated, &before);
        assert_eq!(annotated.dimensions(), (120, 80));
    }

    #[test]
    fn test_markers_and_line_colors() {
        let frame = gray_frame(120, 80);
        let style = AnnotationStyle::default();
        let annotator = Annotator::new(style.clone());
        let measurement = Measurement::new(Point::new(10, 60), Point::new(110, 60));

        let annotated = annotator.annotate(&frame, &measurement);

        // Below the line but inside the start marker
        assert_eq!(annotated.get_pixel(10, 64), &Rgb(style.marker_color));
        assert_eq!(annotated.get_pixel(60, 60), &Rgb(style.line_color));
    }

    #[test]
    fn test_mark_points_without_measurement() {
        let frame = gray_frame(50, 50);
        let style = AnnotationStyle::default();
        let annotator = Annotator::new(style.clone());
        let marked = annotator.mark_points(&frame, &[Point::new(25, 25)]);
        assert_eq!(marked.get_pixel(25, 25), &Rgb(style.marker_color));
        assert_eq!(marked.get_pixel(0, 0), &Rgb([40, 40, 40]));
    }

    #[test]
    fn test_label_origin_clamps_to_canvas() {
        // Plenty of room: bottom edge sits offset above the anchor
        assert_eq!(label_origin(Point::new(50, 60), (40, 14), (200, 200), 10), (50, 36));
        // Near the top edge the label is pushed down to y = 0
        assert_eq!(label_origin(Point::new(5, 3), (40, 14), (200, 200), 10), (5, 0));
        // Near the right edge the label is pulled left
        assert_eq!(label_origin(Point::new(190, 100), (40, 14), (200, 200), 10), (160, 76));
        // Label wider than the canvas starts at 0
        assert_eq!(label_origin(Point::new(3, 50), (400, 14), (20, 100), 10), (0, 26));
    }

    #[test]
    fn test_degenerate_measurement_does_not_panic() {
        let frame = gray_frame(30, 30);
        let annotator = Annotator::new(AnnotationStyle::default());
        let measurement = Measurement::new(Point::new(29, 29), Point::new(29, 29));
        let annotated = annotator.annotate(&frame, &measurement);
        assert_eq!(annotated.get_pixel(29, 29), &Rgb(AnnotationStyle::default().marker_color));
    }
}
