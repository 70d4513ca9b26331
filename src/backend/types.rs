// src/backend/types.rs - Data types for pixel measurement

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local};
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::backend::geometry;

/// A pixel coordinate on the loaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Check whether the point lies inside a `width` x `height` raster
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }

    /// Point as float pair for drawing
    pub fn as_f32(&self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Error returned when a `X,Y` coordinate string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid point '{input}': expected X,Y with non-negative integers")]
pub struct PointParseError {
    pub input: String,
}

impl FromStr for Point {
    type Err = PointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PointParseError { input: s.to_string() };
        let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
        let (x, y) = trimmed.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse::<u32>().map_err(|_| err())?;
        let y = y.trim().parse::<u32>().map_err(|_| err())?;
        Ok(Point::new(x, y))
    }
}

/// Format a point list the way measurement records show it: `[(2, 3), (8, 3)]`
pub fn format_points(points: &[Point]) -> String {
    let inner = points
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", inner)
}

/// A straight segment found by line detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Segment length in pixels
    pub fn length(&self) -> f64 {
        geometry::distance(self.start, self.end)
    }
}

/// Distance between exactly two points, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub start: Point,
    pub end: Point,
    pub distance: f64,
}

impl Measurement {
    /// Measure the distance between two points
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            distance: geometry::distance(start, end),
        }
    }

    /// Both endpoints in selection order
    pub fn points(&self) -> [Point; 2] {
        [self.start, self.end]
    }

    /// Label drawn on annotated images and written to records
    pub fn label(&self) -> String {
        format!("{:.2} pixels", self.distance)
    }
}

impl From<LineSegment> for Measurement {
    fn from(segment: LineSegment) -> Self {
        Measurement::new(segment.start, segment.end)
    }
}

/// Where a frame came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameOrigin {
    File(PathBuf),
    Camera(String),
    Memory,
}

impl fmt::Display for FrameOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameOrigin::File(path) => write!(f, "file {}", path.display()),
            FrameOrigin::Camera(name) => write!(f, "camera {}", name),
            FrameOrigin::Memory => write!(f, "memory"),
        }
    }
}

/// Decoded RGB raster owned by the current workflow.
///
/// Pixels sit behind an `Arc` so the session, the live loop and the
/// annotator can share one buffer; annotation always draws on a clone.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: Arc<RgbImage>,
    pub origin: FrameOrigin,
    pub sequence: u64,
    pub captured_at: DateTime<Local>,
}

impl Frame {
    /// Wrap a decoded image
    pub fn new(image: RgbImage, origin: FrameOrigin) -> Self {
        Self {
            pixels: Arc::new(image),
            origin,
            sequence: 0,
            captured_at: Local::now(),
        }
    }

    /// Tag the frame with its position in a capture stream
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Read-only access to the pixels
    pub fn image(&self) -> &RgbImage {
        &self.pixels
    }

    /// Owned copy of the pixels for drawing
    pub fn to_image(&self) -> RgbImage {
        (*self.pixels).clone()
    }

    /// Frame dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Check whether a point falls inside this frame
    pub fn contains(&self, point: Point) -> bool {
        let (width, height) = self.dimensions();
        point.is_within(width, height)
    }

    /// Get resolution as string
    pub fn resolution_string(&self) -> String {
        let (width, height) = self.dimensions();
        format!("{}x{}", width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_display_and_list_format() {
        assert_eq!(Point::new(2, 3).to_string(), "(2, 3)");
        assert_eq!(
            format_points(&[Point::new(2, 3), Point::new(8, 3)]),
            "[(2, 3), (8, 3)]"
        );
        assert_eq!(format_points(&[]), "[]");
    }

    #[test]
    fn test_point_parsing() {
        assert_eq!("2,3".parse::<Point>().unwrap(), Point::new(2, 3));
        assert_eq!(" 10 , 20 ".parse::<Point>().unwrap(), Point::new(10, 20));
        assert_eq!("(4,5)".parse::<Point>().unwrap(), Point::new(4, 5));
        assert!("2".parse::<Point>().is_err());
        assert!("-1,3".parse::<Point>().is_err());
        assert!("a,b".parse::<Point>().is_err());
    }

    #[test]
    fn test_measurement_label() {
        let m = Measurement::new(Point::new(0, 0), Point::new(3, 4));
        assert_eq!(m.label(), "5.00 pixels");
        assert_eq!(m.points(), [Point::new(0, 0), Point::new(3, 4)]);

        let same = Measurement::new(Point::new(10, 10), Point::new(10, 10));
        assert_eq!(same.label(), "0.00 pixels");
    }

    #[test]
    fn test_frame_bounds() {
        let frame = Frame::new(RgbImage::new(4, 3), FrameOrigin::Memory);
        assert_eq!(frame.dimensions(), (4, 3));
        assert_eq!(frame.resolution_string(), "4x3");
        assert!(frame.contains(Point::new(3, 2)));
        assert!(!frame.contains(Point::new(4, 0)));
        assert!(!frame.contains(Point::new(0, 3)));
    }
}
