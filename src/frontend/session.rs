// src/frontend/session.rs - Measurement session state

use crate::backend::types::{format_points, Frame, LineSegment, Measurement, Point};

/// Points kept per measurement
pub const MAX_POINTS: usize = 2;

/// Where the session stands in the load → select → measure flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    ImageLoaded,
    PointsReady,
    Measured,
    /// Detection found no line; manual selection still works
    DetectionFailed,
}

/// Result of offering a point to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOutcome {
    Accepted { index: usize },
    /// Two points already held; reset to pick again
    Ignored,
}

/// Session errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No image loaded")]
    NoImage,

    #[error("Point {point} is outside the {width}x{height} image")]
    OutOfBounds { point: Point, width: u32, height: u32 },

    #[error("Two points are needed to measure, {have} selected")]
    NeedTwoPoints { have: usize },

    #[error("Nothing to save: calculate a distance first")]
    NothingToSave,
}

/// One image, up to two points, and the measurement between them
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    frame: Option<Frame>,
    points: Vec<Point>,
    measurement: Option<Measurement>,
    status: SessionStatus,
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementSession {
    pub fn new() -> Self {
        Self {
            frame: None,
            points: Vec::with_capacity(MAX_POINTS),
            measurement: None,
            status: SessionStatus::Idle,
        }
    }

    /// Replace the current image; points and measurement start over
    pub fn load_frame(&mut self, frame: Frame) -> &Frame {
        self.points.clear();
        self.measurement = None;
        self.status = SessionStatus::ImageLoaded;
        self.frame.insert(frame)
    }

    /// Offer a selected point
    pub fn add_point(&mut self, point: Point) -> Result<PointOutcome, SessionError> {
        let frame = self.frame.as_ref().ok_or(SessionError::NoImage)?;
        if !frame.contains(point) {
            let (width, height) = frame.dimensions();
            return Err(SessionError::OutOfBounds { point, width, height });
        }
        if self.points.len() >= MAX_POINTS {
            return Ok(PointOutcome::Ignored);
        }

        self.points.push(point);
        self.measurement = None;
        self.status = if self.points.len() == MAX_POINTS {
            SessionStatus::PointsReady
        } else {
            SessionStatus::ImageLoaded
        };
        Ok(PointOutcome::Accepted {
            index: self.points.len() - 1,
        })
    }

    /// Take the endpoints of a detected segment, or enter the warning state
    pub fn apply_detection(&mut self, segment: Option<LineSegment>) -> Result<(), SessionError> {
        if self.frame.is_none() {
            return Err(SessionError::NoImage);
        }
        self.points.clear();
        self.measurement = None;
        match segment {
            Some(segment) => {
                self.points.extend([segment.start, segment.end]);
                self.status = SessionStatus::PointsReady;
            }
            None => self.status = SessionStatus::DetectionFailed,
        }
        Ok(())
    }

    /// Measure the held pair
    pub fn calculate(&mut self) -> Result<Measurement, SessionError> {
        if self.frame.is_none() {
            return Err(SessionError::NoImage);
        }
        match self.points.as_slice() {
            [start, end] => {
                let measurement = Measurement::new(*start, *end);
                self.measurement = Some(measurement);
                self.status = SessionStatus::Measured;
                Ok(measurement)
            }
            other => Err(SessionError::NeedTwoPoints { have: other.len() }),
        }
    }

    /// Drop points and measurement, keep the image
    pub fn reset_points(&mut self) {
        self.points.clear();
        self.measurement = None;
        self.status = if self.frame.is_some() {
            SessionStatus::ImageLoaded
        } else {
            SessionStatus::Idle
        };
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// One-line summary for the shell
    pub fn status_line(&self) -> String {
        let image = match &self.frame {
            Some(frame) => format!("{} from {}", frame.resolution_string(), frame.origin),
            None => "no image".to_string(),
        };
        let state = match self.status {
            SessionStatus::Idle => "load or capture an image".to_string(),
            SessionStatus::ImageLoaded => {
                format!("select points ({}/{})", self.points.len(), MAX_POINTS)
            }
            SessionStatus::PointsReady => "points ready, calculate to measure".to_string(),
            SessionStatus::Measured => match &self.measurement {
                Some(m) => format!("distance {}", m.label()),
                None => "measured".to_string(),
            },
            SessionStatus::DetectionFailed => {
                "No line detected - select points manually".to_string()
            }
        };
        format!("[{}] points {} | {}", image, format_points(&self.points), state)
    }
}
