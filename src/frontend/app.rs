// src/frontend/app.rs - Measurement application: session plus backend services

use std::path::Path;

use image::RgbImage;
use tracing::{info, warn};

use crate::backend::{
    self, Annotator, FrameSource, LineDetector, LineSegment, Measurement, MeasurementStore, Point,
    SavedArtifacts,
};
use crate::backend::types::Frame;
use crate::config::MeasureConfig;
use crate::frontend::session::{MeasurementSession, PointOutcome, SessionError};
use crate::frontend::FrontendError;

/// Drives one measurement session against the detector, annotator and store
pub struct MeasureApp {
    session: MeasurementSession,
    detector: LineDetector,
    annotator: Annotator,
    store: MeasurementStore,
    camera_index: u32,
}

impl MeasureApp {
    /// Create a new application from settings
    pub fn new(config: &MeasureConfig) -> Self {
        Self {
            session: MeasurementSession::new(),
            detector: LineDetector::new(config.detection.clone()),
            annotator: Annotator::new(config.annotation.clone()),
            store: MeasurementStore::new(&config.store),
            camera_index: config.camera_index,
        }
    }

    /// Decode an image file and make it the current frame
    pub fn load_path(&mut self, path: &Path) -> Result<&Frame, FrontendError> {
        let frame = backend::load_image(path)?;
        Ok(self.load_frame(frame))
    }

    /// Make `frame` current; previous points are dropped
    pub fn load_frame(&mut self, frame: Frame) -> &Frame {
        self.session.load_frame(frame)
    }

    /// Single-shot capture from the configured camera
    pub fn capture(&mut self) -> Result<&Frame, FrontendError> {
        let source = backend::open_camera(self.camera_index)?;
        self.capture_from(source)
    }

    /// Single-shot capture from any source; the source is released afterwards
    pub fn capture_from(&mut self, source: Box<dyn FrameSource>) -> Result<&Frame, FrontendError> {
        let frame = backend::capture_still(source)?;
        Ok(self.load_frame(frame))
    }

    /// Select a point on the current frame
    pub fn click(&mut self, point: Point) -> Result<PointOutcome, FrontendError> {
        let outcome = self.session.add_point(point)?;
        match outcome {
            PointOutcome::Accepted { index } => info!("📍 Point {} selected at {}", index + 1, point),
            PointOutcome::Ignored => warn!("⚠️ Two points already selected, {} ignored", point),
        }
        Ok(outcome)
    }

    /// Run line detection on the current frame and take its endpoints
    pub fn detect(&mut self) -> Result<Option<LineSegment>, FrontendError> {
        let frame = self.session.frame().ok_or(SessionError::NoImage)?;
        let segment = self.detector.detect(frame.image());
        if segment.is_none() {
            warn!("⚠️ No line detected - select points manually");
        }
        self.session.apply_detection(segment)?;
        Ok(segment)
    }

    /// Measure the selected pair
    pub fn calculate(&mut self) -> Result<Measurement, FrontendError> {
        let measurement = self.session.calculate()?;
        info!("📏 Distance {} between {} and {}", measurement.label(), measurement.start, measurement.end);
        Ok(measurement)
    }

    /// Annotated copy of the current frame, reflecting whatever is selected
    pub fn annotated(&self) -> Option<RgbImage> {
        let frame = self.session.frame()?;
        Some(match self.session.measurement() {
            Some(measurement) => self.annotator.annotate(frame, measurement),
            None => self.annotator.mark_points(frame, self.session.points()),
        })
    }

    /// Persist the current measurement
    pub fn save(&self) -> Result<SavedArtifacts, FrontendError> {
        let frame = self.session.frame().ok_or(SessionError::NoImage)?;
        let measurement = self.session.measurement().ok_or(SessionError::NothingToSave)?;
        let annotated = self.annotator.annotate(frame, measurement);
        Ok(self.store.save(measurement, &annotated, Some(&frame.origin))?)
    }

    /// Clear points and measurement
    pub fn reset(&mut self) {
        self.session.reset_points();
        info!("🔄 Points cleared");
    }

    pub fn session(&self) -> &MeasurementSession {
        &self.session
    }

    pub fn detector(&self) -> &LineDetector {
        &self.detector
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    pub fn store(&self) -> &MeasurementStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MeasurementStore {
        &mut self.store
    }
}
