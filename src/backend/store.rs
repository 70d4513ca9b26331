// src/backend/store.rs - Measurement artifacts on disk

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::types::{format_points, FrameOrigin, Measurement, Point};
use crate::config::StoreSettings;

/// Artifact file stem prefix
const ARTIFACT_PREFIX: &str = "measurement";

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot encode annotated image {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot serialize measurement record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Paths written by one save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub timestamp: String,
    pub text_path: PathBuf,
    pub image_path: PathBuf,
    pub json_path: Option<PathBuf>,
}

/// JSON form of a saved measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub timestamp: String,
    pub saved_at: DateTime<Local>,
    pub points: Vec<Point>,
    pub distance_px: f64,
    pub label: String,
    pub source: Option<FrameOrigin>,
}

/// Writes timestamp-correlated text, image and JSON artifacts
pub struct MeasurementStore {
    output_dir: PathBuf,
    write_json: bool,
}

impl MeasurementStore {
    /// Create a new store from settings
    pub fn new(settings: &StoreSettings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            write_json: settings.write_json,
        }
    }

    /// Directory artifacts are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Redirect artifacts to another directory
    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.output_dir = dir.into();
    }

    /// Save using the current local time
    pub fn save(
        &self,
        measurement: &Measurement,
        annotated: &RgbImage,
        source: Option<&FrameOrigin>,
    ) -> Result<SavedArtifacts, StoreError> {
        self.save_at(measurement, annotated, source, Local::now())
    }

    /// Save with an explicit timestamp; all artifacts share it
    pub fn save_at(
        &self,
        measurement: &Measurement,
        annotated: &RgbImage,
        source: Option<&FrameOrigin>,
        now: DateTime<Local>,
    ) -> Result<SavedArtifacts, StoreError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| StoreError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let timestamp = timestamp_label(&now);
        let stem = self.free_stem(&timestamp);
        let text_path = self.output_dir.join(format!("{}.txt", stem));
        let image_path = self.output_dir.join(format!("{}.png", stem));
        let json_path = self
            .write_json
            .then(|| self.output_dir.join(format!("{}.json", stem)));

        // Image first, then the records
        if let Err(err) = annotated.save_with_format(&image_path, ImageFormat::Png) {
            remove_partial(&[image_path.as_path()]);
            return Err(StoreError::Encode {
                path: image_path,
                source: err,
            });
        }

        let record = MeasurementRecord {
            timestamp: timestamp.clone(),
            saved_at: now,
            points: measurement.points().to_vec(),
            distance_px: measurement.distance,
            label: measurement.label(),
            source: source.cloned(),
        };
        if let Err(e) = write_records(&record, measurement, &text_path, json_path.as_deref()) {
            remove_partial(&[image_path.as_path(), text_path.as_path()]);
            return Err(e);
        }

        info!(
            "💾 Measurement saved as {} and {}",
            text_path.display(),
            image_path.display()
        );

        Ok(SavedArtifacts {
            timestamp,
            text_path,
            image_path,
            json_path,
        })
    }
}

impl MeasurementStore {
    /// First `measurement_<ts>[_N]` stem with no text or image artifact on disk
    fn free_stem(&self, timestamp: &str) -> String {
        let base = format!("{}_{}", ARTIFACT_PREFIX, timestamp);
        let taken = |stem: &str| {
            ["txt", "png"]
                .iter()
                .any(|ext| self.output_dir.join(format!("{}.{}", stem, ext)).exists())
        };
        if !taken(&base) {
            return base;
        }
        (1u32..)
            .map(|n| format!("{}_{}", base, n))
            .find(|stem| !taken(stem))
            .unwrap_or(base)
    }
}

fn write_records(
    record: &MeasurementRecord,
    measurement: &Measurement,
    text_path: &Path,
    json_path: Option<&Path>,
) -> Result<(), StoreError> {
    std::fs::write(text_path, render_record(measurement)).map_err(|source| StoreError::Write {
        path: text_path.to_path_buf(),
        source,
    })?;

    if let Some(path) = json_path {
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(path, json).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Drop artifacts of a failed save so no half-written set is left behind
fn remove_partial(paths: &[&Path]) {
    for path in paths {
        if path.is_file() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("⚠️ Cannot remove partial artifact {}: {}", path.display(), e);
            }
        }
    }
}

/// `YYYYMMDD_HHMMSS`
pub fn timestamp_label(now: &DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Text record body
pub fn render_record(measurement: &Measurement) -> String {
    format!(
        "Points: {}\nDistance: {}",
        format_points(&measurement.points()),
        measurement.label()
    )
}
