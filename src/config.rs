// src/config.rs - Settings file for Cement Measure

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Full application configuration, persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub annotation: AnnotationStyle,
    pub detection: DetectionSettings,
    pub store: StoreSettings,
    pub live: LiveSettings,
    /// Camera device index used by `capture` and `live`
    pub camera_index: u32,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            annotation: AnnotationStyle::default(),
            detection: DetectionSettings::default(),
            store: StoreSettings::default(),
            live: LiveSettings::default(),
            camera_index: 0,
        }
    }
}

/// How measurements are drawn onto the annotated copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub marker_radius: u32,
    pub marker_color: [u8; 3],
    pub line_thickness: u32,
    pub line_color: [u8; 3],
    /// Pixel size of one glyph cell
    pub font_scale: u32,
    pub text_color: [u8; 3],
    pub text_outline: Option<[u8; 3]>,
    /// Label distance above the segment midpoint
    pub label_offset: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            marker_radius: 5,
            marker_color: [0, 255, 0],
            line_thickness: 2,
            line_color: [255, 0, 0],
            font_scale: 2,
            text_color: [255, 255, 255],
            text_outline: Some([0, 0, 0]),
            label_offset: 10,
        }
    }
}

/// Edge and line detection tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Extra Gaussian blur before Canny; 0 disables it
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    pub min_line_length: u32,
    pub max_line_gap: u32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            blur_sigma: 0.0,
            canny_low: 50.0,
            canny_high: 150.0,
            vote_threshold: 40,
            suppression_radius: 8,
            min_line_length: 30,
            max_line_gap: 10,
        }
    }
}

/// Where and how measurement artifacts are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub output_dir: PathBuf,
    /// Also write a JSON record next to the text and image artifacts
    pub write_json: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            write_json: false,
        }
    }
}

/// Live capture loop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    pub frame_interval_ms: u64,
    /// Write the preview image every N frames
    pub preview_every: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33,
            preview_every: 15,
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    UserDefault(PathBuf),
    BuiltIn,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

impl MeasureConfig {
    /// Load configuration from an explicit path, the user config dir, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(path) = explicit {
            let config = Self::from_file(path)?;
            return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
        }

        if let Some(path) = Self::default_path() {
            if path.exists() {
                let config = Self::from_file(&path)?;
                return Ok((config, ConfigSource::UserDefault(path)));
            }
            debug!("📁 No config file at {}, using defaults", path.display());
        }

        Ok((Self::default(), ConfigSource::BuiltIn))
    }

    /// Read and validate a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("📁 Settings loaded from {}", path.display());
        Ok(config)
    }

    /// Parse configuration JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Export configuration as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let json = self
            .to_json()
            .map_err(|e| ConfigError::Invalid(format!("cannot serialize settings: {}", e)))?;
        std::fs::write(path, json).map_err(write_err)?;
        info!("📁 Settings saved to {}", path.display());
        Ok(())
    }

    /// Reject settings that would break drawing or detection
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.annotation;
        if a.font_scale == 0 {
            return Err(ConfigError::Invalid("annotation.font_scale must be at least 1".into()));
        }
        if a.line_thickness == 0 {
            return Err(ConfigError::Invalid("annotation.line_thickness must be at least 1".into()));
        }
        if a.marker_radius > 256 {
            return Err(ConfigError::Invalid("annotation.marker_radius too large (max 256)".into()));
        }

        let d = &self.detection;
        if !d.blur_sigma.is_finite() || d.blur_sigma < 0.0 {
            return Err(ConfigError::Invalid("detection.blur_sigma must be >= 0".into()));
        }
        if !(d.canny_low > 0.0 && d.canny_low <= d.canny_high) {
            return Err(ConfigError::Invalid(
                "detection.canny_low must be positive and not above canny_high".into(),
            ));
        }
        if d.vote_threshold == 0 {
            return Err(ConfigError::Invalid("detection.vote_threshold must be greater than 0".into()));
        }
        if d.min_line_length == 0 {
            return Err(ConfigError::Invalid("detection.min_line_length must be greater than 0".into()));
        }

        if self.live.preview_every == 0 {
            return Err(ConfigError::Invalid("live.preview_every must be greater than 0".into()));
        }

        Ok(())
    }

    /// Per-user config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cement-measure").join("config.json"))
    }
}
