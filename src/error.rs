// src/error.rs - Error Handling for Cement Measure

use std::fmt;

use crate::backend::{CaptureError, IngestError, StoreError};
use crate::config::ConfigError;
use crate::frontend::{ControlParseError, FrontendError, SessionError};

/// Main error type for the Cement Measure application
#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    /// Camera and frame source errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Image decoding errors
    #[error("Image error: {0}")]
    Ingest(#[from] IngestError),

    /// Session state errors (no image, bad point, nothing to save)
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Artifact writing errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Settings file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Unparseable user control
    #[error("Control error: {0}")]
    Control(#[from] ControlParseError),

    /// Configuration errors not tied to a file
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("Error in {context}: {source}")]
    WithContext {
        context: String,
        source: Box<MeasureError>,
    },
}

impl From<FrontendError> for MeasureError {
    fn from(error: FrontendError) -> Self {
        match error {
            FrontendError::Session(e) => MeasureError::Session(e),
            FrontendError::Capture(e) => MeasureError::Capture(e),
            FrontendError::Ingest(e) => MeasureError::Ingest(e),
            FrontendError::Store(e) => MeasureError::Store(e),
            FrontendError::Control(e) => MeasureError::Control(e),
            FrontendError::Io(e) => MeasureError::FileSystem(e),
        }
    }
}

impl MeasureError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        MeasureError::Configuration(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        MeasureError::Validation(msg.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        MeasureError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MeasureError::FileSystem(_) | MeasureError::Store(_) => ErrorSeverity::High,

            MeasureError::Config(_) | MeasureError::Configuration(_) => ErrorSeverity::High,

            MeasureError::Capture(_) | MeasureError::Ingest(_) | MeasureError::Json(_) => {
                ErrorSeverity::Medium
            }

            MeasureError::Session(_)
            | MeasureError::Control(_)
            | MeasureError::Validation(_) => ErrorSeverity::Low,

            MeasureError::WithContext { source, .. } => source.severity(),
        }
    }

    /// Get suggested user action for this error
    pub fn suggested_action(&self) -> &'static str {
        match self {
            MeasureError::Capture(CaptureError::CameraUnavailable { .. }) => {
                "Check that a camera is connected, or build with the `camera` feature"
            }
            MeasureError::Capture(_) => "Reconnect the camera and capture again",
            MeasureError::Ingest(_) => "Check that the file is a readable JPEG or PNG image",
            MeasureError::Session(SessionError::NoImage) => "Load or capture an image first",
            MeasureError::Session(SessionError::OutOfBounds { .. }) => {
                "Pick a point inside the image"
            }
            MeasureError::Session(SessionError::NeedTwoPoints { .. }) => {
                "Select two points or run detection"
            }
            MeasureError::Session(SessionError::NothingToSave) => "Calculate a distance before saving",
            MeasureError::Store(_) | MeasureError::FileSystem(_) => {
                "Check output directory permissions and disk space"
            }
            MeasureError::Config(_) | MeasureError::Configuration(_) => {
                "Check the configuration file and command line arguments"
            }
            MeasureError::Control(_) => "Type 'help' for the list of controls",
            MeasureError::Validation(_) => "Correct the input and try again",
            MeasureError::WithContext { source, .. } => source.suggested_action(),
            _ => "Try again or run with --verbose for details",
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            MeasureError::Capture(_) => ErrorCategory::Capture,
            MeasureError::Ingest(_) => ErrorCategory::Image,
            MeasureError::Session(_) | MeasureError::Control(_) => ErrorCategory::Session,
            MeasureError::Store(_) => ErrorCategory::Storage,
            MeasureError::Config(_)
            | MeasureError::Configuration(_)
            | MeasureError::Validation(_) => ErrorCategory::Configuration,
            MeasureError::FileSystem(_) => ErrorCategory::System,
            MeasureError::WithContext { source, .. } => source.category(),
            _ => ErrorCategory::Other,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            MeasureError::Capture(CaptureError::CameraUnavailable { index, .. }) => {
                format!("Camera {} could not be opened.", index)
            }
            MeasureError::Capture(_) => "Reading from the camera failed.".to_string(),
            MeasureError::Ingest(_) => "The image could not be decoded.".to_string(),
            MeasureError::Session(e) => e.to_string(),
            MeasureError::Store(_) => "The measurement could not be saved.".to_string(),
            MeasureError::Config(_) | MeasureError::Configuration(_) => {
                "Configuration error. Please check your settings and try again.".to_string()
            }
            MeasureError::WithContext { context, source } => {
                format!("{}: {}", context, source.user_message())
            }
            _ => format!("An error occurred: {}", self),
        }
    }

    /// Get error code for scripts and logs
    pub fn error_code(&self) -> u32 {
        match self {
            MeasureError::Capture(_) => 1000,
            MeasureError::Ingest(_) => 2000,
            MeasureError::Session(_) => 3000,
            MeasureError::Control(_) => 3100,
            MeasureError::Store(_) => 4000,
            MeasureError::Config(_) => 5000,
            MeasureError::Configuration(_) => 5100,
            MeasureError::Validation(_) => 5300,
            MeasureError::FileSystem(_) => 7000,
            MeasureError::Json(_) => 7100,
            MeasureError::WithContext { source, .. } => source.error_code(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Minimal impact; the user can retry immediately
    Low,
    /// The current operation failed
    Medium,
    /// The application cannot do what was asked
    High,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Capture,
    Image,
    Session,
    Storage,
    Configuration,
    System,
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Capture => write!(f, "CAPTURE"),
            ErrorCategory::Image => write!(f, "IMAGE"),
            ErrorCategory::Session => write!(f, "SESSION"),
            ErrorCategory::Storage => write!(f, "STORAGE"),
            ErrorCategory::Configuration => write!(f, "CONFIGURATION"),
            ErrorCategory::System => write!(f, "SYSTEM"),
            ErrorCategory::Other => write!(f, "OTHER"),
        }
    }
}

/// Result type alias for measurement operations
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Extension trait for Results to add context
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context(self, context: impl Into<String>) -> MeasureResult<T>;

    /// Add context using a closure (for lazy evaluation)
    fn with_context_lazy<F>(self, f: F) -> MeasureResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<MeasureError>,
{
    fn with_context(self, context: impl Into<String>) -> MeasureResult<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context_lazy<F>(self, f: F) -> MeasureResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

/// Logs errors with their code, category and suggested action
pub struct ErrorReporter {
    enable_logging: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(enable_logging: bool) -> Self {
        Self { enable_logging }
    }

    /// Report an error
    pub fn report(&self, error: &MeasureError) {
        if self.enable_logging {
            self.log_error(error);
        }
    }

    fn log_error(&self, error: &MeasureError) {
        use tracing::{error, info, warn};

        let severity = error.severity();
        let category = error.category();
        let code = error.error_code();

        match severity {
            ErrorSeverity::High => {
                error!(
                    error_code = code,
                    category = %category,
                    severity = %severity,
                    "{} | Action: {}",
                    error,
                    error.suggested_action()
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = code,
                    category = %category,
                    severity = %severity,
                    "{} | Action: {}",
                    error,
                    error.suggested_action()
                );
            }
            ErrorSeverity::Low => {
                info!(
                    error_code = code,
                    category = %category,
                    severity = %severity,
                    "{} | Action: {}",
                    error,
                    error.suggested_action()
                );
            }
        }
    }
}
