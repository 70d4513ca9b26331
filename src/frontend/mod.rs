// src/frontend/mod.rs - Frontend Module for the measurement session

pub mod app;
pub mod controls;
pub mod session;
pub mod shell;

pub use app::MeasureApp;
pub use controls::{Control, ControlParseError, HELP_TEXT};
pub use session::{MeasurementSession, PointOutcome, SessionError, SessionStatus};
pub use shell::{Shell, ShellExit, ShellSummary};

use crate::backend::{CaptureError, IngestError, StoreError};

/// Frontend-specific errors
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Control(#[from] ControlParseError),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}
