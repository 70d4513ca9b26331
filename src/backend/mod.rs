// src/backend/mod.rs - Backend Module for Image Measurement

pub mod annotator;
pub mod camera;
pub mod geometry;
pub mod glyphs;
pub mod ingest;
pub mod line_detector;
pub mod live;
pub mod store;
pub mod types;

pub use annotator::Annotator;
pub use camera::{capture_still, open_camera, CaptureError, FrameSource, SourceGuard, StillImageSource};
pub use ingest::{decode_image, load_image, IngestError};
pub use line_detector::{DetectionStats, LineDetector};
pub use live::{run_live_loop, ExitReason, LiveOptions, LiveOutcome};
pub use store::{MeasurementStore, SavedArtifacts, StoreError};
pub use types::*;
