// src/lib.rs - Cement Measure Library

//! # Cement Measure
//!
//! Pixel distance measurement on still images and camera frames.
//!
//! ## Features
//!
//! - **Two-point measurement**: Euclidean distance in pixels, formatted to two decimals
//! - **Line detection**: Canny edges plus Hough lines pick the two points automatically
//! - **Annotation**: markers, connecting line and distance label drawn on a copy of the image
//! - **Persistence**: timestamped text record and annotated PNG (optional JSON)
//! - **Camera capture**: single-shot or a live loop with cancellation
//!
//! ## Architecture
//!
//! - **Backend**: geometry, image ingest, detection, annotation, storage and frame sources
//! - **Frontend**: the measurement session, user controls and the interactive shell
//!
//! ## Usage
//!
//! ```no_run
//! use cement_measure::{config::MeasureConfig, frontend::MeasureApp, Point};
//!
//! fn main() -> Result<(), cement_measure::MeasureError> {
//!     let config = MeasureConfig::default();
//!     let mut app = MeasureApp::new(&config);
//!
//!     app.load_path(std::path::Path::new("sample.jpg"))?;
//!     app.click(Point::new(120, 40))?;
//!     app.click(Point::new(480, 40))?;
//!     let measurement = app.calculate()?;
//!     println!("Distance: {}", measurement.label());
//!
//!     app.save()?;
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]

// Public modules
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod frontend;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

// Re-exports for convenience
pub use backend::{
    geometry::distance,
    types::{Frame, FrameOrigin, LineSegment, Measurement, Point},
    Annotator, LineDetector, MeasurementStore,
};

pub use cli::{Args, LogLevel};
pub use config::MeasureConfig;
pub use error::MeasureError;
pub use frontend::{MeasureApp, MeasurementSession};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information
pub const BUILD_INFO: BuildInfo = BuildInfo {
    version: VERSION,
    git_hash: match option_env!("GIT_HASH") {
        Some(hash) => hash,
        None => "unknown",
    },
    target_os: std::env::consts::OS,
    target_arch: std::env::consts::ARCH,
    profile: if cfg!(debug_assertions) { "debug" } else { "release" },
    camera: cfg!(feature = "camera"),
};

/// Build information structure
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Git commit hash, when provided at build time
    pub git_hash: &'static str,
    /// Target operating system
    pub target_os: &'static str,
    /// Target architecture
    pub target_arch: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
    /// Native camera support compiled in
    pub camera: bool,
}

impl BuildInfo {
    /// Get formatted build information string
    pub fn formatted(&self) -> String {
        format!(
            "Cement Measure v{} ({}) for {}-{} ({}, camera {})",
            self.version,
            self.git_hash,
            self.target_os,
            self.target_arch,
            self.profile,
            if self.camera { "enabled" } else { "disabled" }
        )
    }
}

/// Initialize logging with the specified level, optionally into a file
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: LogLevel, log_file: Option<&Path>) -> Result<(), MeasureError> {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("cement_measure={}", level.as_filter())))
        .map_err(|e| MeasureError::Configuration(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true);

    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    MeasureError::Configuration(format!(
                        "Cannot open log file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| MeasureError::Configuration(format!("Failed to initialize logging: {}", e)))
}

/// Performance monitoring utilities
pub mod perf {
    use std::collections::VecDeque;
    use std::time::{Duration, Instant};

    /// Rolling window of frame timestamps and processing times
    #[derive(Debug)]
    pub struct PerformanceMonitor {
        frame_times: VecDeque<Instant>,
        processing_times: VecDeque<Duration>,
        max_samples: usize,
    }

    impl PerformanceMonitor {
        /// Create a new performance monitor
        pub fn new(max_samples: usize) -> Self {
            let max_samples = max_samples.max(2);
            Self {
                frame_times: VecDeque::with_capacity(max_samples),
                processing_times: VecDeque::with_capacity(max_samples),
                max_samples,
            }
        }

        /// Record a frame processing event
        pub fn record_frame(&mut self, processing_time: Duration) {
            self.frame_times.push_back(Instant::now());
            self.processing_times.push_back(processing_time);

            if self.frame_times.len() > self.max_samples {
                self.frame_times.pop_front();
                self.processing_times.pop_front();
            }
        }

        /// Frames per second over the window
        pub fn fps(&self) -> f64 {
            let (Some(first), Some(last)) = (self.frame_times.front(), self.frame_times.back()) else {
                return 0.0;
            };
            let time_span = last.duration_since(*first);
            if self.frame_times.len() < 2 || time_span.is_zero() {
                return 0.0;
            }

            (self.frame_times.len() - 1) as f64 / time_span.as_secs_f64()
        }

        /// Calculate average processing time
        pub fn average_processing_time(&self) -> Duration {
            if self.processing_times.is_empty() {
                return Duration::ZERO;
            }

            let total: Duration = self.processing_times.iter().sum();
            total / self.processing_times.len() as u32
        }

        /// Frames currently in the window
        pub fn samples(&self) -> usize {
            self.frame_times.len()
        }

        /// Reset all statistics
        pub fn reset(&mut self) {
            self.frame_times.clear();
            self.processing_times.clear();
        }
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info() {
        let info = BUILD_INFO;
        assert!(!info.version.is_empty());
        assert!(info.profile == "debug" || info.profile == "release");

        let formatted = info.formatted();
        assert!(formatted.contains("Cement Measure"));
        assert!(formatted.contains(info.version));
    }

    #[test]
    fn test_reexported_distance() {
        assert_eq!(format!("{:.2}", distance(Point::new(0, 0), Point::new(3, 4))), "5.00");
    }

    #[test]
    fn test_performance_monitor() {
        use perf::PerformanceMonitor;
        use std::time::Duration;

        let mut monitor = PerformanceMonitor::new(3);

        assert_eq!(monitor.fps(), 0.0);
        assert_eq!(monitor.average_processing_time(), Duration::ZERO);

        monitor.record_frame(Duration::from_millis(10));
        assert_eq!(monitor.fps(), 0.0);
        monitor.record_frame(Duration::from_millis(20));
        monitor.record_frame(Duration::from_millis(30));
        monitor.record_frame(Duration::from_millis(40));

        assert_eq!(monitor.samples(), 3);
        assert_eq!(monitor.average_processing_time(), Duration::from_millis(30));

        monitor.reset();
        assert_eq!(monitor.samples(), 0);
    }
}
