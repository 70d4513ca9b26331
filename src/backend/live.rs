// src/backend/live.rs - Continuous capture, detection and overlay loop

use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::RgbImage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::annotator::Annotator;
use crate::backend::camera::{CaptureError, FrameSource, SourceGuard};
use crate::backend::line_detector::LineDetector;
use crate::backend::types::{Frame, LineSegment, Measurement};
use crate::config::LiveSettings;
use crate::perf::PerformanceMonitor;

/// Samples kept for the FPS window
const PERF_SAMPLES: usize = 120;

/// Longest single sleep between cancellation checks
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Live loop options
#[derive(Debug, Clone)]
pub struct LiveOptions {
    /// Stop after this many frames
    pub max_frames: Option<u64>,
    /// Minimum time between frame reads
    pub frame_interval: Duration,
    /// Annotated preview written here every `preview_every` frames
    pub preview_path: Option<PathBuf>,
    pub preview_every: u64,
}

impl LiveOptions {
    pub fn from_settings(settings: &LiveSettings) -> Self {
        Self {
            max_frames: None,
            frame_interval: Duration::from_millis(settings.frame_interval_ms),
            preview_path: None,
            preview_every: settings.preview_every.max(1),
        }
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    Cancelled,
    FrameLimit,
    SourceExhausted,
    ReadFailed(String),
}

impl ExitReason {
    /// Short name without the failure detail
    pub fn label(&self) -> &'static str {
        match self {
            ExitReason::Cancelled => "cancelled",
            ExitReason::FrameLimit => "frame limit",
            ExitReason::SourceExhausted => "source exhausted",
            ExitReason::ReadFailed(_) => "read failure",
        }
    }

    /// Normal stop, as opposed to a device failure
    pub fn is_clean(&self) -> bool {
        !matches!(self, ExitReason::ReadFailed(_))
    }
}

/// Result of a live session
#[derive(Debug)]
pub struct LiveOutcome {
    pub frames: u64,
    pub detections: u64,
    pub last_frame: Option<Frame>,
    pub last_segment: Option<LineSegment>,
    /// Frame the last segment was found on
    pub detected_frame: Option<Frame>,
    pub exit: ExitReason,
    pub average_fps: f64,
    pub average_processing: Duration,
}

impl LiveOutcome {
    /// Measurement for the last detected segment, if any
    pub fn last_measurement(&self) -> Option<Measurement> {
        self.last_segment.map(Measurement::from)
    }
}

/// Read, detect, annotate until cancelled, limited or the source fails.
///
/// The source is released on every exit path, including panics in the
/// detector, through its [`SourceGuard`].
pub fn run_live_loop(
    source: Box<dyn FrameSource>,
    detector: &LineDetector,
    annotator: &Annotator,
    options: &LiveOptions,
    cancel: &CancellationToken,
) -> LiveOutcome {
    let mut guard = SourceGuard::new(source);
    let mut monitor = PerformanceMonitor::new(PERF_SAMPLES);
    let mut frames = 0u64;
    let mut detections = 0u64;
    let mut last_frame: Option<Frame> = None;
    let mut last_segment: Option<LineSegment> = None;
    let mut detected_frame: Option<Frame> = None;
    let mut last_annotated: Option<RgbImage> = None;
    let mut preview_warned = false;

    info!("🎥 Live loop started on {}", guard.name());

    let exit = loop {
        if cancel.is_cancelled() {
            break ExitReason::Cancelled;
        }

        let tick = Instant::now();
        let image = match guard.read_frame() {
            Ok(image) => image,
            Err(CaptureError::Exhausted) => break ExitReason::SourceExhausted,
            Err(e) => {
                debug!("🎥 Frame read failed after {} frames", frames);
                break ExitReason::ReadFailed(e.to_string());
            }
        };

        frames += 1;
        let frame = Frame::new(image, guard.origin()).with_sequence(frames);
        let segment = detector.detect(frame.image());
        let annotated = match segment {
            Some(segment) => {
                detections += 1;
                last_segment = Some(segment);
                detected_frame = Some(frame.clone());
                annotator.annotate(&frame, &Measurement::from(segment))
            }
            None => frame.to_image(),
        };
        monitor.record_frame(tick.elapsed());

        if let Some(path) = &options.preview_path {
            if frames % options.preview_every.max(1) == 0 {
                if let Err(e) = annotated.save(path) {
                    if !preview_warned {
                        warn!("⚠️ Cannot write preview {}: {}", path.display(), e);
                        preview_warned = true;
                    }
                }
            }
        }

        if frames % 30 == 0 {
            debug!(
                "🎥 {} frames, {:.1} FPS, {} detections",
                frames,
                monitor.fps(),
                detections
            );
        }

        last_frame = Some(frame);
        last_annotated = Some(annotated);

        if options.max_frames.is_some_and(|max| frames >= max) {
            break ExitReason::FrameLimit;
        }

        let spent = tick.elapsed();
        if spent < options.frame_interval {
            pause(options.frame_interval - spent, cancel);
        }
    };

    guard.release();

    // Final preview reflects the last processed frame
    if let (Some(path), Some(annotated)) = (&options.preview_path, &last_annotated) {
        if let Err(e) = annotated.save(path) {
            warn!("⚠️ Cannot write preview {}: {}", path.display(), e);
        }
    }

    let outcome = LiveOutcome {
        frames,
        detections,
        last_frame,
        last_segment,
        detected_frame,
        exit,
        average_fps: monitor.fps(),
        average_processing: monitor.average_processing_time(),
    };

    info!(
        "🎥 Live loop stopped ({}) after {} frames, {} detections, {:.1} FPS",
        outcome.exit.label(),
        outcome.frames,
        outcome.detections,
        outcome.average_fps
    );

    outcome
}

/// Sleep for up to `duration`, waking early once `cancel` fires
fn pause(duration: Duration, cancel: &CancellationToken) {
    let deadline = Instant::now() + duration;
    while !cancel.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::camera::tests::MockSource;
    use crate::config::{AnnotationStyle, DetectionSettings};
    use image::Rgb;
    use std::sync::atomic::Ordering;

    fn options(max_frames: Option<u64>) -> LiveOptions {
        LiveOptions {
            max_frames,
            frame_interval: Duration::ZERO,
            preview_path: None,
            preview_every: 1,
        }
    }

    fn blank(n: usize) -> Vec<RgbImage> {
        (0..n).map(|_| RgbImage::from_pixel(32, 32, Rgb([90, 90, 90]))).collect()
    }

    fn tools() -> (LineDetector, Annotator) {
        (
            LineDetector::new(DetectionSettings::default()),
            Annotator::new(AnnotationStyle::default()),
        )
    }

    #[test]
    fn test_stops_at_frame_limit_and_releases() {
        let (detector, annotator) = tools();
        let (source, releases) = MockSource::new(blank(10));
        let outcome = run_live_loop(
            Box::new(source),
            &detector,
            &annotator,
            &options(Some(3)),
            &CancellationToken::new(),
        );

        assert_eq!(outcome.exit, ExitReason::FrameLimit);
        assert_eq!(outcome.frames, 3);
        assert_eq!(outcome.detections, 0);
        assert_eq!(outcome.last_frame.as_ref().map(|f| f.sequence), Some(3));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(detector.stats().runs, 3);
    }

    #[test]
    fn test_cancelled_before_first_frame() {
        let (detector, annotator) = tools();
        let (source, releases) = MockSource::new(blank(5));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = run_live_loop(Box::new(source), &detector, &annotator, &options(None), &cancel);

        assert_eq!(outcome.exit, ExitReason::Cancelled);
        assert_eq!(outcome.frames, 0);
        assert!(outcome.last_frame.is_none());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_failure_terminates_once() {
        let (detector, annotator) = tools();
        let (mut source, releases) = MockSource::new(blank(5));
        source.fail_at = Some(2);

        let outcome = run_live_loop(Box::new(source), &detector, &annotator, &options(None), &CancellationToken::new());

        assert!(matches!(outcome.exit, ExitReason::ReadFailed(_)));
        assert!(!outcome.exit.is_clean());
        assert_eq!(outcome.frames, 2);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exhausted_source_and_preview() {
        let (detector, annotator) = tools();
        let dir = tempfile::tempdir().unwrap();
        let preview = dir.path().join("preview.png");
        let mut bar = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        for y in 48..53 {
            for x in 20..80 {
                bar.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        let (source, releases) = MockSource::new(vec![bar]);
        let opts = LiveOptions {
            preview_path: Some(preview.clone()),
            ..options(None)
        };

        let outcome = run_live_loop(Box::new(source), &detector, &annotator, &opts, &CancellationToken::new());

        assert_eq!(outcome.exit, ExitReason::SourceExhausted);
        assert_eq!(outcome.frames, 1);
        assert_eq!(outcome.detections, 1);
        assert!(outcome.last_measurement().is_some());
        assert_eq!(outcome.detected_frame.as_ref().map(|f| f.sequence), Some(1));
        assert!(preview.exists());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_interrupts_long_frame_interval() {
        let (detector, annotator) = tools();
        let (source, releases) = MockSource::new(blank(5));
        let opts = LiveOptions {
            frame_interval: Duration::from_secs(60),
            ..options(None)
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let outcome = run_live_loop(Box::new(source), &detector, &annotator, &opts, &cancel);
        canceller.join().unwrap();

        assert_eq!(outcome.exit, ExitReason::Cancelled);
        assert_eq!(outcome.frames, 1);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exit_label_omits_failure_detail() {
        let exit = ExitReason::ReadFailed("Cannot open image /tmp/bad.png".to_string());
        assert_eq!(exit.label(), "read failure");
        assert_eq!(ExitReason::FrameLimit.label(), "frame limit");
    }
}
