// src/backend/camera.rs - Frame sources and device lifecycle

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use image::RgbImage;
use tracing::{debug, info};

use crate::backend::ingest::{self, IngestError};
use crate::backend::types::{Frame, FrameOrigin};

/// Capture errors
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera {index} unavailable: {reason}")]
    CameraUnavailable { index: u32, reason: String },

    #[error("Frame read failed: {0}")]
    ReadFailed(String),

    #[error("Frame source exhausted")]
    Exhausted,

    #[error("Frame source has no images")]
    NoFrames,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Anything that yields RGB frames
pub trait FrameSource {
    /// Human-readable source name
    fn name(&self) -> String;

    /// Read the next frame
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError>;

    /// Release the underlying device. Must be safe to call on an idle source.
    fn release(&mut self);

    /// Origin tag for frames read from this source
    fn origin(&self) -> FrameOrigin {
        FrameOrigin::Camera(self.name())
    }
}

/// Owns a frame source and releases it exactly once when dropped
pub struct SourceGuard {
    source: Box<dyn FrameSource>,
    released: bool,
}

impl SourceGuard {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        debug!("📷 Acquired frame source {}", source.name());
        Self {
            source,
            released: false,
        }
    }

    /// Release now instead of waiting for drop
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
            info!("📷 Released frame source {}", self.source.name());
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Deref for SourceGuard {
    type Target = dyn FrameSource;

    fn deref(&self) -> &Self::Target {
        self.source.as_ref()
    }
}

impl DerefMut for SourceGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.source.as_mut()
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Replays image files as frames
pub struct StillImageSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
}

impl StillImageSource {
    pub fn new(paths: Vec<PathBuf>) -> Result<Self, CaptureError> {
        if paths.is_empty() {
            return Err(CaptureError::NoFrames);
        }
        Ok(Self {
            paths,
            cursor: 0,
            looping: false,
        })
    }

    /// Start over from the first file instead of reporting exhaustion
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl FrameSource for StillImageSource {
    fn name(&self) -> String {
        format!("stills[{}]", self.paths.len())
    }

    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        if self.cursor >= self.paths.len() {
            if !self.looping {
                return Err(CaptureError::Exhausted);
            }
            self.cursor = 0;
        }
        let path = &self.paths[self.cursor];
        self.cursor += 1;
        let frame = ingest::load_image(path)?;
        Ok(frame.to_image())
    }

    fn release(&mut self) {
        self.cursor = self.paths.len();
    }

    fn origin(&self) -> FrameOrigin {
        let index = self.cursor.saturating_sub(1).min(self.paths.len() - 1);
        FrameOrigin::File(self.paths[index].clone())
    }
}

/// Native camera device
#[cfg(feature = "camera")]
pub struct CameraSource {
    camera: nokhwa::Camera,
    index: u32,
    name: String,
    streaming: bool,
}

#[cfg(feature = "camera")]
impl CameraSource {
    /// Open device `index` and start streaming
    pub fn new(index: u32) -> Result<Self, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

        let unavailable = |e: nokhwa::NokhwaError| CaptureError::CameraUnavailable {
            index,
            reason: e.to_string(),
        };

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera =
            nokhwa::Camera::new(CameraIndex::Index(index), requested).map_err(unavailable)?;
        camera.open_stream().map_err(unavailable)?;

        let name = camera.info().human_name();
        let resolution = camera.resolution();
        info!(
            "📷 Opened camera {} ({}) at {}x{}",
            index,
            name,
            resolution.width(),
            resolution.height()
        );

        Ok(Self {
            camera,
            index,
            name,
            streaming: true,
        })
    }
}

#[cfg(feature = "camera")]
impl FrameSource for CameraSource {
    fn name(&self) -> String {
        format!("{} (#{})", self.name, self.index)
    }

    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        use nokhwa::pixel_format::RgbFormat;

        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::ReadFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::ReadFailed(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| CaptureError::ReadFailed("frame buffer size mismatch".to_string()))
    }

    fn release(&mut self) {
        if self.streaming {
            self.streaming = false;
            if let Err(e) = self.camera.stop_stream() {
                tracing::error!("❌ Failed to stop camera stream: {}", e);
            }
        }
    }
}

/// Open camera `index` as a frame source. Failures are returned, not logged;
/// the caller reports them.
#[cfg(feature = "camera")]
pub fn open_camera(index: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
    let source = CameraSource::new(index)?;
    Ok(Box::new(source))
}

/// Open camera `index` as a frame source
#[cfg(not(feature = "camera"))]
pub fn open_camera(index: u32) -> Result<Box<dyn FrameSource>, CaptureError> {
    debug!("📷 Camera {} requested in a build without camera support", index);
    Err(CaptureError::CameraUnavailable {
        index,
        reason: "built without the `camera` feature".to_string(),
    })
}

/// Read a single frame and release the source, whatever the outcome
pub fn capture_still(source: Box<dyn FrameSource>) -> Result<Frame, CaptureError> {
    let mut guard = SourceGuard::new(source);
    let result = guard.read_frame();
    let origin = guard.origin();
    guard.release();

    let image = result?;
    let frame = Frame::new(image, origin);
    info!("📸 Captured {} frame", frame.resolution_string());
    Ok(frame)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// In-memory source that counts releases
    pub(crate) struct MockSource {
        pub frames: Vec<RgbImage>,
        pub fail_at: Option<usize>,
        pub reads: usize,
        pub releases: Arc<AtomicUsize>,
    }

    impl MockSource {
        pub fn new(frames: Vec<RgbImage>) -> (Self, Arc<AtomicUsize>) {
            let releases = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    frames,
                    fail_at: None,
                    reads: 0,
                    releases: Arc::clone(&releases),
                },
                releases,
            )
        }
    }

    impl FrameSource for MockSource {
        fn name(&self) -> String {
            "mock".to_string()
        }

        fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
            if self.fail_at == Some(self.reads) {
                return Err(CaptureError::ReadFailed("mock failure".to_string()));
            }
            let frame = self
                .frames
                .get(self.reads)
                .cloned()
                .ok_or(CaptureError::Exhausted)?;
            self.reads += 1;
            Ok(frame)
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_releases_exactly_once() {
        let (source, releases) = MockSource::new(vec![]);
        let mut guard = SourceGuard::new(Box::new(source));
        guard.release();
        guard.release();
        assert!(guard.is_released());
        drop(guard);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let (source, releases) = MockSource::new(vec![]);
        {
            let _guard = SourceGuard::new(Box::new(source));
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_capture_still_releases_on_success_and_failure() {
        let (source, releases) = MockSource::new(vec![RgbImage::from_pixel(4, 4, Rgb([1, 1, 1]))]);
        let frame = capture_still(Box::new(source)).unwrap();
        assert_eq!(frame.dimensions(), (4, 4));
        assert_eq!(frame.origin, FrameOrigin::Camera("mock".to_string()));
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let (mut failing, releases) = MockSource::new(vec![]);
        failing.fail_at = Some(0);
        assert!(matches!(
            capture_still(Box::new(failing)),
            Err(CaptureError::ReadFailed(_))
        ));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_still_source_replays_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        RgbImage::from_pixel(3, 3, Rgb([10, 0, 0])).save(&a).unwrap();
        RgbImage::from_pixel(5, 5, Rgb([0, 10, 0])).save(&b).unwrap();

        let mut source = StillImageSource::new(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(source.read_frame().unwrap().dimensions(), (3, 3));
        assert_eq!(source.origin(), FrameOrigin::File(a.clone()));
        assert_eq!(source.read_frame().unwrap().dimensions(), (5, 5));
        assert!(matches!(source.read_frame(), Err(CaptureError::Exhausted)));

        let mut looping = StillImageSource::new(vec![a, b]).unwrap().looping(true);
        for _ in 0..5 {
            assert!(looping.read_frame().is_ok());
        }
    }

    #[test]
    fn test_still_source_requires_paths() {
        assert!(matches!(StillImageSource::new(vec![]), Err(CaptureError::NoFrames)));
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn test_open_camera_without_feature() {
        assert!(matches!(
            open_camera(0),
            Err(CaptureError::CameraUnavailable { index: 0, .. })
        ));
    }
}
