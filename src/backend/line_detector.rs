// src/backend/line_detector.rs - Edge and line detection for automatic point selection

use std::time::{Duration, Instant};

use image::{GrayImage, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};
use tracing::{debug, info};

use crate::backend::types::{LineSegment, Point};
use crate::config::DetectionSettings;

/// Smallest raster the detector will look at
const MIN_DIMENSION: u32 = 3;

/// Finds a straight segment in a frame and hands back its endpoints.
///
/// Pipeline: grayscale, optional blur, Canny, Hough, then each polar line
/// is walked across the edge map to recover the longest supported run.
/// The longest segment over all lines wins; ties keep detector order.
pub struct LineDetector {
    settings: DetectionSettings,
    stats: parking_lot::RwLock<DetectionStats>,
}

impl LineDetector {
    /// Create a new line detector
    pub fn new(settings: DetectionSettings) -> Self {
        Self {
            settings,
            stats: parking_lot::RwLock::new(DetectionStats::default()),
        }
    }

    /// Active settings
    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    /// Detect the best segment, if any
    pub fn detect(&self, image: &RgbImage) -> Option<LineSegment> {
        let start_time = Instant::now();
        let segments = self.detect_segments(image);

        let best = segments
            .iter()
            .copied()
            .fold(None::<LineSegment>, |best, candidate| match best {
                Some(current) if current.length() >= candidate.length() => Some(current),
                _ => Some(candidate),
            });

        {
            let mut stats = self.stats.write();
            stats.runs += 1;
            stats.last_candidates = segments.len();
            stats.last_duration = start_time.elapsed();
            stats.total_duration += start_time.elapsed();
            if best.is_some() {
                stats.hits += 1;
            } else {
                stats.misses += 1;
            }
        }

        match best {
            Some(segment) => info!(
                "📏 Line detected: {} -> {} ({:.1} px, {} candidates)",
                segment.start,
                segment.end,
                segment.length(),
                segments.len()
            ),
            None => debug!("🔍 No line segment found in {:?}", start_time.elapsed()),
        }

        best
    }

    /// All segments that pass the length and gap limits, in detector order
    pub fn detect_segments(&self, image: &RgbImage) -> Vec<LineSegment> {
        let (width, height) = image.dimensions();
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            debug!("🔍 Image {}x{} too small for line detection", width, height);
            return Vec::new();
        }

        let edges = self.edge_map(image);
        let lines = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: self.settings.vote_threshold,
                suppression_radius: self.settings.suppression_radius,
            },
        );
        debug!("🔍 Hough transform produced {} lines", lines.len());

        lines
            .iter()
            .filter_map(|line| {
                extract_segment(
                    &edges,
                    line,
                    self.settings.min_line_length as f32,
                    self.settings.max_line_gap,
                )
            })
            .collect()
    }

    /// Grayscale + blur + Canny
    pub fn edge_map(&self, image: &RgbImage) -> GrayImage {
        let gray = image::imageops::grayscale(image);
        let gray = if self.settings.blur_sigma > 0.0 {
            gaussian_blur_f32(&gray, self.settings.blur_sigma)
        } else {
            gray
        };
        canny(&gray, self.settings.canny_low, self.settings.canny_high)
    }

    /// Snapshot of detection statistics
    pub fn stats(&self) -> DetectionStats {
        self.stats.read().clone()
    }
}

/// Walk a polar line through the edge map and keep its longest edge run.
///
/// The line is `x*cos(t) + y*sin(t) = r`. Pixels within one step of the
/// line along its normal count as support; gaps up to `max_gap` samples are
/// bridged.
fn extract_segment(
    edges: &GrayImage,
    line: &PolarLine,
    min_length: f32,
    max_gap: u32,
) -> Option<LineSegment> {
    let (width, height) = edges.dimensions();
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (cos_t, sin_t) = (theta.cos(), theta.sin());

    let origin = (line.r * cos_t, line.r * sin_t);
    let direction = (-sin_t, cos_t);
    let reach = ((width as f32).hypot(height as f32)).ceil() as i64 + 1;

    let supported = |t: i64| -> bool {
        let x = origin.0 + direction.0 * t as f32;
        let y = origin.1 + direction.1 * t as f32;
        (-1..=1).any(|k| {
            let px = (x + cos_t * k as f32).round();
            let py = (y + sin_t * k as f32).round();
            px >= 0.0
                && py >= 0.0
                && (px as u32) < width
                && (py as u32) < height
                && edges.get_pixel(px as u32, py as u32)[0] > 0
        })
    };

    let mut best: Option<(i64, i64)> = None;
    let mut run: Option<(i64, i64)> = None;
    let mut keep_longest = |candidate: (i64, i64)| {
        let longer = match best {
            Some((s, e)) => candidate.1 - candidate.0 > e - s,
            None => true,
        };
        if longer {
            best = Some(candidate);
        }
    };

    for t in -reach..=reach {
        if supported(t) {
            run = match run {
                Some((start, _)) => Some((start, t)),
                None => Some((t, t)),
            };
        } else if let Some((start, last)) = run {
            if t - last > max_gap as i64 {
                keep_longest((start, last));
                run = None;
            }
        }
    }
    if let Some(open_run) = run {
        keep_longest(open_run);
    }

    let (t_start, t_end) = best?;
    if ((t_end - t_start) as f32) < min_length {
        return None;
    }

    let to_point = |t: i64| {
        let x = (origin.0 + direction.0 * t as f32).round();
        let y = (origin.1 + direction.1 * t as f32).round();
        Point::new(
            x.clamp(0.0, (width - 1) as f32) as u32,
            y.clamp(0.0, (height - 1) as f32) as u32,
        )
    };

    Some(LineSegment::new(to_point(t_start), to_point(t_end)))
}

/// Detection statistics
#[derive(Debug, Clone, Default)]
pub struct DetectionStats {
    pub runs: u64,
    pub hits: u64,
    pub misses: u64,
    pub last_candidates: usize,
    pub last_duration: Duration,
    pub total_duration: Duration,
}

impl DetectionStats {
    /// Average time spent per detection run
    pub fn average_duration(&self) -> Duration {
        if self.runs == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.runs as u32
        }
    }
}
