// src/backend/ingest.rs - Image decoding into frames

use std::path::{Path, PathBuf};

use tracing::info;

use crate::backend::types::{Frame, FrameOrigin};

/// Image loading errors
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Cannot open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot decode image data: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Decode a JPEG/PNG file into an RGB frame
pub fn load_image(path: &Path) -> Result<Frame, IngestError> {
    let decoded = image::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let frame = into_frame(decoded, FrameOrigin::File(path.to_path_buf()))?;
    info!("🖼️ Loaded {} ({})", path.display(), frame.resolution_string());
    Ok(frame)
}

/// Decode an in-memory encoded image
pub fn decode_image(bytes: &[u8]) -> Result<Frame, IngestError> {
    let decoded = image::load_from_memory(bytes)?;
    into_frame(decoded, FrameOrigin::Memory)
}

fn into_frame(decoded: image::DynamicImage, origin: FrameOrigin) -> Result<Frame, IngestError> {
    let rgb = decoded.into_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(IngestError::Empty { width, height });
    }
    Ok(Frame::new(rgb, origin))
}
