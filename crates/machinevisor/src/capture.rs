//! Camera seam, transient capture files, and the synthetic placeholder frame.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use crate::types::VisorResult;

/// Placeholder frame size.
pub const PLACEHOLDER_WIDTH: u32 = 400;
pub const PLACEHOLDER_HEIGHT: u32 = 300;

/// JPEG quality for encoded frames.
const JPEG_QUALITY: u8 = 85;

/// Gradient endpoints of the placeholder (green → blue).
const PLACEHOLDER_FROM: [u8; 3] = [0x4C, 0xAF, 0x50];
const PLACEHOLDER_TO: [u8; 3] = [0x21, 0x96, 0xF3];

/// Errors reported by a [`Camera`].
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("camera not ready")]
    NotReady,

    #[error("{0}")]
    Hardware(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A camera that produces JPEG frames on request.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Whether the capture subsystem finished initializing.
    fn is_ready(&self) -> bool;
    /// Take one picture.
    async fn capture(&self) -> Result<CapturedFrame, CaptureError>;
}

/// One captured JPEG image, optionally backed by a temporary file.
///
/// The backing file is deleted when the frame is dropped.
#[derive(Debug)]
pub struct CapturedFrame {
    pub bytes: Vec<u8>,
    artifact: Option<TransientFile>,
}

impl CapturedFrame {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            artifact: None,
        }
    }

    /// Read a frame from a temporary file that is removed on drop.
    pub fn from_transient_file(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let artifact = TransientFile::new(path);
        let bytes = std::fs::read(artifact.path())?;
        Ok(Self {
            bytes,
            artifact: Some(artifact),
        })
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact.as_ref().map(TransientFile::path)
    }
}

/// A file removed when this guard goes out of scope.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
}

impl TransientFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!("Released capture file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove capture file {}: {e}", self.path.display()),
        }
    }
}

/// Render the placeholder frame shown when no camera image is available.
pub fn placeholder_jpeg() -> VisorResult<Vec<u8>> {
    let (w, h) = (PLACEHOLDER_WIDTH as f32, PLACEHOLDER_HEIGHT as f32);
    // projection onto the top-left → bottom-right diagonal
    let norm = w * w + h * h;

    let img = RgbImage::from_fn(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, |x, y| {
        let t = ((x as f32 * w + y as f32 * h) / norm).clamp(0.0, 1.0);
        let mix = |i: usize| {
            let from = PLACEHOLDER_FROM[i] as f32;
            let to = PLACEHOLDER_TO[i] as f32;
            (from + (to - from) * t).round() as u8
        };
        Rgb([mix(0), mix(1), mix(2)])
    });

    encode_jpeg(&img)
}

fn encode_jpeg(img: &RgbImage) -> VisorResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    img.write_with_encoder(encoder)?;
    Ok(buf)
}
