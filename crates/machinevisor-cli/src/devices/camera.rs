//! Camera that cycles through the JPEG files of a directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use machinevisor::{Camera, CaptureError, CapturedFrame};

use crate::error::{HostError, HostResult};

pub struct DirectoryCamera {
    images: Vec<PathBuf>,
    next: AtomicU64,
    scratch: PathBuf,
}

impl DirectoryCamera {
    /// Collect `*.jpg`/`*.jpeg` files from `dir`, sorted by name.
    pub fn open(dir: impl AsRef<Path>) -> HostResult<Self> {
        let dir = dir.as_ref();
        let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
            })
            .collect();
        images.sort();

        if images.is_empty() {
            return Err(HostError::NoImages(dir.display().to_string()));
        }
        tracing::info!("Camera: {} images from {}", images.len(), dir.display());

        Ok(Self {
            images,
            next: AtomicU64::new(0),
            scratch: std::env::temp_dir(),
        })
    }

    /// A camera that never becomes ready.
    pub fn unavailable() -> Self {
        Self {
            images: Vec::new(),
            next: AtomicU64::new(0),
            scratch: std::env::temp_dir(),
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch = dir.into();
        self
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

#[async_trait]
impl Camera for DirectoryCamera {
    fn is_ready(&self) -> bool {
        !self.images.is_empty()
    }

    /// Copies the next image to a scratch file, the way a phone camera
    /// writes each shot to its cache directory.
    async fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        if self.images.is_empty() {
            return Err(CaptureError::NotReady);
        }
        let shot = self.next.fetch_add(1, Ordering::Relaxed);
        let source = &self.images[(shot % self.images.len() as u64) as usize];
        let target = self
            .scratch
            .join(format!("mv_shot_{}_{shot}.jpg", std::process::id()));

        tokio::fs::copy(source, &target).await?;
        let frame = CapturedFrame::from_transient_file(&target)?;
        tracing::debug!("Captured {} ({} bytes)", source.display(), frame.bytes.len());
        Ok(frame)
    }
}
