use super::Camera;
use crate::config::CameraConfig;
use crate::error::CameraError;
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const PALETTE: [[u8; 3]; 4] = [[230, 80, 60], [70, 160, 220], [90, 200, 120], [240, 200, 70]];

/// Scripted result of the next `take_picture` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockShot {
    Success,
    Recoverable(String),
    Fatal(String),
}

/// Call counters shared with whoever built the camera
#[derive(Debug, Default)]
pub struct MockCameraStats {
    pub pictures: AtomicUsize,
    pub previews: AtomicUsize,
    pub idles: AtomicUsize,
}

impl MockCameraStats {
    pub fn pictures(&self) -> usize {
        self.pictures.load(Ordering::Relaxed)
    }

    pub fn previews(&self) -> usize {
        self.previews.load(Ordering::Relaxed)
    }

    pub fn idles(&self) -> usize {
        self.idles.load(Ordering::Relaxed)
    }
}

/// Camera without hardware: writes solid-colour JPEGs after a fixed delay
pub struct MockCamera {
    resolution: (u32, u32),
    capture_delay: Duration,
    preview: bool,
    preview_delay: Duration,
    script: VecDeque<MockShot>,
    stats: Arc<MockCameraStats>,
}

impl MockCamera {
    pub fn new(resolution: (u32, u32), capture_delay: Duration) -> Self {
        Self {
            resolution,
            capture_delay,
            preview: false,
            preview_delay: Duration::ZERO,
            script: VecDeque::new(),
            stats: Arc::new(MockCameraStats::default()),
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(
            config.mock_resolution,
            Duration::from_millis(config.mock_capture_millis),
        )
        .with_preview(config.preview)
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    /// Make every preview frame take `delay`
    pub fn with_preview_delay(mut self, delay: Duration) -> Self {
        self.preview_delay = delay;
        self
    }

    /// Queue outcomes for upcoming captures; an empty script means success
    pub fn with_script<I: IntoIterator<Item = MockShot>>(mut self, shots: I) -> Self {
        self.script.extend(shots);
        self
    }

    pub fn stats(&self) -> Arc<MockCameraStats> {
        Arc::clone(&self.stats)
    }

    fn write_frame(&self, path: &Path, size: (u32, u32), index: usize) -> Result<(), CameraError> {
        let colour = PALETTE[index % PALETTE.len()];
        RgbImage::from_pixel(size.0, size.1, Rgb(colour))
            .save_with_format(path, image::ImageFormat::Jpeg)
            .map_err(|e| CameraError::fatal(format!("Mock camera could not write: {}", e)))
    }
}

#[async_trait]
impl Camera for MockCamera {
    fn name(&self) -> &str {
        "mock"
    }

    async fn set_idle(&mut self) -> Result<(), CameraError> {
        self.stats.idles.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn has_preview(&self) -> bool {
        self.preview
    }

    async fn take_preview(&mut self, path: &Path) -> Result<(), CameraError> {
        let index = self.stats.previews.fetch_add(1, Ordering::Relaxed);
        if !self.preview_delay.is_zero() {
            tokio::time::sleep(self.preview_delay).await;
        }
        let size = (self.resolution.0 / 4, self.resolution.1 / 4);
        self.write_frame(path, (size.0.max(1), size.1.max(1)), index)
    }

    async fn take_picture(&mut self, path: &Path) -> Result<PathBuf, CameraError> {
        let index = self.stats.pictures.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.capture_delay).await;

        let shot = self.script.pop_front().unwrap_or(MockShot::Success);
        debug!("Mock capture #{} -> {:?}", index + 1, shot);

        match shot {
            MockShot::Success => {
                self.write_frame(path, self.resolution, index)?;
                Ok(path.to_path_buf())
            }
            MockShot::Recoverable(message) => Err(CameraError::recoverable(message)),
            MockShot::Fatal(message) => Err(CameraError::fatal(message)),
        }
    }
}
