mod gphoto2;
mod mock;
#[cfg(test)]
mod tests;

pub use gphoto2::GPhoto2Camera;
pub use mock::{MockCamera, MockCameraStats, MockShot};

use crate::error::CameraError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Still camera used by the capture session
#[async_trait]
pub trait Camera: Send {
    fn name(&self) -> &str;

    /// Put the camera into its resting state between sessions
    async fn set_idle(&mut self) -> Result<(), CameraError>;

    /// Whether `take_preview` is available
    fn has_preview(&self) -> bool;

    /// Grab a low-resolution live frame into `path`
    async fn take_preview(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Capture a full still; returns where the picture was stored
    async fn take_picture(&mut self, path: &Path) -> Result<PathBuf, CameraError>;
}

/// Result of one capture attempt, as seen by the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Success(PathBuf),
    RecoverableFailure(String),
    FatalFailure(String),
}

impl From<Result<PathBuf, CameraError>> for CaptureOutcome {
    fn from(result: Result<PathBuf, CameraError>) -> Self {
        match result {
            Ok(path) => CaptureOutcome::Success(path),
            Err(e) if e.recoverable => CaptureOutcome::RecoverableFailure(e.message),
            Err(e) => CaptureOutcome::FatalFailure(e.message),
        }
    }
}
