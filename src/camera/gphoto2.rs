use super::Camera;
use crate::config::CameraConfig;
use crate::error::CameraError;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// DSLR driven through the `gphoto2` command line tool
pub struct GPhoto2Camera {
    binary: String,
    preview: bool,
    preview_active: bool,
}

impl GPhoto2Camera {
    pub fn new(config: &CameraConfig) -> Self {
        info!(
            "Using gphoto2 camera via '{}' (preview {})",
            config.gphoto2_binary,
            if config.preview { "enabled" } else { "disabled" }
        );
        Self {
            binary: config.gphoto2_binary.clone(),
            preview: config.preview,
            preview_active: false,
        }
    }

    async fn run<I, S>(&self, args: I) -> Result<(), CameraError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CameraError::fatal(format!("Camera tool '{}' not installed!", self.binary))
                }
                _ => CameraError::fatal(format!("Can't run camera tool: {}", e)),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("gphoto2 failed ({}): {}", output.status, stderr.trim());
        Err(classify_failure(&stderr))
    }
}

#[async_trait]
impl Camera for GPhoto2Camera {
    fn name(&self) -> &str {
        "gphoto2"
    }

    async fn set_idle(&mut self) -> Result<(), CameraError> {
        if !self.preview_active {
            return Ok(());
        }
        self.preview_active = false;

        // Not every body exposes the viewfinder switch.
        if let Err(e) = self.run(["--set-config", "viewfinder=0"]).await {
            warn!("Could not switch off viewfinder: {}", e);
        }
        Ok(())
    }

    fn has_preview(&self) -> bool {
        self.preview
    }

    async fn take_preview(&mut self, path: &Path) -> Result<(), CameraError> {
        self.preview_active = true;
        self.run([
            OsStr::new("--capture-preview"),
            OsStr::new("--force-overwrite"),
            OsStr::new("--filename"),
            path.as_os_str(),
        ])
        .await
    }

    async fn take_picture(&mut self, path: &Path) -> Result<PathBuf, CameraError> {
        self.run([
            OsStr::new("--capture-image-and-download"),
            OsStr::new("--force-overwrite"),
            OsStr::new("--filename"),
            path.as_os_str(),
        ])
        .await?;

        if !path.is_file() {
            return Err(CameraError::recoverable("Picture was not saved!"));
        }

        debug!("Picture stored at {}", path.display());
        Ok(path.to_path_buf())
    }
}

/// Map gphoto2's error output onto retryable vs fatal failures
pub(crate) fn classify_failure(stderr: &str) -> CameraError {
    let lower = stderr.to_lowercase();

    if lower.contains("no camera found") || lower.contains("could not detect any camera") {
        return CameraError::fatal("No camera found!");
    }

    if lower.contains("focus") {
        return CameraError::recoverable("Focusing failed!\nTrying again...");
    }

    let transient = [
        "could not claim the usb device",
        "i/o in progress",
        "device busy",
        "camera is busy",
        "timeout",
        "time-out",
    ];
    if transient.iter().any(|pattern| lower.contains(pattern)) {
        return CameraError::recoverable("Camera busy!\nTrying again...");
    }

    let detail = stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown failure");
    CameraError::fatal(format!("Camera error: {}", detail))
}
