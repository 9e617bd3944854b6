//! The four-shot capture session run for each trigger.
//!
//! A session walks through pose message, per-shot countdown and capture
//! with a bounded retry budget, composite assembly and display. Recoverable
//! camera failures are retried within their shot; anything else ends the
//! session with an error for the controller to show.


use crate::camera::CaptureOutcome;
use crate::composite::CompositeAssembler;
use crate::config::SessionConfig;
use crate::error::{BoothError, CameraError, Result};
use crate::events::{BoothEvent, Command, EventBindings, EventQueue};
use crate::hardware::Hardware;
use crate::sequence::PictureSequence;
use image::Rgb;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

pub const SHOTS_PER_SESSION: usize = 4;
pub const GIVE_UP_MESSAGE: &str = "Giving up! Please start over!";

const POSE_MESSAGE: &str = "POSE!\n\nFour pictures...";
const WAIT_MESSAGE: &str = "Please wait!";
const SMILE_BACKGROUND: Rgb<u8> = Rgb([255, 230, 200]);
const PREVIEW_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// One successful shot of a session
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedShot {
    pub path: PathBuf,
    /// Attempts used, including the successful one
    pub attempts: u32,
    /// Time spent inside the camera call
    pub capture_time: Duration,
    /// Camera call plus pacing pad
    pub shot_time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed {
        composite: PathBuf,
        shots: Vec<CapturedShot>,
    },
    /// A shutdown request arrived mid-session
    Interrupted,
}

/// Borrowed view of everything a session drives
pub struct CaptureSession<'a> {
    pub config: &'a SessionConfig,
    pub hardware: &'a mut Hardware,
    pub events: &'a mut EventQueue,
    pub bindings: &'a EventBindings,
    pub originals: &'a mut PictureSequence,
    pub assembler: &'a mut CompositeAssembler,
    pub preview_path: &'a Path,
}

impl<'a> CaptureSession<'a> {
    pub async fn run(mut self) -> Result<SessionOutcome> {
        info!("Capture session started");
        self.hardware.set_lamp(false)?;

        self.hardware.show_message(POSE_MESSAGE, None)?;
        if self.hold(secs(self.config.pose_message_seconds)).await {
            return Ok(self.interrupted());
        }

        let mut shots = Vec::with_capacity(SHOTS_PER_SESSION);
        for index in 0..SHOTS_PER_SESSION {
            if self.countdown(self.config.pose_seconds).await? {
                return Ok(self.interrupted());
            }
            let shot = self.capture_shot(index).await?;
            debug!(
                "Shot {} done in {:?} ({} attempts)",
                index + 1,
                shot.shot_time,
                shot.attempts
            );
            shots.push(shot);
        }

        self.hardware.show_message(WAIT_MESSAGE, None)?;
        let inputs: [PathBuf; SHOTS_PER_SESSION] = [
            shots[0].path.clone(),
            shots[1].path.clone(),
            shots[2].path.clone(),
            shots[3].path.clone(),
        ];
        let composite = self.assembler.assemble(inputs).await?;
        info!("Composite ready: {}", composite.display());

        self.hardware.display.clear(None)?;
        self.hardware.display.show_image(&composite, None, false)?;
        self.hardware.display.apply()?;
        if self.hold(secs(self.config.display_seconds)).await {
            return Ok(self.interrupted());
        }

        self.hardware.set_lamp(true)?;
        let discarded = self.events.drain();
        if !discarded.is_empty() {
            debug!("Dropped {} events queued during the session", discarded.len());
        }

        info!("Capture session finished");
        Ok(SessionOutcome::Completed { composite, shots })
    }

    /// Countdown before a shot; true when shutdown was requested
    async fn countdown(&mut self, seconds: u32) -> Result<bool> {
        if self.hardware.camera.has_preview() {
            self.preview_countdown(seconds).await
        } else {
            for elapsed in 0..seconds {
                self.hardware
                    .show_message(&(seconds - elapsed).to_string(), None)?;
                if self.hold(Duration::from_secs(1)).await {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }

    /// Live preview with the remaining seconds overlaid.
    ///
    /// Countdown progress is clamped to one second per frame, so a slow
    /// preview stretches the countdown instead of skipping numbers.
    async fn preview_countdown(&mut self, seconds: u32) -> Result<bool> {
        let total = secs(seconds);
        self.show_preview(None).await?;

        let start = Instant::now();
        let mut progress = Duration::ZERO;
        while progress < total {
            let frame_start = Instant::now();
            let remaining = seconds.saturating_sub(progress.as_secs() as u32);
            self.show_preview(Some(remaining)).await?;

            if self.hold_until(frame_start + PREVIEW_FRAME_INTERVAL).await {
                return Ok(true);
            }
            progress = (progress + Duration::from_secs(1)).min(start.elapsed());
        }
        Ok(false)
    }

    async fn show_preview(&mut self, remaining: Option<u32>) -> Result<()> {
        self.hardware.display.clear(None)?;
        self.hardware.camera.take_preview(self.preview_path).await?;
        self.hardware
            .display
            .show_image(self.preview_path, None, true)?;
        if let Some(remaining) = remaining {
            self.hardware.display.show_message(&remaining.to_string())?;
        }
        self.hardware.display.apply()
    }

    /// Capture one shot within the attempt budget
    async fn capture_shot(&mut self, index: usize) -> Result<CapturedShot> {
        let path = self.originals.next();
        let budget = self.config.capture_attempts.max(1);
        let smile = format!("SMILE!\nPhoto {} of {}", index + 1, SHOTS_PER_SESSION);

        for attempt in 1..=budget {
            self.hardware.show_message(&smile, Some(SMILE_BACKGROUND))?;

            let tic = Instant::now();
            let outcome = CaptureOutcome::from(self.hardware.camera.take_picture(&path).await);
            let capture_time = tic.elapsed();

            match outcome {
                CaptureOutcome::Success(stored) => {
                    let min_shot = Duration::from_millis(self.config.min_shot_millis);
                    if capture_time < min_shot {
                        sleep(min_shot - capture_time).await;
                    }
                    return Ok(CapturedShot {
                        path: stored,
                        attempts: attempt,
                        capture_time,
                        shot_time: tic.elapsed(),
                    });
                }
                CaptureOutcome::RecoverableFailure(message) if attempt < budget => {
                    warn!(
                        "Photo {} attempt {}/{} failed: {}",
                        index + 1,
                        attempt,
                        budget,
                        message
                    );
                    self.hardware.show_message(&message, None)?;
                    sleep(secs(self.config.retry_delay_seconds)).await;
                }
                CaptureOutcome::RecoverableFailure(message) => {
                    warn!(
                        "Photo {} failed after {} attempts: {}",
                        index + 1,
                        budget,
                        message
                    );
                    return Err(CameraError::fatal(GIVE_UP_MESSAGE).into());
                }
                CaptureOutcome::FatalFailure(message) => {
                    return Err(CameraError::fatal(message).into());
                }
            }
        }

        Err(BoothError::system("Capture attempt budget is empty"))
    }

    /// Wait for `duration`; true when shutdown was requested meanwhile
    async fn hold(&mut self, duration: Duration) -> bool {
        self.hold_until(Instant::now() + duration).await
    }

    async fn hold_until(&mut self, deadline: Instant) -> bool {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.events.wait_timeout(deadline - now).await {
                Some(event) if self.is_shutdown(&event) => return true,
                Some(event) => debug!("Ignoring {} during session", event.description()),
                None => return false,
            }
        }
    }

    fn is_shutdown(&self, event: &BoothEvent) -> bool {
        self.bindings.command_for(event) == Command::Shutdown
    }

    fn interrupted(&self) -> SessionOutcome {
        info!("Capture session interrupted by shutdown request");
        SessionOutcome::Interrupted
    }
}

fn secs(seconds: u32) -> Duration {
    Duration::from_secs(seconds as u64)
}
