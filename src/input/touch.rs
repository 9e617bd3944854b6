use crate::error::{InputError, Result};
use crate::events::{BoothEvent, EventSender};
use evdev::{AbsoluteAxisType, Device, EventType, InputEvent, InputEventKind, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Touch screen source reporting taps as mouse clicks
pub struct TouchInput {
    device_path: String,
    stop: Arc<AtomicBool>,
}

impl TouchInput {
    pub fn new(device_path: &str) -> Self {
        Self {
            device_path: device_path.to_string(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open the device and read it on a dedicated thread
    pub fn start(&self, events: EventSender) -> Result<()> {
        let mut device = open_device(&self.device_path)?;
        info!(
            "Touch device opened: {} ({})",
            self.device_path,
            device.name().unwrap_or("Unknown")
        );
        if !device.supported_events().contains(EventType::KEY) {
            warn!(
                "{} does not report key events, taps may be missed",
                self.device_path
            );
        }

        let device_path = self.device_path.clone();
        let stop = Arc::clone(&self.stop);
        thread::Builder::new()
            .name("touch-input".to_string())
            .spawn(move || {
                let mut tracker = TouchTracker::default();
                let mut consecutive_errors = 0;

                while !stop.load(Ordering::Relaxed) {
                    match device.fetch_events() {
                        Ok(batch) => {
                            consecutive_errors = 0;
                            for event in batch {
                                if let Some(click) = tracker.handle(&event) {
                                    events.send(click);
                                }
                            }
                        }
                        Err(e) => {
                            consecutive_errors += 1;
                            if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                                error!("Giving up on touch device {}: {}", device_path, e);
                                break;
                            }
                            warn!(
                                "Error reading from touch device (attempt {}): {}",
                                consecutive_errors, e
                            );
                            thread::sleep(Duration::from_millis(100));
                        }
                    }
                }
                debug!("Touch input thread exited");
            })?;
        Ok(())
    }

    /// The reader thread exits after its next device event
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn open_device(path: &str) -> Result<Device> {
    Device::open(path).map_err(|e| {
        let err = match e.kind() {
            std::io::ErrorKind::NotFound => InputError::DeviceNotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => InputError::PermissionDenied(path.to_string()),
            _ => InputError::Device(format!("Failed to open {}: {}", path, e)),
        };
        err.into()
    })
}

/// Follows pointer position and emits a click on each press
#[derive(Debug, Default)]
pub(crate) struct TouchTracker {
    position: (i32, i32),
}

impl TouchTracker {
    pub(crate) fn handle(&mut self, event: &InputEvent) -> Option<BoothEvent> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                match axis {
                    AbsoluteAxisType::ABS_X | AbsoluteAxisType::ABS_MT_POSITION_X => {
                        self.position.0 = event.value()
                    }
                    AbsoluteAxisType::ABS_Y | AbsoluteAxisType::ABS_MT_POSITION_Y => {
                        self.position.1 = event.value()
                    }
                    _ => {}
                }
                None
            }
            InputEventKind::Key(key) if event.value() == 1 => {
                let button = match key {
                    Key::BTN_TOUCH | Key::BTN_LEFT => 1,
                    Key::BTN_MIDDLE => 2,
                    Key::BTN_RIGHT => 3,
                    _ => return None,
                };
                debug!("Touch at {:?}", self.position);
                Some(BoothEvent::MouseClick {
                    button,
                    position: self.position,
                })
            }
            _ => None,
        }
    }
}
