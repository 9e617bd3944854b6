use crate::events::{BoothEvent, EventSender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Terminal keyboard source for the booth keys
pub struct KeyboardInput {
    cancellation_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self {
            cancellation_token: CancellationToken::new(),
            task: None,
        }
    }

    /// Start reading keys on a blocking task
    pub fn start(&mut self, events: EventSender) {
        if self.task.is_some() {
            return;
        }
        info!("Starting keyboard input");

        let cancellation_token = self.cancellation_token.clone();
        self.task = Some(task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                warn!("Keyboard input disabled, no terminal: {}", e);
                return;
            }
            debug!("Raw mode enabled");

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            if let Some(booth_event) = translate_key(&key_event) {
                                events.send(booth_event);
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                        std::thread::sleep(Duration::from_millis(100));
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input task exited");
        }));
    }

    pub async fn stop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(Duration::from_millis(500), task)
                .await
                .is_err()
            {
                warn!("Keyboard input task did not stop in time");
            }
        }
        // Never leave the terminal in raw mode.
        let _ = disable_raw_mode();
    }
}

impl Default for KeyboardInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Booth event for a terminal key, if it has one
pub(crate) fn translate_key(key: &KeyEvent) -> Option<BoothEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        // Raw mode swallows SIGINT, so Ctrl-C arrives as a key.
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(BoothEvent::Shutdown)
        }
        KeyCode::Esc => Some(BoothEvent::Shutdown),
        KeyCode::Char(c) => Some(BoothEvent::KeyPress(c.to_ascii_lowercase())),
        _ => {
            debug!("Key pressed: {:?}", key.code);
            None
        }
    }
}
