use crate::config::{GpioConfig, InputConfig};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Input events from every source, normalized for the booth controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoothEvent {
    /// Process termination requested (signal, window close, Ctrl-C)
    Shutdown,
    /// A key was pressed on the attached keyboard
    KeyPress(char),
    /// A pointer button or touch press at a screen position
    MouseClick { button: u8, position: (i32, i32) },
    /// A debounced edge on a hardware input channel
    HardwareSignal(u32),
}

impl BoothEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            BoothEvent::Shutdown => "Shutdown requested".to_string(),
            BoothEvent::KeyPress(key) => format!("Key '{}' pressed", key.escape_default()),
            BoothEvent::MouseClick { button, position } => {
                format!(
                    "Mouse button {} clicked at ({}, {})",
                    button, position.0, position.1
                )
            }
            BoothEvent::HardwareSignal(channel) => format!("Signal on channel {}", channel),
        }
    }
}

/// What the controller does in response to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Capture,
    Shutdown,
    Ignore,
}

/// Maps raw events onto controller commands
#[derive(Debug, Clone)]
pub struct EventBindings {
    pub trigger_key: char,
    pub quit_key: char,
    pub trigger_channel: u32,
    pub shutdown_channel: u32,
}

impl EventBindings {
    pub fn from_config(input: &InputConfig, gpio: &GpioConfig) -> Self {
        Self {
            trigger_key: input.trigger_key,
            quit_key: input.quit_key,
            trigger_channel: gpio.trigger_channel,
            shutdown_channel: gpio.shutdown_channel,
        }
    }

    pub fn command_for(&self, event: &BoothEvent) -> Command {
        match event {
            BoothEvent::Shutdown => Command::Shutdown,
            BoothEvent::KeyPress(key) if *key == self.quit_key => Command::Shutdown,
            BoothEvent::KeyPress(key) if *key == self.trigger_key => Command::Capture,
            BoothEvent::KeyPress(_) => Command::Ignore,
            // Capture by touch/mouse is disabled on purpose, not missing.
            BoothEvent::MouseClick { .. } => Command::Ignore,
            BoothEvent::HardwareSignal(channel) if *channel == self.shutdown_channel => {
                Command::Shutdown
            }
            BoothEvent::HardwareSignal(channel) if *channel == self.trigger_channel => {
                Command::Capture
            }
            BoothEvent::HardwareSignal(_) => Command::Ignore,
        }
    }
}

/// Cloneable handle given to every event source
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::UnboundedSender<BoothEvent>,
}

impl EventSender {
    /// Push an event; safe to call from interrupt threads and blocking tasks
    pub fn send(&self, event: BoothEvent) {
        debug!("Queueing event: {}", event.description());
        if self.sender.send(event).is_err() {
            warn!("Event queue closed, dropping event");
        }
    }

    /// Inject a hardware signal from a non-UI source
    pub fn trigger_event(&self, channel: u32) {
        self.send(BoothEvent::HardwareSignal(channel));
    }
}

/// The single pending-event queue read by the control loop
pub struct EventQueue {
    sender: mpsc::UnboundedSender<BoothEvent>,
    receiver: mpsc::UnboundedReceiver<BoothEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Take the next pending event without waiting
    pub fn poll(&mut self) -> Option<BoothEvent> {
        self.receiver.try_recv().ok()
    }

    /// Block until the next event arrives
    pub async fn wait(&mut self) -> BoothEvent {
        // The queue owns a sender, so the channel never closes underneath us.
        self.receiver.recv().await.unwrap_or(BoothEvent::Shutdown)
    }

    /// Wait at most `timeout` for the next event
    pub async fn wait_timeout(&mut self, timeout: Duration) -> Option<BoothEvent> {
        tokio::time::timeout(timeout, self.receiver.recv())
            .await
            .ok()
            .flatten()
    }

    /// Discard everything pending; returns the discarded events
    pub fn drain(&mut self) -> Vec<BoothEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            drained.push(event);
        }
        if !drained.is_empty() {
            debug!("Discarded {} pending events", drained.len());
        }
        drained
    }
}
