mod keyboard;
mod signals;
#[cfg(all(target_os = "linux", feature = "touch"))]
mod touch;
#[cfg(test)]
mod tests;

pub use keyboard::KeyboardInput;
pub use signals::SignalWatcher;
#[cfg(all(target_os = "linux", feature = "touch"))]
pub use touch::TouchInput;

use crate::config::InputConfig;
use crate::events::EventSender;
use tracing::{info, warn};

/// Every non-GPIO event source feeding the booth's queue
#[derive(Default)]
pub struct InputSources {
    signals: SignalWatcher,
    keyboard: Option<KeyboardInput>,
    #[cfg(all(target_os = "linux", feature = "touch"))]
    touch: Option<TouchInput>,
}

impl InputSources {
    /// Start the configured sources; a missing device only costs that source
    pub fn start(config: &InputConfig, events: EventSender) -> Self {
        let signals = SignalWatcher::start(events.clone());

        let keyboard = config.keyboard.then(|| {
            let mut keyboard = KeyboardInput::new();
            keyboard.start(events.clone());
            keyboard
        });

        #[cfg(all(target_os = "linux", feature = "touch"))]
        let touch = config.touch_device.as_deref().and_then(|path| {
            let touch = TouchInput::new(path);
            match touch.start(events.clone()) {
                Ok(()) => Some(touch),
                Err(e) => {
                    warn!("Touch input unavailable: {}", e);
                    None
                }
            }
        });

        #[cfg(not(all(target_os = "linux", feature = "touch")))]
        if config.touch_device.is_some() {
            warn!("Touch input configured but not supported by this build");
        }

        info!("Input sources started");
        Self {
            signals,
            keyboard,
            #[cfg(all(target_os = "linux", feature = "touch"))]
            touch,
        }
    }

    pub async fn stop(&mut self) {
        self.signals.stop();
        if let Some(mut keyboard) = self.keyboard.take() {
            keyboard.stop().await;
        }
        #[cfg(all(target_os = "linux", feature = "touch"))]
        if let Some(touch) = self.touch.take() {
            touch.stop();
        }
        info!("Input sources stopped");
    }
}
