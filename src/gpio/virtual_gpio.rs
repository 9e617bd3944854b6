use super::Gpio;
use crate::error::{GpioError, Result};
use crate::events::EventSender;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct Pins {
    outputs: HashMap<u32, bool>,
    inputs: HashMap<u32, EventSender>,
    teardowns: usize,
}

/// Shared handle onto the pins of a `VirtualGpio`
#[derive(Clone, Default)]
pub struct GpioLevels {
    pins: Arc<Mutex<Pins>>,
}

impl GpioLevels {
    /// Current level of an output, `None` when it was never configured
    pub fn level(&self, channel: u32) -> Option<bool> {
        self.pins.lock().outputs.get(&channel).copied()
    }

    /// Simulate a button press on a registered input
    pub fn press(&self, channel: u32) -> bool {
        let pins = self.pins.lock();
        match pins.inputs.get(&channel) {
            Some(events) => {
                events.trigger_event(channel);
                true
            }
            None => false,
        }
    }

    pub fn is_input(&self, channel: u32) -> bool {
        self.pins.lock().inputs.contains_key(&channel)
    }

    pub fn teardowns(&self) -> usize {
        self.pins.lock().teardowns
    }
}

/// In-memory GPIO for machines without pins
#[derive(Default)]
pub struct VirtualGpio {
    levels: GpioLevels,
    released: bool,
}

impl VirtualGpio {
    pub fn new() -> Self {
        info!("Using virtual GPIO");
        Self::default()
    }

    pub fn levels(&self) -> GpioLevels {
        self.levels.clone()
    }
}

impl Gpio for VirtualGpio {
    fn name(&self) -> &str {
        "virtual"
    }

    fn setup_input(&mut self, channel: u32, events: EventSender) -> Result<()> {
        debug!("Virtual GPIO {} configured as input", channel);
        self.released = false;
        self.levels.pins.lock().inputs.insert(channel, events);
        Ok(())
    }

    fn setup_output(&mut self, channel: u32) -> Result<()> {
        debug!("Virtual GPIO {} configured as output", channel);
        self.released = false;
        self.levels.pins.lock().outputs.insert(channel, false);
        Ok(())
    }

    fn set_output(&mut self, channel: u32, high: bool) -> Result<()> {
        let mut pins = self.levels.pins.lock();
        match pins.outputs.get_mut(&channel) {
            Some(level) => {
                *level = high;
                Ok(())
            }
            None => Err(GpioError::NotConfigured {
                channel,
                direction: "output",
            }
            .into()),
        }
    }

    fn teardown(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        let mut pins = self.levels.pins.lock();
        for level in pins.outputs.values_mut() {
            *level = false;
        }
        pins.inputs.clear();
        pins.teardowns += 1;
        self.released = true;
        Ok(())
    }
}
