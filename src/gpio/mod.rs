mod sysfs;
mod virtual_gpio;

pub use sysfs::SysfsGpio;
pub use virtual_gpio::{GpioLevels, VirtualGpio};

use crate::error::Result;
use crate::events::EventSender;

/// Pin access used for the button inputs and the lamp output
pub trait Gpio: Send {
    fn name(&self) -> &str;

    /// Watch `channel` and queue `HardwareSignal(channel)` on each press
    fn setup_input(&mut self, channel: u32, events: EventSender) -> Result<()>;

    fn setup_output(&mut self, channel: u32) -> Result<()>;

    fn set_output(&mut self, channel: u32, high: bool) -> Result<()>;

    /// Stop watching inputs and release every channel; safe to repeat
    fn teardown(&mut self) -> Result<()>;
}
