use crate::camera::{Camera, GPhoto2Camera, MockCamera};
use crate::config::{BoothConfig, CameraBackend, DisplayBackend, GpioBackend};
use crate::display::{Display, FramebufferDisplay, HeadlessDisplay};
use crate::error::Result;
use crate::gpio::{Gpio, SysfsGpio, VirtualGpio};
use image::Rgb;
use tracing::{debug, info};

/// The booth's exclusively owned devices
pub struct Hardware {
    pub camera: Box<dyn Camera>,
    pub display: Box<dyn Display>,
    pub gpio: Box<dyn Gpio>,
    lamp_channel: u32,
    lamp_on: bool,
}

impl Hardware {
    /// Bundle backends and claim the lamp output (initially off)
    pub fn new(
        camera: Box<dyn Camera>,
        display: Box<dyn Display>,
        mut gpio: Box<dyn Gpio>,
        lamp_channel: u32,
    ) -> Result<Self> {
        gpio.setup_output(lamp_channel)?;
        gpio.set_output(lamp_channel, false)?;
        let (width, height) = display.size();
        info!(
            "Hardware ready: camera={}, gpio={}, display {}x{}",
            camera.name(),
            gpio.name(),
            width,
            height
        );
        Ok(Self {
            camera,
            display,
            gpio,
            lamp_channel,
            lamp_on: false,
        })
    }

    /// Pick one backend per device from configuration
    pub fn from_config(config: &BoothConfig) -> Result<Self> {
        let camera: Box<dyn Camera> = match config.camera.backend {
            CameraBackend::Gphoto2 => Box::new(GPhoto2Camera::new(&config.camera)),
            CameraBackend::Mock => Box::new(MockCamera::from_config(&config.camera)),
        };

        let display: Box<dyn Display> = match config.display.backend {
            DisplayBackend::Framebuffer => Box::new(FramebufferDisplay::new(&config.display)?),
            DisplayBackend::Headless => Box::new(HeadlessDisplay::new(config.display.resolution)),
        };

        let gpio: Box<dyn Gpio> = match config.gpio.backend {
            GpioBackend::Sysfs => Box::new(SysfsGpio::new(&config.gpio)),
            GpioBackend::Virtual => Box::new(VirtualGpio::new()),
        };

        Self::new(camera, display, gpio, config.gpio.lamp_channel)
    }

    pub fn set_lamp(&mut self, on: bool) -> Result<()> {
        self.gpio.set_output(self.lamp_channel, on)?;
        if self.lamp_on != on {
            debug!("Lamp {}", if on { "on" } else { "off" });
        }
        self.lamp_on = on;
        Ok(())
    }

    pub fn lamp_on(&self) -> bool {
        self.lamp_on
    }

    /// Replace the whole screen with a message
    pub fn show_message(&mut self, text: &str, background: Option<Rgb<u8>>) -> Result<()> {
        self.display.clear(background)?;
        self.display.show_message(text)?;
        self.display.apply()
    }
}
