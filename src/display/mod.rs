mod canvas;
mod converter;
mod framebuffer;
mod headless;
#[cfg(test)]
mod tests;

pub use canvas::{fit_within, Canvas};
pub use converter::DisplayConverter;
pub use framebuffer::FramebufferDisplay;
pub use headless::{DisplayLog, DisplayOp, DisplayRecord, HeadlessDisplay, DEFAULT_LOG_CAPACITY};

use crate::error::Result;
use image::Rgb;
use std::path::Path;

/// Screen area in display pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Drawing surface of the booth; nothing is visible until `apply`
pub trait Display: Send {
    fn size(&self) -> (u32, u32);

    /// Fill the frame, with the configured background when no colour is given
    fn clear(&mut self, colour: Option<Rgb<u8>>) -> Result<()>;

    fn show_message(&mut self, text: &str) -> Result<()>;

    fn show_image(&mut self, path: &Path, target: Option<Rect>, mirrored: bool) -> Result<()>;

    /// Commit the frame to the screen
    fn apply(&mut self) -> Result<()>;

    fn teardown(&mut self) -> Result<()>;
}
