use super::canvas::Canvas;
use super::converter::DisplayConverter;
use super::{Display, Rect};
use crate::config::{DisplayConfig, PixelFormat};
use crate::error::{DisplayError, Result};
use image::Rgb;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Linux framebuffer output (`/dev/fbN`) drawn from an off-screen canvas
pub struct FramebufferDisplay {
    device: String,
    file: Option<File>,
    format: PixelFormat,
    stride: usize,
    canvas: Canvas,
}

impl FramebufferDisplay {
    pub fn new(config: &DisplayConfig) -> Result<Self> {
        info!(
            "Initializing framebuffer display {} ({}x{}, {:?})",
            config.framebuffer_device, config.resolution.0, config.resolution.1, config.pixel_format
        );

        let font = Canvas::load_font(&config.font_path)?;
        let file = Self::open_device(&config.framebuffer_device)?;

        let row_bytes =
            config.resolution.0 as usize * DisplayConverter::bytes_per_pixel(config.pixel_format);
        let stride = read_stride(&config.framebuffer_device).unwrap_or(row_bytes);
        if stride != row_bytes {
            debug!("Framebuffer stride {} (row {} bytes)", stride, row_bytes);
        }

        Ok(Self {
            device: config.framebuffer_device.clone(),
            file: Some(file),
            format: config.pixel_format,
            stride,
            canvas: Canvas::new(
                config.resolution,
                Rgb(config.background),
                font,
                config.font_size,
            ),
        })
    }

    fn open_device(device: &str) -> Result<File> {
        Ok(OpenOptions::new()
            .write(true)
            .open(device)
            .map_err(|e| DisplayError::FramebufferOpen {
                device: device.to_string(),
                source: e,
            })?)
    }

    fn write_frame(&mut self) -> Result<()> {
        let (width, height) = self.canvas.size();
        let data = DisplayConverter::to_framebuffer(
            self.canvas.image().as_raw(),
            width,
            height,
            self.format,
            self.stride,
        )?;

        let file = match self.file.as_mut() {
            Some(file) => file,
            None => {
                warn!("Framebuffer {} already released", self.device);
                return Ok(());
            }
        };

        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(&data))
            .and_then(|_| file.flush())
            .map_err(|e| DisplayError::Framebuffer {
                details: format!("{}: {}", self.device, e),
            })?;
        Ok(())
    }
}

impl Display for FramebufferDisplay {
    fn size(&self) -> (u32, u32) {
        self.canvas.size()
    }

    fn clear(&mut self, colour: Option<Rgb<u8>>) -> Result<()> {
        self.canvas.clear(colour);
        Ok(())
    }

    fn show_message(&mut self, text: &str) -> Result<()> {
        self.canvas.draw_message(text);
        Ok(())
    }

    fn show_image(&mut self, path: &Path, target: Option<Rect>, mirrored: bool) -> Result<()> {
        self.canvas.draw_image(path, target, mirrored)
    }

    fn apply(&mut self) -> Result<()> {
        self.write_frame()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }
        self.canvas.clear(Some(Rgb([0, 0, 0])));
        let result = self.write_frame();
        self.file = None;
        info!("Framebuffer display {} released", self.device);
        result
    }
}

/// Line length reported by sysfs for `/dev/fbN`
fn read_stride(device: &str) -> Option<usize> {
    let name = Path::new(device).file_name()?.to_str()?;
    let stride = std::fs::read_to_string(format!("/sys/class/graphics/{}/stride", name)).ok()?;
    stride.trim().parse().ok()
}
