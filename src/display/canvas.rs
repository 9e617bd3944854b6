use super::Rect;
use crate::error::{DisplayError, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use std::path::Path;
use tracing::debug;

const TEXT_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);
const SHADOW_COLOUR: Rgb<u8> = Rgb([0, 0, 0]);

/// Off-screen RGB frame with message and picture drawing
pub struct Canvas {
    image: RgbImage,
    background: Rgb<u8>,
    font: Font<'static>,
    scale: Scale,
}

impl Canvas {
    pub fn new(size: (u32, u32), background: Rgb<u8>, font: Font<'static>, font_size: f32) -> Self {
        Self {
            image: RgbImage::from_pixel(size.0, size.1, background),
            background,
            font,
            scale: Scale::uniform(font_size),
        }
    }

    pub fn load_font(path: &str) -> Result<Font<'static>> {
        let data = std::fs::read(path).map_err(|e| DisplayError::Font {
            path: path.to_string(),
            details: e.to_string(),
        })?;
        Font::try_from_vec(data).ok_or_else(|| {
            DisplayError::Font {
                path: path.to_string(),
                details: "not a TrueType font".to_string(),
            }
            .into()
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn clear(&mut self, colour: Option<Rgb<u8>>) {
        let colour = colour.unwrap_or(self.background);
        for pixel in self.image.pixels_mut() {
            *pixel = colour;
        }
    }

    /// Centre multi-line text on the frame
    pub fn draw_message(&mut self, text: &str) {
        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() {
            return;
        }

        let line_height = (self.scale.y * 1.2).ceil() as i32;
        let (width, height) = self.size();
        let block_height = line_height * lines.len() as i32;
        let mut y = (height as i32 - block_height) / 2;

        for line in lines {
            if !line.is_empty() {
                let (line_width, _) = text_size(self.scale, &self.font, line);
                let x = (width as i32 - line_width) / 2;
                draw_text_mut(
                    &mut self.image,
                    SHADOW_COLOUR,
                    x + 2,
                    y + 2,
                    self.scale,
                    &self.font,
                    line,
                );
                draw_text_mut(
                    &mut self.image,
                    TEXT_COLOUR,
                    x,
                    y,
                    self.scale,
                    &self.font,
                    line,
                );
            }
            y += line_height;
        }
    }

    /// Scale a picture to fit `target` (whole frame by default) and centre it there
    pub fn draw_image(&mut self, path: &Path, target: Option<Rect>, mirrored: bool) -> Result<()> {
        let (width, height) = self.size();
        let target = target.unwrap_or(Rect::new(0, 0, width, height));

        let source = image::open(path)?;
        let (fit_w, fit_h) = fit_within(
            (source.width(), source.height()),
            (target.width, target.height),
        );
        let mut picture = source.resize_exact(fit_w, fit_h, FilterType::Triangle).to_rgb8();
        if mirrored {
            picture = imageops::flip_horizontal(&picture);
        }

        let x = target.x as i64 + (target.width.saturating_sub(fit_w) / 2) as i64;
        let y = target.y as i64 + (target.height.saturating_sub(fit_h) / 2) as i64;
        imageops::overlay(&mut self.image, &picture, x, y);

        debug!(
            "Drew {} at {},{} ({}x{}, mirrored: {})",
            path.display(),
            x,
            y,
            fit_w,
            fit_h,
            mirrored
        );
        Ok(())
    }
}

/// Largest size with the source's aspect ratio that fits the box
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let sw = source.0.max(1) as f32;
    let sh = source.1.max(1) as f32;
    let scale = (bounds.0 as f32 / sw).min(bounds.1 as f32 / sh);
    let w = (sw * scale).round().clamp(1.0, bounds.0.max(1) as f32);
    let h = (sh * scale).round().clamp(1.0, bounds.1.max(1) as f32);
    (w as u32, h as u32)
}
