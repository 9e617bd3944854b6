use crate::config::PixelFormat;
use crate::error::{DisplayError, Result};

/// Pixel format conversion from the RGB canvas to framebuffer memory
pub struct DisplayConverter;

impl DisplayConverter {
    pub fn bytes_per_pixel(format: PixelFormat) -> usize {
        match format {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Xrgb8888 => 4,
        }
    }

    /// Convert RGB24 to little-endian RGB565
    pub fn rgb24_to_rgb565(rgb24_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        Self::check_rgb24_len(rgb24_data, width, height)?;

        let mut rgb565_data = Vec::with_capacity((width * height * 2) as usize);

        for chunk in rgb24_data.chunks_exact(3) {
            let r = chunk[0] >> 3;
            let g = chunk[1] >> 2;
            let b = chunk[2] >> 3;

            let rgb565 = ((r as u16) << 11) | ((g as u16) << 5) | (b as u16);

            rgb565_data.push((rgb565 & 0xFF) as u8);
            rgb565_data.push((rgb565 >> 8) as u8);
        }

        Ok(rgb565_data)
    }

    /// Convert RGB24 to little-endian XRGB8888 (B, G, R, X in memory)
    pub fn rgb24_to_xrgb8888(rgb24_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        Self::check_rgb24_len(rgb24_data, width, height)?;

        let mut out = Vec::with_capacity((width * height * 4) as usize);
        for chunk in rgb24_data.chunks_exact(3) {
            out.extend_from_slice(&[chunk[2], chunk[1], chunk[0], 0xFF]);
        }

        Ok(out)
    }

    /// Convert a whole canvas and lay rows out with the framebuffer's stride
    pub fn to_framebuffer(
        rgb24_data: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
    ) -> Result<Vec<u8>> {
        let packed = match format {
            PixelFormat::Rgb565 => Self::rgb24_to_rgb565(rgb24_data, width, height)?,
            PixelFormat::Xrgb8888 => Self::rgb24_to_xrgb8888(rgb24_data, width, height)?,
        };

        let row_bytes = width as usize * Self::bytes_per_pixel(format);
        if stride == row_bytes {
            return Ok(packed);
        }
        if stride < row_bytes {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Framebuffer stride {} is smaller than a {}-pixel row ({} bytes)",
                    stride, width, row_bytes
                ),
            }
            .into());
        }

        let mut out = vec![0u8; stride * height as usize];
        for (row, chunk) in packed.chunks_exact(row_bytes).enumerate() {
            out[row * stride..row * stride + row_bytes].copy_from_slice(chunk);
        }
        Ok(out)
    }

    fn check_rgb24_len(data: &[u8], width: u32, height: u32) -> Result<()> {
        let expected_size = (width * height * 3) as usize;
        if data.len() != expected_size {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Invalid RGB24 data size: expected {}, got {}",
                    expected_size,
                    data.len()
                ),
            }
            .into());
        }
        Ok(())
    }
}
