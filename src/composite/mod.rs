mod layout;

pub use layout::{CompositeLayout, Placement, Quadrant};

use crate::config::{CompositeConfig, CompositeNaming, StorageConfig};
use crate::error::{BoothError, Result};
use crate::sequence::PictureSequence;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Draws four stills into one 2x2 JPEG
#[derive(Debug, Clone)]
pub struct CompositeRenderer {
    layout: CompositeLayout,
    background: Rgb<u8>,
    jpeg_quality: u8,
}

impl CompositeRenderer {
    pub fn new(config: &CompositeConfig) -> Self {
        Self {
            layout: CompositeLayout::new(
                config.resolution,
                config.outer_border,
                config.inner_border,
            ),
            background: Rgb(config.background),
            jpeg_quality: config.jpeg_quality,
        }
    }

    pub fn layout(&self) -> &CompositeLayout {
        &self.layout
    }

    /// Compose the inputs (in quadrant order) and write `output`
    pub fn render(&self, inputs: &[PathBuf; 4], output: &Path) -> Result<Vec<Placement>> {
        let (width, height) = self.layout.canvas;
        let mut canvas = RgbImage::from_pixel(width, height, self.background);
        let mut placements = Vec::with_capacity(4);

        for (input, quadrant) in inputs.iter().zip(Quadrant::ALL) {
            let source = image::open(input)?;
            let size = self.layout.thumbnail_size((source.width(), source.height()));

            let thumbnail = if size == (source.width(), source.height()) {
                source.to_rgb8()
            } else {
                source.resize_exact(size.0, size.1, FilterType::Triangle).to_rgb8()
            };

            let placement = self.layout.place(quadrant, size);
            imageops::overlay(
                &mut canvas,
                &thumbnail,
                placement.x as i64,
                placement.y as i64,
            );
            debug!(
                "Placed {} at {:?} ({}x{} at {},{})",
                input.display(),
                quadrant,
                placement.width,
                placement.height,
                placement.x,
                placement.y
            );
            placements.push(placement);
        }

        let mut writer = BufWriter::new(File::create(output)?);
        JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality).encode_image(&canvas)?;

        Ok(placements)
    }
}

/// Assembles session captures and picks the composite's filename
pub struct CompositeAssembler {
    renderer: CompositeRenderer,
    naming: CompositeNaming,
    processed: PictureSequence,
    storage: StorageConfig,
}

impl CompositeAssembler {
    pub fn new(
        config: &CompositeConfig,
        storage: &StorageConfig,
        processed: PictureSequence,
    ) -> Self {
        Self {
            renderer: CompositeRenderer::new(config),
            naming: config.naming,
            processed,
            storage: storage.clone(),
        }
    }

    pub fn renderer(&self) -> &CompositeRenderer {
        &self.renderer
    }

    /// Directory and file prefix shared by every composite
    pub fn basename(&self) -> &Path {
        self.processed.basename()
    }

    /// Filename for the next composite
    pub fn next_output_path(&mut self) -> PathBuf {
        match self.naming {
            CompositeNaming::Timestamp => {
                let mut stem = self.processed.basename().as_os_str().to_os_string();
                stem.push(self.storage.format_now("%H%M%S"));
                unused_path(&stem, &self.storage.suffix)
            }
            CompositeNaming::Sequence => self.processed.next(),
        }
    }

    /// Build the composite off the control task and return its path
    pub async fn assemble(&mut self, inputs: [PathBuf; 4]) -> Result<PathBuf> {
        let output = self.next_output_path();
        let renderer = self.renderer.clone();
        let target = output.clone();

        info!("Assembling composite {}", output.display());
        tokio::task::spawn_blocking(move || renderer.render(&inputs, &target))
            .await
            .map_err(|e| BoothError::system(format!("Composite task failed: {}", e)))??;

        Ok(output)
    }
}

/// `<stem><suffix>`, or `<stem>_<n><suffix>` with the lowest free `n`
fn unused_path(stem: &OsStr, suffix: &str) -> PathBuf {
    let candidate = |tag: Option<u32>| {
        let mut name = OsString::from(stem);
        if let Some(n) = tag {
            name.push(format!("_{}", n));
        }
        name.push(suffix);
        PathBuf::from(name)
    };

    let mut path = candidate(None);
    let mut n = 0;
    while path.exists() {
        n += 1;
        path = candidate(Some(n));
    }
    if n > 0 {
        debug!("Composite name taken, using {}", path.display());
    }
    path
}
