use crate::display::Display;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cycles through the composites already on disk
pub struct Slideshow {
    directory: PathBuf,
    prefix: String,
    suffix: String,
    pictures: Vec<PathBuf>,
    position: usize,
}

impl Slideshow {
    /// Browse files named `<basename>*<suffix>`
    pub fn new(basename: &Path, suffix: &str) -> Self {
        let directory = basename
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let prefix = basename
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            directory,
            prefix,
            suffix: suffix.to_string(),
            pictures: Vec::new(),
            position: 0,
        }
    }

    /// Re-read the directory; returns the number of composites found
    pub fn scan(&mut self) -> usize {
        let entries = match std::fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot browse {}: {}", self.directory.display(), e);
                self.pictures.clear();
                self.position = 0;
                return 0;
            }
        };

        let mut pictures: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&self.prefix) && n.ends_with(&self.suffix))
            })
            .collect();
        pictures.sort();

        debug!(
            "Slideshow found {} pictures in {}",
            pictures.len(),
            self.directory.display()
        );
        self.pictures = pictures;
        self.position = 0;
        self.pictures.len()
    }

    /// Next composite to show; rescans once the list is used up
    pub fn next_picture(&mut self) -> Option<PathBuf> {
        if self.position >= self.pictures.len() {
            self.scan();
        }
        let picture = self.pictures.get(self.position).cloned();
        if picture.is_some() {
            self.position += 1;
        }
        picture
    }

    /// Draw the next composite with `message` on top, or only the message
    pub fn display_next(&mut self, display: &mut dyn Display, message: &str) -> Result<()> {
        display.clear(None)?;
        if let Some(picture) = self.next_picture() {
            display.show_image(&picture, None, false)?;
        }
        display.show_message(message)?;
        display.apply()
    }
}
