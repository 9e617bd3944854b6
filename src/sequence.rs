use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;

/// Numbered filenames `<basename><counter><suffix>` with a zero-padded counter
///
/// The counter starts at the highest number already present on disk, so a
/// restarted booth never overwrites earlier pictures.
#[derive(Debug, Clone)]
pub struct PictureSequence {
    basename: PathBuf,
    suffix: String,
    counter: u64,
    width: usize,
}

impl PictureSequence {
    /// Scan the basename's directory (creating it if needed) and seed the counter
    pub fn init<P: AsRef<Path>>(basename: P, suffix: &str, width: usize) -> Result<Self> {
        let basename = basename.as_ref().to_path_buf();

        let dir = basename
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let prefix = basename
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut counter = 0;
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(n) = parse_counter(&name.to_string_lossy(), &prefix, suffix, width) {
                counter = counter.max(n);
            }
        }

        info!("Number of last existing file: {}", counter);
        info!(
            "Saving pictures as: {}{}{}",
            basename.display(),
            "X".repeat(width),
            suffix
        );

        Ok(Self {
            basename,
            suffix: suffix.to_string(),
            counter,
            width,
        })
    }

    pub fn get(&self, count: u64) -> PathBuf {
        let mut name = self.basename.as_os_str().to_os_string();
        name.push(format!("{:0width$}{}", count, self.suffix, width = self.width));
        PathBuf::from(name)
    }

    /// Path for the current counter value
    pub fn last(&self) -> PathBuf {
        self.get(self.counter)
    }

    /// Advance the counter and return the new path
    pub fn next(&mut self) -> PathBuf {
        self.counter += 1;
        self.get(self.counter)
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn basename(&self) -> &Path {
        &self.basename
    }
}

/// Extract N from `<prefix><exactly width digits><suffix>`
fn parse_counter(name: &str, prefix: &str, suffix: &str, width: usize) -> Option<u64> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.len() != width || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
