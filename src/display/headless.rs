use super::{Display, Rect};
use crate::error::Result;
use image::Rgb;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

/// One drawing call seen by the headless display
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOp {
    Clear(Option<[u8; 3]>),
    Message(String),
    Image {
        path: PathBuf,
        target: Option<Rect>,
        mirrored: bool,
    },
    Apply,
    Teardown,
}

#[derive(Debug, Clone)]
pub struct DisplayRecord {
    pub at: Instant,
    pub op: DisplayOp,
}

/// Records kept before the oldest ones are dropped
pub const DEFAULT_LOG_CAPACITY: usize = 4096;

/// Shared view of the most recent drawing calls of a headless display
#[derive(Debug, Clone)]
pub struct DisplayLog {
    records: Arc<Mutex<VecDeque<DisplayRecord>>>,
    capacity: usize,
}

impl DisplayLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    fn push(&self, op: DisplayOp) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(DisplayRecord {
            at: Instant::now(),
            op,
        });
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn records(&self) -> Vec<DisplayRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Every message shown so far, in order
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match &r.op {
                DisplayOp::Message(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every picture shown so far, in order
    pub fn images(&self) -> Vec<PathBuf> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match &r.op {
                DisplayOp::Image { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Time at which the first record matching `pred` was drawn
    pub fn first_time<F: Fn(&DisplayOp) -> bool>(&self, pred: F) -> Option<Instant> {
        self.records
            .lock()
            .iter()
            .find(|r| pred(&r.op))
            .map(|r| r.at)
    }

    pub fn count<F: Fn(&DisplayOp) -> bool>(&self, pred: F) -> usize {
        self.records.lock().iter().filter(|r| pred(&r.op)).count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

/// Display without an output device; logs what would be on screen
pub struct HeadlessDisplay {
    size: (u32, u32),
    log: DisplayLog,
}

impl Default for DisplayLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl HeadlessDisplay {
    pub fn new(size: (u32, u32)) -> Self {
        Self::with_log_capacity(size, DEFAULT_LOG_CAPACITY)
    }

    /// Headless display remembering at most `capacity` drawing calls
    pub fn with_log_capacity(size: (u32, u32), capacity: usize) -> Self {
        info!("Using headless display ({}x{})", size.0, size.1);
        Self {
            size,
            log: DisplayLog::with_capacity(capacity),
        }
    }

    pub fn log(&self) -> DisplayLog {
        self.log.clone()
    }
}

impl Display for HeadlessDisplay {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear(&mut self, colour: Option<Rgb<u8>>) -> Result<()> {
        self.log.push(DisplayOp::Clear(colour.map(|c| c.0)));
        Ok(())
    }

    fn show_message(&mut self, text: &str) -> Result<()> {
        info!(message = %text.replace('\n', " "), "Screen message");
        self.log.push(DisplayOp::Message(text.to_string()));
        Ok(())
    }

    fn show_image(&mut self, path: &Path, target: Option<Rect>, mirrored: bool) -> Result<()> {
        // Fail like a real display would on a missing file.
        std::fs::metadata(path)?;
        self.log.push(DisplayOp::Image {
            path: path.to_path_buf(),
            target,
            mirrored,
        });
        Ok(())
    }

    fn apply(&mut self) -> Result<()> {
        self.log.push(DisplayOp::Apply);
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        self.log.push(DisplayOp::Teardown);
        Ok(())
    }
}
