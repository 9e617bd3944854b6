use super::Gpio;
use crate::config::GpioConfig;
use crate::error::{GpioError, Result};
use crate::events::EventSender;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// GPIO through the legacy `/sys/class/gpio` interface
pub struct SysfsGpio {
    root: PathBuf,
    debounce: Duration,
    poll_interval: Duration,
    exported: Vec<u32>,
    inputs: HashSet<u32>,
    outputs: HashSet<u32>,
    stop: Arc<AtomicBool>,
    watchers: Vec<JoinHandle<()>>,
}

impl SysfsGpio {
    pub fn new(config: &GpioConfig) -> Self {
        info!("Using sysfs GPIO at {}", config.sysfs_root);
        Self {
            root: PathBuf::from(&config.sysfs_root),
            debounce: Duration::from_millis(config.debounce_millis),
            poll_interval: Duration::from_millis(config.poll_millis.max(1)),
            exported: Vec::new(),
            inputs: HashSet::new(),
            outputs: HashSet::new(),
            stop: Arc::new(AtomicBool::new(false)),
            watchers: Vec::new(),
        }
    }

    fn channel_dir(&self, channel: u32) -> PathBuf {
        self.root.join(format!("gpio{}", channel))
    }

    fn export(&mut self, channel: u32) -> Result<()> {
        if self.exported.contains(&channel) {
            return Ok(());
        }
        if !self.channel_dir(channel).exists() {
            std::fs::write(self.root.join("export"), channel.to_string())
                .map_err(|source| GpioError::Export { channel, source })?;
            debug!("Exported GPIO {}", channel);
        }
        self.exported.push(channel);
        Ok(())
    }

    fn write_attr(&self, channel: u32, attr: &str, value: &str) -> Result<()> {
        std::fs::write(self.channel_dir(channel).join(attr), value)
            .map_err(|source| GpioError::Access { channel, source })?;
        Ok(())
    }
}

impl Gpio for SysfsGpio {
    fn name(&self) -> &str {
        "sysfs"
    }

    fn setup_input(&mut self, channel: u32, events: EventSender) -> Result<()> {
        if self.inputs.contains(&channel) {
            return Ok(());
        }
        self.export(channel)?;
        self.write_attr(channel, "direction", "in")?;

        // Restart watching if a previous teardown stopped the threads.
        if self.stop.load(Ordering::Relaxed) {
            self.stop = Arc::new(AtomicBool::new(false));
        }

        let watcher = EdgeWatcher {
            channel,
            value_path: self.channel_dir(channel).join("value"),
            debounce: self.debounce,
            poll_interval: self.poll_interval,
            stop: Arc::clone(&self.stop),
            events,
        };
        let handle = thread::Builder::new()
            .name(format!("gpio{}-watch", channel))
            .spawn(move || watcher.run())?;

        self.watchers.push(handle);
        self.inputs.insert(channel);
        info!("GPIO {} configured as input", channel);
        Ok(())
    }

    fn setup_output(&mut self, channel: u32) -> Result<()> {
        self.export(channel)?;
        self.write_attr(channel, "direction", "out")?;
        self.outputs.insert(channel);
        info!("GPIO {} configured as output", channel);
        Ok(())
    }

    fn set_output(&mut self, channel: u32, high: bool) -> Result<()> {
        if !self.outputs.contains(&channel) {
            return Err(GpioError::NotConfigured {
                channel,
                direction: "output",
            }
            .into());
        }
        self.write_attr(channel, "value", if high { "1" } else { "0" })
    }

    fn teardown(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.watchers.drain(..) {
            if handle.join().is_err() {
                error!("GPIO watcher thread panicked");
            }
        }

        let outputs: Vec<u32> = self.outputs.drain().collect();
        for channel in outputs {
            if let Err(e) = self.write_attr(channel, "value", "0") {
                warn!("Failed to drive GPIO {} low: {}", channel, e);
            }
        }
        self.inputs.clear();

        for channel in std::mem::take(&mut self.exported) {
            if let Err(e) = std::fs::write(self.root.join("unexport"), channel.to_string()) {
                warn!("Failed to unexport GPIO {}: {}", channel, e);
            }
        }
        debug!("Sysfs GPIO released");
        Ok(())
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Polls one input and reports debounced falling edges
struct EdgeWatcher {
    channel: u32,
    value_path: PathBuf,
    debounce: Duration,
    poll_interval: Duration,
    stop: Arc<AtomicBool>,
    events: EventSender,
}

impl EdgeWatcher {
    fn run(self) {
        debug!("Watching GPIO {}", self.channel);
        // Buttons are pulled up; released reads high.
        let mut last_level = read_level(&self.value_path).unwrap_or(true);
        let mut last_edge: Option<Instant> = None;

        while !self.stop.load(Ordering::Relaxed) {
            if let Some(level) = read_level(&self.value_path) {
                if last_level && !level {
                    let now = Instant::now();
                    let bounced = last_edge.is_some_and(|t| now.duration_since(t) < self.debounce);
                    if bounced {
                        debug!("GPIO {} edge ignored (debounce)", self.channel);
                    } else {
                        debug!("GPIO {} falling edge", self.channel);
                        last_edge = Some(now);
                        self.events.trigger_event(self.channel);
                    }
                }
                last_level = level;
            }
            thread::sleep(self.poll_interval);
        }
        debug!("Stopped watching GPIO {}", self.channel);
    }
}

fn read_level(path: &Path) -> Option<bool> {
    let raw = std::fs::read_to_string(path).ok()?;
    match raw.trim() {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}
