use super::slideshow::Slideshow;
use crate::composite::CompositeAssembler;
use crate::config::BoothConfig;
use crate::error::{BoothError, Result};
use crate::events::{BoothEvent, Command, EventBindings, EventQueue, EventSender};
use crate::hardware::Hardware;
use crate::input::InputSources;
use crate::sequence::PictureSequence;
use crate::session::{CaptureSession, SessionOutcome};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

pub const SHUTDOWN_MESSAGE: &str = "Shutting down...";
const PREVIEW_FILE: &str = "photobooth_preview.jpg";

/// What the idle loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// Top-level booth loop: idle screen, event dispatch and error containment
pub struct BoothController {
    config: BoothConfig,
    hardware: Hardware,
    events: EventQueue,
    bindings: EventBindings,
    originals: PictureSequence,
    assembler: CompositeAssembler,
    slideshow: Option<Slideshow>,
    inputs: Option<InputSources>,
    tmp_dir: PathBuf,
    preview_path: PathBuf,
    torn_down: bool,
}

impl BoothController {
    pub fn new(config: BoothConfig, mut hardware: Hardware, events: EventQueue) -> Result<Self> {
        let storage = &config.storage;
        let originals =
            PictureSequence::init(storage.original_basename(), &storage.suffix, storage.counter_width)?;
        let processed = PictureSequence::init(
            storage.processed_basename(),
            &storage.suffix,
            storage.counter_width,
        )?;
        let assembler = CompositeAssembler::new(&config.composite, storage, processed);

        let slideshow = config
            .idle
            .slideshow
            .then(|| Slideshow::new(assembler.basename(), &storage.suffix));

        for channel in [config.gpio.trigger_channel, config.gpio.shutdown_channel] {
            hardware.gpio.setup_input(channel, events.sender())?;
        }

        let tmp_dir = storage.resolved_tmp_dir();
        let preview_path = tmp_dir.join(PREVIEW_FILE);
        let bindings = EventBindings::from_config(&config.input, &config.gpio);

        Ok(Self {
            config,
            hardware,
            events,
            bindings,
            originals,
            assembler,
            slideshow,
            inputs: None,
            tmp_dir,
            preview_path,
            torn_down: false,
        })
    }

    /// Hand over input sources so teardown can stop them
    pub fn attach_inputs(&mut self, inputs: InputSources) {
        self.inputs = Some(inputs);
    }

    pub fn sender(&self) -> EventSender {
        self.events.sender()
    }

    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    /// Run until shutdown; returns the process exit code
    pub async fn run(&mut self) -> i32 {
        info!("Photobooth running");
        self.events.drain();

        loop {
            match self.serve().await {
                Ok(()) => break,
                Err(e) => {
                    if self.handle_error(&e).await == Flow::Shutdown {
                        break;
                    }
                }
            }
        }

        self.teardown().await;
        0
    }

    /// Idle until shutdown is requested; errors end the current pass
    async fn serve(&mut self) -> Result<()> {
        self.hardware.set_lamp(true)?;

        loop {
            self.hardware.camera.set_idle().await?;

            if self.slideshow.is_some() {
                if self.run_slide().await? == Flow::Shutdown {
                    return Ok(());
                }
            } else {
                let message = self.config.idle.message.clone();
                self.hardware.show_message(&message, None)?;
                let event = self.events.wait().await;
                if self.handle_event(event).await? == Flow::Shutdown {
                    return Ok(());
                }
            }
        }
    }

    /// Show one slideshow frame and handle events until its time is up
    async fn run_slide(&mut self) -> Result<Flow> {
        if let Some(slideshow) = self.slideshow.as_mut() {
            slideshow.display_next(self.hardware.display.as_mut(), &self.config.idle.message)?;
        }

        let deadline =
            Instant::now() + Duration::from_secs(self.config.idle.slideshow_seconds as u64);
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(Flow::Continue);
            }
            match self.events.wait_timeout(deadline - now).await {
                Some(event) => {
                    if self.handle_event(event).await? == Flow::Shutdown {
                        return Ok(Flow::Shutdown);
                    }
                }
                None => return Ok(Flow::Continue),
            }
        }
    }

    async fn handle_event(&mut self, event: BoothEvent) -> Result<Flow> {
        debug!("Handling {}", event.description());
        match self.bindings.command_for(&event) {
            Command::Capture => self.capture().await,
            Command::Shutdown => {
                info!("Shutdown requested by {}", event.description());
                Ok(Flow::Shutdown)
            }
            Command::Ignore => {
                if let BoothEvent::MouseClick { .. } = event {
                    info!("Mouse click capture is disabled");
                }
                Ok(Flow::Continue)
            }
        }
    }

    async fn capture(&mut self) -> Result<Flow> {
        let session = CaptureSession {
            config: &self.config.session,
            hardware: &mut self.hardware,
            events: &mut self.events,
            bindings: &self.bindings,
            originals: &mut self.originals,
            assembler: &mut self.assembler,
            preview_path: &self.preview_path,
        };

        match session.run().await? {
            SessionOutcome::Completed { .. } => Ok(Flow::Continue),
            SessionOutcome::Interrupted => Ok(Flow::Shutdown),
        }
    }

    /// Log the error and keep it on screen for the configured time, then
    /// discard triggers queued meanwhile; a queued shutdown is still honoured
    async fn handle_error(&mut self, err: &BoothError) -> Flow {
        let message = err.user_message();
        match err {
            BoothError::Camera(_) => error!("Error: {}", err),
            _ => error!("SERIOUS ERROR: {:?}", err),
        }

        let text = format!("ERROR:\n\n{}", message);
        if let Err(e) = self.hardware.show_message(&text, None) {
            warn!("Could not show error on screen: {}", e);
        }
        sleep(Duration::from_secs(self.config.session.error_display_seconds as u64)).await;

        let discarded = self.events.drain();
        match discarded
            .iter()
            .find(|event| self.bindings.command_for(event) == Command::Shutdown)
        {
            Some(event) => {
                info!("Shutdown requested by {}", event.description());
                Flow::Shutdown
            }
            None => Flow::Continue,
        }
    }

    /// Release everything; later calls do nothing
    pub async fn teardown(&mut self) {
        if self.torn_down {
            debug!("Teardown already done");
            return;
        }
        self.torn_down = true;
        info!("Shutting down photobooth");

        if let Err(e) = self.hardware.show_message(SHUTDOWN_MESSAGE, None) {
            warn!("Could not show shutdown message: {}", e);
        }
        if let Err(e) = self.hardware.set_lamp(false) {
            warn!("Could not switch lamp off: {}", e);
        }
        sleep(Duration::from_millis(self.config.session.shutdown_delay_millis)).await;

        if let Err(e) = self.hardware.display.teardown() {
            warn!("Display teardown failed: {}", e);
        }
        if let Err(e) = self.hardware.gpio.teardown() {
            warn!("GPIO teardown failed: {}", e);
        }
        if let Some(mut inputs) = self.inputs.take() {
            inputs.stop().await;
        }

        let removed = remove_tempfiles(&self.tmp_dir);
        debug!("Removed {} temporary files", removed);
        info!("Photobooth stopped");
    }
}

/// Delete `photobooth_*.jpg` scratch files, ignoring failures
fn remove_tempfiles(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("photobooth_") && n.ends_with(".jpg"))
        })
        .filter(|path| std::fs::remove_file(path).is_ok())
        .count()
}
