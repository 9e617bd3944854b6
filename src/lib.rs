pub mod booth;
pub mod camera;
pub mod composite;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod gpio;
pub mod hardware;
pub mod input;
pub mod sequence;
pub mod session;

pub use booth::{BoothController, Slideshow};
pub use camera::{Camera, CaptureOutcome, GPhoto2Camera, MockCamera};
pub use composite::{CompositeAssembler, CompositeRenderer};
pub use config::BoothConfig;
pub use display::{Display, FramebufferDisplay, HeadlessDisplay};
pub use error::{BoothError, CameraError, Result};
pub use events::{BoothEvent, Command, EventBindings, EventQueue, EventSender};
pub use gpio::{Gpio, SysfsGpio, VirtualGpio};
pub use hardware::Hardware;
pub use input::InputSources;
pub use sequence::PictureSequence;
pub use session::{CaptureSession, SessionOutcome};
