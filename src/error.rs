use thiserror::Error;

/// Message shown on screen for errors that carry no user-facing text
pub const SERIOUS_ERROR_MESSAGE: &str = "SERIOUS ERROR!";

#[derive(Error, Debug)]
pub enum BoothError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("System error: {message}")]
    System { message: String },
}

impl BoothError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    /// Text presented to the guest when this error ends a session
    pub fn user_message(&self) -> String {
        match self {
            BoothError::Camera(e) => e.message.clone(),
            _ => SERIOUS_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Classified camera failure: either worth an immediate retry or not
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CameraError {
    pub message: String,
    pub recoverable: bool,
}

impl CameraError {
    pub fn recoverable<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            recoverable: true,
        }
    }

    pub fn fatal<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            recoverable: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Failed to open framebuffer {device}: {source}")]
    FramebufferOpen {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Framebuffer write failed: {details}")]
    Framebuffer { details: String },

    #[error("Failed to load font {path}: {details}")]
    Font { path: String, details: String },

    #[error("Format conversion error: {details}")]
    FormatConversion { details: String },
}

#[derive(Error, Debug)]
pub enum GpioError {
    #[error("Failed to export GPIO channel {channel}: {source}")]
    Export {
        channel: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("GPIO channel {channel} access failed: {source}")]
    Access {
        channel: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("GPIO channel {channel} is not configured as {direction}")]
    NotConfigured { channel: u32, direction: &'static str },
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied for input device: {0}")]
    PermissionDenied(String),

    #[error("Input device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, BoothError>;
