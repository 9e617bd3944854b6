use chrono::{Local, Utc};
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BoothConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub composite: CompositeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub idle: IdleConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    Framebuffer,
    Headless,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgb565,
    Xrgb8888,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    /// Output backend
    #[serde(default = "default_display_backend")]
    pub backend: DisplayBackend,

    /// Screen resolution (width, height)
    #[serde(default = "default_display_resolution")]
    pub resolution: (u32, u32),

    /// Framebuffer device path
    #[serde(default = "default_framebuffer_device")]
    pub framebuffer_device: String,

    /// Framebuffer pixel layout
    #[serde(default = "default_pixel_format")]
    pub pixel_format: PixelFormat,

    /// TrueType font used for on-screen messages
    #[serde(default = "default_font_path")]
    pub font_path: String,

    /// Message font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Background colour used by a plain clear
    #[serde(default = "default_display_background")]
    pub background: [u8; 3],
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackend {
    Gphoto2,
    Mock,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera driver
    #[serde(default = "default_camera_backend")]
    pub backend: CameraBackend,

    /// Use the live preview during the pose countdown when the camera offers one
    #[serde(default = "default_camera_preview")]
    pub preview: bool,

    /// gphoto2 executable
    #[serde(default = "default_gphoto2_binary")]
    pub gphoto2_binary: String,

    /// Still size produced by the mock camera
    #[serde(default = "default_mock_resolution")]
    pub mock_resolution: (u32, u32),

    /// Simulated capture latency of the mock camera
    #[serde(default = "default_mock_capture_millis")]
    pub mock_capture_millis: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GpioBackend {
    Sysfs,
    Virtual,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GpioConfig {
    #[serde(default = "default_gpio_backend")]
    pub backend: GpioBackend,

    /// Input channel of the capture button
    #[serde(default = "default_trigger_channel")]
    pub trigger_channel: u32,

    /// Input channel of the shutdown switch
    #[serde(default = "default_shutdown_channel")]
    pub shutdown_channel: u32,

    /// Output channel driving the button lamp
    #[serde(default = "default_lamp_channel")]
    pub lamp_channel: u32,

    /// Minimum spacing between two accepted edges on one input
    #[serde(default = "default_debounce_millis")]
    pub debounce_millis: u64,

    /// Input sampling period of the sysfs backend
    #[serde(default = "default_poll_millis")]
    pub poll_millis: u64,

    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InputConfig {
    /// Read key presses from the controlling terminal
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,

    /// Touch screen input device (evdev)
    #[serde(default)]
    pub touch_device: Option<String>,

    #[serde(default = "default_trigger_key")]
    pub trigger_key: char,

    #[serde(default = "default_quit_key")]
    pub quit_key: char,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Countdown length before each shot
    #[serde(default = "default_pose_seconds")]
    pub pose_seconds: u32,

    /// How long the initial "POSE!" message stays up
    #[serde(default = "default_pose_message_seconds")]
    pub pose_message_seconds: u32,

    /// How long the finished composite is shown
    #[serde(default = "default_display_seconds")]
    pub display_seconds: u32,

    /// Capture attempts per shot
    #[serde(default = "default_capture_attempts")]
    pub capture_attempts: u32,

    /// How long a recoverable camera error stays on screen before retrying
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u32,

    /// Minimum wall time of one successful capture attempt
    #[serde(default = "default_min_shot_millis")]
    pub min_shot_millis: u64,

    /// How long an error message stays up before returning to idle
    #[serde(default = "default_error_display_seconds")]
    pub error_display_seconds: u32,

    #[serde(default = "default_shutdown_delay_millis")]
    pub shutdown_delay_millis: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompositeNaming {
    /// `<processed basename><HHMMSS><suffix>`
    Timestamp,
    /// Next number of the processed picture sequence
    Sequence,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CompositeConfig {
    /// Size of the assembled image (width, height)
    #[serde(default = "default_composite_resolution")]
    pub resolution: (u32, u32),

    /// Gap between the canvas edge and the thumbnails
    #[serde(default = "default_outer_border")]
    pub outer_border: u32,

    /// Half of the gap between neighbouring thumbnails
    #[serde(default = "default_inner_border")]
    pub inner_border: u32,

    #[serde(default = "default_composite_background")]
    pub background: [u8; 3],

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default = "default_composite_naming")]
    pub naming: CompositeNaming,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Root directory for all pictures
    #[serde(default = "default_picture_dir")]
    pub picture_dir: String,

    /// strftime pattern of the composite basename, relative to `picture_dir`
    #[serde(default = "default_processed_basename")]
    pub processed_basename: String,

    /// strftime pattern of the raw capture basename, relative to `picture_dir`
    #[serde(default = "default_original_basename")]
    pub original_basename: String,

    /// Zero-pad width of sequence numbers
    #[serde(default = "default_counter_width")]
    pub counter_width: usize,

    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Scratch directory for preview frames; picked automatically when unset
    #[serde(default)]
    pub tmp_dir: Option<String>,

    /// Timezone for date-stamped names; local time when unset
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IdleConfig {
    /// Browse existing composites while idle
    #[serde(default = "default_slideshow")]
    pub slideshow: bool,

    #[serde(default = "default_slideshow_seconds")]
    pub slideshow_seconds: u32,

    #[serde(default = "default_idle_message")]
    pub message: String,
}

impl BoothConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("photobooth.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("PHOTOBOOTH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: BoothConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.resolution.0 == 0 || self.display.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Display resolution must be greater than 0".to_string(),
            ));
        }

        let (width, height) = self.composite.resolution;
        let border = self.composite.outer_border + self.composite.inner_border;
        if width / 2 <= border || height / 2 <= border {
            return Err(ConfigError::Message(format!(
                "Composite resolution {}x{} leaves no room for thumbnails with {}px of borders",
                width, height, border
            )));
        }

        if self.session.capture_attempts == 0 {
            return Err(ConfigError::Message(
                "Session capture_attempts must be greater than 0".to_string(),
            ));
        }

        let channels = [
            self.gpio.trigger_channel,
            self.gpio.shutdown_channel,
            self.gpio.lamp_channel,
        ];
        if channels[0] == channels[1] || channels[0] == channels[2] || channels[1] == channels[2]
        {
            return Err(ConfigError::Message(
                "GPIO trigger, shutdown and lamp channels must be distinct".to_string(),
            ));
        }

        if self.input.trigger_key == self.input.quit_key {
            return Err(ConfigError::Message(
                "Trigger key and quit key must differ".to_string(),
            ));
        }

        if self.storage.counter_width == 0 {
            return Err(ConfigError::Message(
                "Storage counter_width must be greater than 0".to_string(),
            ));
        }

        if self.composite.jpeg_quality == 0 || self.composite.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "Composite jpeg_quality must be within 1..=100".to_string(),
            ));
        }

        Ok(())
    }
}

impl StorageConfig {
    /// Format the current time with the configured timezone
    pub fn format_now(&self, pattern: &str) -> String {
        match &self.timezone {
            Some(name) => Utc::now()
                .with_timezone(&resolve_timezone(name))
                .format(pattern)
                .to_string(),
            None => Local::now().format(pattern).to_string(),
        }
    }

    /// Today's basename for assembled composites
    pub fn processed_basename(&self) -> PathBuf {
        Path::new(&self.picture_dir).join(self.format_now(&self.processed_basename))
    }

    /// Today's basename for raw captures
    pub fn original_basename(&self) -> PathBuf {
        Path::new(&self.picture_dir).join(self.format_now(&self.original_basename))
    }

    /// Scratch directory, preferring RAM-backed storage
    pub fn resolved_tmp_dir(&self) -> PathBuf {
        if let Some(dir) = &self.tmp_dir {
            return PathBuf::from(dir);
        }

        let shm = Path::new("/dev/shm");
        if is_writable_dir(shm) {
            debug!("Using {} for temporary files", shm.display());
            shm.to_path_buf()
        } else {
            debug!("Using system temp dir for temporary files");
            std::env::temp_dir()
        }
    }
}

/// Resolve configured timezone, falling back to UTC on parse errors
pub(crate) fn resolve_timezone(tz_name: &str) -> Tz {
    match tz_name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!("Invalid timezone '{}', falling back to UTC", tz_name);
            chrono_tz::UTC
        }
    }
}

fn is_writable_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let probe = dir.join(format!(".photobooth-probe-{}", std::process::id()));
    match OpenOptions::new().write(true).create(true).open(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backend: default_display_backend(),
            resolution: default_display_resolution(),
            framebuffer_device: default_framebuffer_device(),
            pixel_format: default_pixel_format(),
            font_path: default_font_path(),
            font_size: default_font_size(),
            background: default_display_background(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: default_camera_backend(),
            preview: default_camera_preview(),
            gphoto2_binary: default_gphoto2_binary(),
            mock_resolution: default_mock_resolution(),
            mock_capture_millis: default_mock_capture_millis(),
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            backend: default_gpio_backend(),
            trigger_channel: default_trigger_channel(),
            shutdown_channel: default_shutdown_channel(),
            lamp_channel: default_lamp_channel(),
            debounce_millis: default_debounce_millis(),
            poll_millis: default_poll_millis(),
            sysfs_root: default_sysfs_root(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard: default_keyboard(),
            touch_device: None,
            trigger_key: default_trigger_key(),
            quit_key: default_quit_key(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pose_seconds: default_pose_seconds(),
            pose_message_seconds: default_pose_message_seconds(),
            display_seconds: default_display_seconds(),
            capture_attempts: default_capture_attempts(),
            retry_delay_seconds: default_retry_delay_seconds(),
            min_shot_millis: default_min_shot_millis(),
            error_display_seconds: default_error_display_seconds(),
            shutdown_delay_millis: default_shutdown_delay_millis(),
        }
    }
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            resolution: default_composite_resolution(),
            outer_border: default_outer_border(),
            inner_border: default_inner_border(),
            background: default_composite_background(),
            jpeg_quality: default_jpeg_quality(),
            naming: default_composite_naming(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            picture_dir: default_picture_dir(),
            processed_basename: default_processed_basename(),
            original_basename: default_original_basename(),
            counter_width: default_counter_width(),
            suffix: default_suffix(),
            tmp_dir: None,
            timezone: None,
        }
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            slideshow: default_slideshow(),
            slideshow_seconds: default_slideshow_seconds(),
            message: default_idle_message(),
        }
    }
}

// Default value functions
fn default_display_backend() -> DisplayBackend {
    DisplayBackend::Framebuffer
}
fn default_display_resolution() -> (u32, u32) {
    (848, 480)
}
fn default_framebuffer_device() -> String {
    "/dev/fb0".to_string()
}
fn default_pixel_format() -> PixelFormat {
    PixelFormat::Rgb565
}
fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}
fn default_font_size() -> f32 {
    48.0
}
fn default_display_background() -> [u8; 3] {
    [0, 0, 0]
}

fn default_camera_backend() -> CameraBackend {
    CameraBackend::Gphoto2
}
fn default_camera_preview() -> bool {
    true
}
fn default_gphoto2_binary() -> String {
    "gphoto2".to_string()
}
fn default_mock_resolution() -> (u32, u32) {
    (1200, 800)
}
fn default_mock_capture_millis() -> u64 {
    200
}

fn default_gpio_backend() -> GpioBackend {
    GpioBackend::Sysfs
}
fn default_trigger_channel() -> u32 {
    18
}
fn default_shutdown_channel() -> u32 {
    24
}
fn default_lamp_channel() -> u32 {
    23
}
fn default_debounce_millis() -> u64 {
    200
}
fn default_poll_millis() -> u64 {
    10
}
fn default_sysfs_root() -> String {
    "/sys/class/gpio".to_string()
}

fn default_keyboard() -> bool {
    true
}
fn default_trigger_key() -> char {
    'c'
}
fn default_quit_key() -> char {
    'q'
}

fn default_pose_seconds() -> u32 {
    3
}
fn default_pose_message_seconds() -> u32 {
    2
}
fn default_display_seconds() -> u32 {
    10
}
fn default_capture_attempts() -> u32 {
    3
}
fn default_retry_delay_seconds() -> u32 {
    5
}
fn default_min_shot_millis() -> u64 {
    1000
}
fn default_error_display_seconds() -> u32 {
    3
}
fn default_shutdown_delay_millis() -> u64 {
    500
}

fn default_composite_resolution() -> (u32, u32) {
    (2352, 1568)
}
fn default_outer_border() -> u32 {
    50
}
fn default_inner_border() -> u32 {
    20
}
fn default_composite_background() -> [u8; 3] {
    [255, 255, 255]
}
fn default_jpeg_quality() -> u8 {
    90
}
fn default_composite_naming() -> CompositeNaming {
    CompositeNaming::Timestamp
}

fn default_picture_dir() -> String {
    "pictures".to_string()
}
fn default_processed_basename() -> String {
    "%Y-%m-%d/processed".to_string()
}
fn default_original_basename() -> String {
    "%Y-%m-%d/original".to_string()
}
fn default_counter_width() -> usize {
    5
}
fn default_suffix() -> String {
    ".jpg".to_string()
}

fn default_slideshow() -> bool {
    true
}
fn default_slideshow_seconds() -> u32 {
    5
}
fn default_idle_message() -> String {
    "Press the button!".to_string()
}
