use super::*;
use crate::camera::{MockCamera, MockCameraStats, MockShot};
use crate::config::{BoothConfig, CompositeNaming};
use crate::display::{Display, DisplayLog, DisplayOp, HeadlessDisplay, Rect};
use crate::error::{BoothError, Result};
use crate::events::{BoothEvent, EventQueue};
use crate::gpio::{GpioLevels, VirtualGpio};
use crate::hardware::Hardware;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};

const TRIGGER: u32 = 18;
const SHUTDOWN: u32 = 24;
const LAMP: u32 = 23;
const IDLE: &str = "Press the button!";

fn test_config(dir: &Path) -> BoothConfig {
    let mut config = BoothConfig::default();
    config.storage.picture_dir = dir.join("pictures").to_string_lossy().into_owned();
    config.storage.tmp_dir = Some(dir.join("tmp").to_string_lossy().into_owned());
    config.composite.resolution = (480, 320);
    config.composite.outer_border = 10;
    config.composite.inner_border = 4;
    config.composite.naming = CompositeNaming::Sequence;
    config.idle.slideshow = false;
    std::fs::create_dir_all(dir.join("tmp")).unwrap();
    config
}

/// Headless display whose idle screen fails a given number of times
struct FlakyDisplay {
    inner: HeadlessDisplay,
    failing_message: String,
    failures: usize,
}

impl Display for FlakyDisplay {
    fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    fn clear(&mut self, colour: Option<Rgb<u8>>) -> Result<()> {
        self.inner.clear(colour)
    }

    fn show_message(&mut self, text: &str) -> Result<()> {
        if text == self.failing_message && self.failures > 0 {
            self.failures -= 1;
            return Err(BoothError::system("display lost"));
        }
        self.inner.show_message(text)
    }

    fn show_image(&mut self, path: &Path, target: Option<Rect>, mirrored: bool) -> Result<()> {
        self.inner.show_image(path, target, mirrored)
    }

    fn apply(&mut self) -> Result<()> {
        self.inner.apply()
    }

    fn teardown(&mut self) -> Result<()> {
        self.inner.teardown()
    }
}

struct Booth {
    controller: BoothController,
    log: DisplayLog,
    levels: GpioLevels,
    stats: Arc<MockCameraStats>,
}

fn booth_with_display(config: BoothConfig, display: Box<dyn Display>, log: DisplayLog) -> Booth {
    let camera = MockCamera::new((120, 80), Duration::from_millis(200));
    booth_with_parts(config, camera, display, log)
}

fn booth_with_parts(
    config: BoothConfig,
    camera: MockCamera,
    display: Box<dyn Display>,
    log: DisplayLog,
) -> Booth {
    let stats = camera.stats();
    let gpio = VirtualGpio::new();
    let levels = gpio.levels();
    let hardware = Hardware::new(Box::new(camera), display, Box::new(gpio), LAMP).unwrap();
    let controller = BoothController::new(config, hardware, EventQueue::new()).unwrap();
    Booth {
        controller,
        log,
        levels,
        stats,
    }
}

fn booth(config: BoothConfig) -> Booth {
    let display = HeadlessDisplay::new((848, 480));
    let log = display.log();
    booth_with_display(config, Box::new(display), log)
}

fn write_picture(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(16, 16, Rgb([10, 20, 30]))
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

fn composite_name(config: &BoothConfig, n: u32) -> PathBuf {
    let mut name = config.storage.processed_basename().into_os_string();
    name.push(format!("{:05}.jpg", n));
    PathBuf::from(name)
}

#[tokio::test(start_paused = true)]
async fn test_trigger_runs_session_and_returns_to_idle() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let processed_dir = config.storage.processed_basename().parent().unwrap().to_path_buf();
    let mut booth = booth(config);

    let levels = booth.levels.clone();
    let stats = Arc::clone(&booth.stats);
    let (code, ()) = tokio::join!(booth.controller.run(), async {
        sleep(Duration::from_secs(1)).await;
        assert!(levels.press(TRIGGER));
        while !(stats.pictures() == 4 && levels.level(LAMP) == Some(true)) {
            sleep(Duration::from_millis(100)).await;
        }
        assert!(levels.press(SHUTDOWN));
    });
    assert_eq!(code, 0);

    let images = booth.log.images();
    assert_eq!(images.len(), 1);
    let composite = &images[0];
    assert!(composite.exists());
    assert!(composite.starts_with(&processed_dir));

    let originals: Vec<PathBuf> = std::fs::read_dir(&processed_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p != composite)
        .collect();
    assert_eq!(originals.len(), 4);
    for original in &originals {
        let name = original.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("original"));
    }

    // Idle screen comes back after the composite was shown.
    let records = booth.log.records();
    let shown = records
        .iter()
        .position(|r| matches!(&r.op, DisplayOp::Image { path, .. } if path == composite))
        .unwrap();
    assert!(records[shown..]
        .iter()
        .any(|r| matches!(&r.op, DisplayOp::Message(m) if m == IDLE)));
}

#[tokio::test(start_paused = true)]
async fn test_idle_error_is_shown_for_configured_time() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let inner = HeadlessDisplay::new((848, 480));
    let log = inner.log();
    let display = FlakyDisplay {
        inner,
        failing_message: IDLE.to_string(),
        failures: 1,
    };
    let mut booth = booth_with_display(config, Box::new(display), log);

    let sender = booth.controller.sender();
    let (code, ()) = tokio::join!(booth.controller.run(), async {
        sleep(Duration::from_secs(10)).await;
        sender.send(BoothEvent::Shutdown);
    });
    assert_eq!(code, 0);

    let error_at = booth
        .log
        .first_time(|op| matches!(op, DisplayOp::Message(m) if m == "ERROR:\n\nSERIOUS ERROR!"))
        .unwrap();
    let idle_at = booth
        .log
        .first_time(|op| matches!(op, DisplayOp::Message(m) if m == IDLE))
        .unwrap();
    assert_eq!(idle_at - error_at, Duration::from_secs(3));
    assert_eq!(booth.levels.level(LAMP), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_tears_down_exactly_once() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let tmp = dir.path().join("tmp");
    std::fs::write(tmp.join("photobooth_preview.jpg"), b"x").unwrap();
    std::fs::write(tmp.join("photobooth_01.jpg"), b"x").unwrap();
    std::fs::write(tmp.join("notes.txt"), b"x").unwrap();
    let mut booth = booth(config);

    let sender = booth.controller.sender();
    let levels = booth.levels.clone();
    let started = Instant::now();
    let (code, ()) = tokio::join!(booth.controller.run(), async {
        sleep(Duration::from_secs(1)).await;
        sender.send(BoothEvent::MouseClick {
            button: 1,
            position: (10, 10),
        });
        levels.press(SHUTDOWN);
        sender.send(BoothEvent::Shutdown);
    });
    assert_eq!(code, 0);
    booth.controller.teardown().await;

    assert_eq!(booth.stats.pictures(), 0);
    assert_eq!(booth.log.count(|op| *op == DisplayOp::Teardown), 1);
    assert_eq!(
        booth
            .log
            .count(|op| matches!(op, DisplayOp::Message(m) if m == SHUTDOWN_MESSAGE)),
        1
    );
    assert_eq!(booth.levels.teardowns(), 1);
    assert_eq!(booth.levels.level(LAMP), Some(false));
    assert!(!booth.controller.hardware().lamp_on());
    assert!(Instant::now() - started >= Duration::from_millis(1500));

    assert!(!tmp.join("photobooth_preview.jpg").exists());
    assert!(!tmp.join("photobooth_01.jpg").exists());
    assert!(tmp.join("notes.txt").exists());
}

#[tokio::test(start_paused = true)]
async fn test_triggers_queued_during_failed_session_are_discarded() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let camera = MockCamera::new((120, 80), Duration::from_secs(5))
        .with_script([MockShot::Fatal("No camera found".to_string())]);
    let display = HeadlessDisplay::new((848, 480));
    let log = display.log();
    let mut booth = booth_with_parts(config, camera, Box::new(display), log);

    let levels = booth.levels.clone();
    let stats = Arc::clone(&booth.stats);
    let sender = booth.controller.sender();
    let (code, ()) = tokio::join!(booth.controller.run(), async {
        sleep(Duration::from_secs(1)).await;
        assert!(levels.press(TRIGGER));
        while stats.pictures() == 0 {
            sleep(Duration::from_millis(100)).await;
        }
        // Impatient presses while the camera hangs.
        assert!(levels.press(TRIGGER));
        sender.send(BoothEvent::KeyPress('c'));
        assert!(levels.press(TRIGGER));
        sleep(Duration::from_secs(30)).await;
        sender.send(BoothEvent::Shutdown);
    });
    assert_eq!(code, 0);

    assert_eq!(booth.stats.pictures(), 1);
    assert_eq!(
        booth
            .log
            .count(|op| matches!(op, DisplayOp::Message(m) if m == "ERROR:\n\nNo camera found")),
        1
    );
    let error_at = booth
        .log
        .first_time(|op| matches!(op, DisplayOp::Message(m) if m.starts_with("ERROR:")))
        .unwrap();
    let records = booth.log.records();
    assert!(records
        .iter()
        .any(|r| r.at > error_at && matches!(&r.op, DisplayOp::Message(m) if m == IDLE)));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_queued_during_error_screen_is_honoured() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let camera = MockCamera::new((120, 80), Duration::from_millis(200))
        .with_script([MockShot::Fatal("No camera found".to_string())]);
    let display = HeadlessDisplay::new((848, 480));
    let log = display.log();
    let mut booth = booth_with_parts(config, camera, Box::new(display), log);

    let levels = booth.levels.clone();
    let stats = Arc::clone(&booth.stats);
    let started = Instant::now();
    let (code, ()) = tokio::join!(booth.controller.run(), async {
        sleep(Duration::from_secs(1)).await;
        assert!(levels.press(TRIGGER));
        while stats.pictures() == 0 {
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_secs(1)).await;
        assert!(levels.press(SHUTDOWN));
    });
    assert_eq!(code, 0);

    assert!(Instant::now() - started < Duration::from_secs(20));
    assert_eq!(booth.log.count(|op| *op == DisplayOp::Teardown), 1);
    assert_eq!(booth.levels.teardowns(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_session_tears_down_once() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let processed_dir = config.storage.processed_basename().parent().unwrap().to_path_buf();
    let mut booth = booth(config);

    let levels = booth.levels.clone();
    let sender = booth.controller.sender();
    let (code, ()) = tokio::join!(booth.controller.run(), async {
        sleep(Duration::from_secs(1)).await;
        assert!(levels.press(TRIGGER));
        sleep(Duration::from_secs(1)).await;
        sender.send(BoothEvent::Shutdown);
        assert!(levels.press(SHUTDOWN));
    });
    assert_eq!(code, 0);
    booth.controller.teardown().await;

    assert_eq!(booth.stats.pictures(), 0);
    assert!(booth.log.images().is_empty());
    assert_eq!(booth.log.count(|op| *op == DisplayOp::Teardown), 1);
    assert_eq!(
        booth
            .log
            .count(|op| matches!(op, DisplayOp::Message(m) if m == SHUTDOWN_MESSAGE)),
        1
    );
    assert_eq!(booth.levels.teardowns(), 1);
    assert_eq!(booth.levels.level(LAMP), Some(false));
    assert_eq!(std::fs::read_dir(&processed_dir).unwrap().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slideshow_cycles_existing_composites() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.idle.slideshow = true;
    config.idle.slideshow_seconds = 5;
    let first = composite_name(&config, 1);
    let second = composite_name(&config, 2);
    write_picture(&first);
    write_picture(&second);
    let mut booth = booth(config);

    let sender = booth.controller.sender();
    let (code, ()) = tokio::join!(booth.controller.run(), async {
        sleep(Duration::from_secs(12)).await;
        sender.send(BoothEvent::Shutdown);
    });
    assert_eq!(code, 0);

    assert_eq!(booth.log.images(), vec![first.clone(), second, first]);
    assert_eq!(booth.stats.idles(), 3);
}

#[test]
fn test_slideshow_rescans_for_new_pictures() {
    let dir = TempDir::new().unwrap();
    let basename = dir.path().join("processed");
    write_picture(&dir.path().join("processed00001.jpg"));
    write_picture(&dir.path().join("original00001.jpg"));
    std::fs::write(dir.path().join("processed00002.txt"), b"x").unwrap();

    let mut slideshow = Slideshow::new(&basename, ".jpg");
    assert_eq!(slideshow.scan(), 1);
    assert_eq!(
        slideshow.next_picture(),
        Some(dir.path().join("processed00001.jpg"))
    );

    write_picture(&dir.path().join("processed00002.jpg"));
    assert_eq!(
        slideshow.next_picture(),
        Some(dir.path().join("processed00001.jpg"))
    );
    assert_eq!(
        slideshow.next_picture(),
        Some(dir.path().join("processed00002.jpg"))
    );
}

#[test]
fn test_slideshow_without_pictures_shows_message() {
    let dir = TempDir::new().unwrap();
    let mut slideshow = Slideshow::new(&dir.path().join("missing/processed"), ".jpg");
    let mut display = HeadlessDisplay::new((320, 240));
    let log = display.log();

    slideshow.display_next(&mut display, IDLE).unwrap();

    assert!(log.images().is_empty());
    assert_eq!(log.messages(), vec![IDLE.to_string()]);
}
