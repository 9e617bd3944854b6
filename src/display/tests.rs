use super::*;
use crate::config::PixelFormat;
use image::{Rgb, RgbImage};
use tempfile::TempDir;

#[test]
fn test_rgb24_to_rgb565_conversion() {
    let rgb24_data = vec![
        255, 0, 0, // Red
        0, 255, 0, // Green
        0, 0, 255, // Blue
    ];

    let rgb565_data = DisplayConverter::rgb24_to_rgb565(&rgb24_data, 3, 1).unwrap();

    assert_eq!(rgb565_data.len(), 6);

    let red_pixel = ((rgb565_data[1] as u16) << 8) | (rgb565_data[0] as u16);
    assert_eq!(red_pixel, 0xF800);
    let green_pixel = ((rgb565_data[3] as u16) << 8) | (rgb565_data[2] as u16);
    assert_eq!(green_pixel, 0x07E0);
    let blue_pixel = ((rgb565_data[5] as u16) << 8) | (rgb565_data[4] as u16);
    assert_eq!(blue_pixel, 0x001F);
}

#[test]
fn test_rgb24_to_rgb565_invalid_size() {
    let invalid_data = vec![255, 0];
    let result = DisplayConverter::rgb24_to_rgb565(&invalid_data, 1, 1);
    assert!(result.is_err());
}

#[test]
fn test_rgb24_to_xrgb8888_byte_order() {
    let data = DisplayConverter::rgb24_to_xrgb8888(&[10, 20, 30], 1, 1).unwrap();
    assert_eq!(data, vec![30, 20, 10, 0xFF]);
}

#[test]
fn test_framebuffer_stride_padding() {
    let rgb = vec![255u8; 2 * 2 * 3];
    let data = DisplayConverter::to_framebuffer(&rgb, 2, 2, PixelFormat::Rgb565, 8).unwrap();

    assert_eq!(data.len(), 16);
    assert_eq!(&data[0..4], &[0xFF; 4]);
    assert_eq!(&data[4..8], &[0; 4]);
    assert_eq!(&data[8..12], &[0xFF; 4]);
}

#[test]
fn test_framebuffer_stride_too_small() {
    let rgb = vec![0u8; 4 * 3];
    let result = DisplayConverter::to_framebuffer(&rgb, 4, 1, PixelFormat::Xrgb8888, 8);
    assert!(result.is_err());
}

#[test]
fn test_fit_within_keeps_aspect_ratio() {
    assert_eq!(fit_within((1200, 800), (848, 480)), (720, 480));
    assert_eq!(fit_within((400, 100), (848, 480)), (848, 212));
    assert_eq!(fit_within((2352, 1568), (2352, 1568)), (2352, 1568));
}

#[test]
fn test_fit_within_degenerate_sizes() {
    let (w, h) = fit_within((10_000, 1), (100, 100));
    assert_eq!(w, 100);
    assert_eq!(h, 1);
}

#[tokio::test(start_paused = true)]
async fn test_headless_records_draw_calls() {
    let dir = TempDir::new().unwrap();
    let picture = dir.path().join("shot.jpg");
    RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))
        .save(&picture)
        .unwrap();

    let mut display = HeadlessDisplay::new((848, 480));
    let log = display.log();
    assert_eq!(display.size(), (848, 480));

    display.clear(None).unwrap();
    display.show_message("Hello\nthere").unwrap();
    let target = Rect::new(10, 10, 100, 100);
    display.show_image(&picture, Some(target), true).unwrap();
    display.apply().unwrap();

    assert_eq!(log.messages(), vec!["Hello\nthere".to_string()]);
    assert_eq!(log.images(), vec![picture.clone()]);
    assert_eq!(
        log.count(|op| matches!(op, DisplayOp::Image { mirrored: true, target: Some(t), .. } if *t == target)),
        1
    );
    assert_eq!(log.count(|op| *op == DisplayOp::Apply), 1);
    assert_eq!(log.records().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_headless_log_keeps_only_latest_records() {
    let mut display = HeadlessDisplay::with_log_capacity((320, 240), 8);
    let log = display.log();
    assert_eq!(log.capacity(), 8);

    for n in 0..1000 {
        display.show_message(&format!("frame {}", n)).unwrap();
        display.apply().unwrap();
    }

    let records = log.records();
    assert_eq!(records.len(), 8);
    assert_eq!(records[0].op, DisplayOp::Message("frame 996".to_string()));
    assert_eq!(records[7].op, DisplayOp::Apply);
    assert_eq!(log.messages().last().map(String::as_str), Some("frame 999"));
}

#[test]
fn test_headless_default_log_is_bounded() {
    let mut display = HeadlessDisplay::new((320, 240));
    let log = display.log();
    for _ in 0..DEFAULT_LOG_CAPACITY + 100 {
        display.apply().unwrap();
    }
    assert_eq!(log.records().len(), DEFAULT_LOG_CAPACITY);
}

#[tokio::test(start_paused = true)]
async fn test_headless_missing_image_fails() {
    let dir = TempDir::new().unwrap();
    let mut display = HeadlessDisplay::new((320, 240));
    let log = display.log();

    let result = display.show_image(&dir.path().join("missing.jpg"), None, false);
    assert!(result.is_err());
    assert!(log.images().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_headless_timestamps_follow_clock() {
    let mut display = HeadlessDisplay::new((320, 240));
    let log = display.log();

    display.show_message("first").unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    display.show_message("second").unwrap();

    let first = log
        .first_time(|op| matches!(op, DisplayOp::Message(m) if m == "first"))
        .unwrap();
    let second = log
        .first_time(|op| matches!(op, DisplayOp::Message(m) if m == "second"))
        .unwrap();
    assert_eq!(second - first, std::time::Duration::from_secs(3));
}
