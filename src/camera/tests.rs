use super::gphoto2::classify_failure;
use super::*;
use crate::config::CameraConfig;
use std::time::Duration;

#[test]
fn test_classify_failure() {
    let busy = classify_failure("*** Error: Could not claim the USB device ***");
    assert!(busy.recoverable);

    let focus = classify_failure("ERROR: Canon EOS Capture failed: out of focus");
    assert!(focus.recoverable);
    assert!(focus.message.contains("Focusing"));

    let missing = classify_failure("*** Error: No camera found. ***");
    assert!(!missing.recoverable);
    assert_eq!(missing.message, "No camera found!");

    let unknown = classify_failure("\n  something odd happened\nmore");
    assert!(!unknown.recoverable);
    assert_eq!(unknown.message, "Camera error: something odd happened");
}

#[test]
fn test_capture_outcome_from_result() {
    assert_eq!(
        CaptureOutcome::from(Ok(PathBuf::from("a.jpg"))),
        CaptureOutcome::Success(PathBuf::from("a.jpg"))
    );
    assert_eq!(
        CaptureOutcome::from(Err(CameraError::recoverable("busy"))),
        CaptureOutcome::RecoverableFailure("busy".to_string())
    );
    assert_eq!(
        CaptureOutcome::from(Err(CameraError::fatal("gone"))),
        CaptureOutcome::FatalFailure("gone".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_mock_camera_follows_script() {
    let dir = tempfile::tempdir().unwrap();
    let mut camera = MockCamera::new((64, 48), Duration::from_millis(200)).with_script([
        MockShot::Recoverable("busy".to_string()),
        MockShot::Success,
        MockShot::Fatal("gone".to_string()),
    ]);
    let stats = camera.stats();
    let target = dir.path().join("shot.jpg");

    let err = camera.take_picture(&target).await.unwrap_err();
    assert!(err.recoverable);
    assert!(!target.exists());

    let path = camera.take_picture(&target).await.unwrap();
    assert_eq!(path, target);
    assert_eq!(image::image_dimensions(&path).unwrap(), (64, 48));

    let err = camera.take_picture(&target).await.unwrap_err();
    assert!(!err.recoverable);

    // script exhausted: back to success
    assert!(camera.take_picture(&target).await.is_ok());
    assert_eq!(stats.pictures(), 4);
}

#[tokio::test]
async fn test_mock_camera_preview() {
    let dir = tempfile::tempdir().unwrap();
    let config = CameraConfig {
        mock_resolution: (80, 40),
        mock_capture_millis: 0,
        preview: true,
        ..CameraConfig::default()
    };
    let mut camera = MockCamera::from_config(&config);
    let target = dir.path().join("preview.jpg");

    assert!(camera.has_preview());
    camera.take_preview(&target).await.unwrap();
    camera.set_idle().await.unwrap();

    assert_eq!(image::image_dimensions(&target).unwrap(), (20, 10));
    assert_eq!(camera.stats().previews(), 1);
    assert_eq!(camera.stats().idles(), 1);
}

#[tokio::test]
async fn test_gphoto2_missing_binary_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = CameraConfig {
        gphoto2_binary: dir.path().join("no-such-gphoto2").display().to_string(),
        ..CameraConfig::default()
    };
    let mut camera = GPhoto2Camera::new(&config);

    let err = camera
        .take_picture(&dir.path().join("shot.jpg"))
        .await
        .unwrap_err();
    assert!(!err.recoverable);
}

#[cfg(unix)]
fn fake_gphoto2(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("gphoto2");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

#[cfg(unix)]
#[tokio::test]
async fn test_gphoto2_busy_is_recoverable() {
    let dir = tempfile::tempdir().unwrap();
    let config = CameraConfig {
        gphoto2_binary: fake_gphoto2(
            dir.path(),
            "echo '*** Error (-53: Could not claim the USB device) ***' >&2; exit 1",
        ),
        ..CameraConfig::default()
    };
    let mut camera = GPhoto2Camera::new(&config);

    let err = camera
        .take_picture(&dir.path().join("shot.jpg"))
        .await
        .unwrap_err();
    assert!(err.recoverable);
}

#[cfg(unix)]
#[tokio::test]
async fn test_gphoto2_success_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    // the last argument is the target filename
    let config = CameraConfig {
        gphoto2_binary: fake_gphoto2(dir.path(), "for last; do :; done; echo data > \"$last\""),
        ..CameraConfig::default()
    };
    let mut camera = GPhoto2Camera::new(&config);
    let target = dir.path().join("shot.jpg");

    let path = camera.take_picture(&target).await.unwrap();
    assert_eq!(path, target);
    assert!(target.is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn test_gphoto2_missing_output_is_recoverable() {
    let dir = tempfile::tempdir().unwrap();
    let config = CameraConfig {
        gphoto2_binary: fake_gphoto2(dir.path(), "exit 0"),
        ..CameraConfig::default()
    };
    let mut camera = GPhoto2Camera::new(&config);

    let err = camera
        .take_picture(&dir.path().join("shot.jpg"))
        .await
        .unwrap_err();
    assert!(err.recoverable);
}
