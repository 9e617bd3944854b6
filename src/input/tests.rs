use super::keyboard::translate_key;
use super::*;
use crate::events::{BoothEvent, EventQueue};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
    KeyEvent {
        code,
        modifiers,
        kind,
        state: KeyEventState::NONE,
    }
}

#[test]
fn test_translate_character_keys() {
    let press = key(KeyCode::Char('c'), KeyModifiers::NONE, KeyEventKind::Press);
    assert_eq!(translate_key(&press), Some(BoothEvent::KeyPress('c')));

    let upper = key(KeyCode::Char('Q'), KeyModifiers::SHIFT, KeyEventKind::Press);
    assert_eq!(translate_key(&upper), Some(BoothEvent::KeyPress('q')));
}

#[test]
fn test_translate_ctrl_c_and_escape() {
    let ctrl_c = key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
    assert_eq!(translate_key(&ctrl_c), Some(BoothEvent::Shutdown));

    let esc = key(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Press);
    assert_eq!(translate_key(&esc), Some(BoothEvent::Shutdown));
}

#[test]
fn test_translate_ignores_releases_and_other_keys() {
    let release = key(KeyCode::Char('c'), KeyModifiers::NONE, KeyEventKind::Release);
    assert_eq!(translate_key(&release), None);

    let arrow = key(KeyCode::Left, KeyModifiers::NONE, KeyEventKind::Press);
    assert_eq!(translate_key(&arrow), None);
}

#[tokio::test]
async fn test_keyboard_stop_without_start() {
    let mut keyboard = KeyboardInput::new();
    keyboard.stop().await;
}

#[tokio::test]
async fn test_input_sources_without_devices() {
    let queue = EventQueue::new();
    let config = crate::config::InputConfig {
        keyboard: false,
        touch_device: None,
        ..Default::default()
    };

    let mut sources = InputSources::start(&config, queue.sender());
    sources.stop().await;
}

#[cfg(all(target_os = "linux", feature = "touch"))]
mod touch {
    use super::super::touch::TouchTracker;
    use crate::events::BoothEvent;
    use evdev::{AbsoluteAxisType, EventType, InputEvent, Key};

    #[test]
    fn test_tap_reports_last_position() {
        let mut tracker = TouchTracker::default();

        let x = InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_X.0, 120);
        let y = InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_Y.0, 45);
        assert_eq!(tracker.handle(&x), None);
        assert_eq!(tracker.handle(&y), None);

        let press = InputEvent::new(EventType::KEY, Key::BTN_TOUCH.code(), 1);
        assert_eq!(
            tracker.handle(&press),
            Some(BoothEvent::MouseClick {
                button: 1,
                position: (120, 45)
            })
        );

        let release = InputEvent::new(EventType::KEY, Key::BTN_TOUCH.code(), 0);
        assert_eq!(tracker.handle(&release), None);
    }

    #[test]
    fn test_missing_touch_device() {
        let touch = super::super::TouchInput::new("/nonexistent/input/event99");
        let queue = crate::events::EventQueue::new();
        assert!(touch.start(queue.sender()).is_err());
    }
}
