//! End-to-end session behavior against a recording actuator.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};

use vrbridge::actuate::{ActuateError, Actuator, MouseButton, ScrollDirection};
use vrbridge::engine::channels::default_settings;
use vrbridge::engine::{Channel, EngineContext, SharedEngine};
use vrbridge::relay::{Session, SessionRegistry};

/// Actuator that records every call instead of touching the OS.
#[derive(Default)]
struct RecordingActuator {
    log: Mutex<Vec<String>>,
}

impl RecordingActuator {
    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }
}

impl Actuator for RecordingActuator {
    fn key_down(&self, key: &str) -> Result<(), ActuateError> {
        self.push(format!("key_down {}", key));
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), ActuateError> {
        self.push(format!("key_up {}", key));
        Ok(())
    }

    fn button_down(&self, button: MouseButton) -> Result<(), ActuateError> {
        self.push(format!("button_down {}", button));
        Ok(())
    }

    fn button_up(&self, button: MouseButton) -> Result<(), ActuateError> {
        self.push(format!("button_up {}", button));
        Ok(())
    }

    fn scroll(&self, direction: ScrollDirection) -> Result<(), ActuateError> {
        self.push(format!("scroll {:?}", direction));
        Ok(())
    }

    fn cursor_pos(&self) -> Result<(i32, i32), ActuateError> {
        Ok((100, 100))
    }

    fn move_cursor_to(&self, x: i32, y: i32) -> Result<(), ActuateError> {
        self.push(format!("move {},{}", x, y));
        Ok(())
    }
}

fn new_engine() -> SharedEngine {
    Arc::new(Mutex::new(EngineContext::new(default_settings())))
}

fn new_session(
    engine: SharedEngine,
    actuator: Arc<RecordingActuator>,
    focused: bool,
    registry: Arc<SessionRegistry>,
) -> Session {
    let (_tx, rx) = watch::channel(focused);
    Session::new(7, engine, actuator, rx, registry, 25.0)
}

#[tokio::test]
async fn session_start_releases_stale_state() {
    let engine = new_engine();
    {
        let mut ctx = engine.lock().unwrap();
        ctx.channels.set_value(Channel::Forward, 0.9);
        ctx.drag = Some(MouseButton::Right);
    }

    let actuator = Arc::new(RecordingActuator::default());
    let session = new_session(
        engine.clone(),
        actuator.clone(),
        true,
        Arc::new(SessionRegistry::default()),
    );
    session.start();

    let log = actuator.take();
    assert!(log.contains(&"key_up w".to_string()));
    assert!(log.contains(&"button_up right".to_string()));
    assert!(engine.lock().unwrap().channels.held().is_empty());
}

#[tokio::test]
async fn unfocused_controller_frames_release_and_suppress() {
    let engine = new_engine();
    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(
        engine.clone(),
        actuator.clone(),
        false,
        Arc::new(SessionRegistry::default()),
    );
    actuator.take();

    // Jump goes down behind the session's back, as if focus was lost
    // between two frames.
    engine
        .lock()
        .unwrap()
        .channels
        .set_value(Channel::Jump, 1.0);

    session
        .handle_text(r#"{"rightController":{"buttons":{"grip":1.0}}}"#)
        .await;

    let log = actuator.take();
    assert!(log.contains(&"key_up space".to_string()));
    assert!(!log.iter().any(|entry| entry.starts_with("button_down")));
    assert!(!log.iter().any(|entry| entry.starts_with("key_down")));
}

#[tokio::test]
async fn raw_messages_mirror_to_peers_but_not_back() {
    let registry = Arc::new(SessionRegistry::default());
    let (peer_tx, mut peer_rx) = mpsc::unbounded_channel();
    registry.insert(2, peer_tx);

    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(new_engine(), actuator.clone(), true, registry.clone());

    let payload = r#"{"headset":{"pose":[0,0,0]}}"#;
    session.handle_text(payload).await;

    assert_eq!(peer_rx.try_recv().unwrap(), payload);
    assert!(actuator.take().is_empty());
}

#[tokio::test]
async fn malformed_payload_is_mirrored_then_dropped() {
    let registry = Arc::new(SessionRegistry::default());
    let (peer_tx, mut peer_rx) = mpsc::unbounded_channel();
    registry.insert(2, peer_tx);

    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(new_engine(), actuator.clone(), true, registry.clone());

    session.handle_text("definitely not json").await;

    assert_eq!(peer_rx.try_recv().unwrap(), "definitely not json");
    assert!(actuator.take().is_empty());
}

#[tokio::test]
async fn left_stick_presses_movement_keys_once() {
    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(
        new_engine(),
        actuator.clone(),
        true,
        Arc::new(SessionRegistry::default()),
    );

    let frame = r#"{"leftController":{"axes":[0.0,-0.8]}}"#;
    session.handle_text(frame).await;
    session.handle_text(frame).await;

    let log = actuator.take();
    assert_eq!(
        log.iter().filter(|e| *e == &"key_down w".to_string()).count(),
        1
    );

    session
        .handle_text(r#"{"leftController":{"axes":[0.0,0.0]}}"#)
        .await;
    assert_eq!(actuator.take(), vec!["key_up w".to_string()]);
}

#[tokio::test]
async fn pointer_motion_moves_cursor_relative() {
    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(
        new_engine(),
        actuator.clone(),
        true,
        Arc::new(SessionRegistry::default()),
    );

    session
        .handle_text(r#"{"rightController":{"axes":[1.0,0.0]}}"#)
        .await;

    // Sensitivity 25 over a full deflection from the fixed (100, 100) origin.
    assert_eq!(actuator.take(), vec!["move 125,100".to_string()]);
}

#[tokio::test]
async fn thumbstick_clicks_scroll_by_controller_side() {
    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(
        new_engine(),
        actuator.clone(),
        true,
        Arc::new(SessionRegistry::default()),
    );

    session
        .handle_text(r#"{"leftController":{"buttons":{"thumbstick":1.0}}}"#)
        .await;
    assert_eq!(actuator.take(), vec!["scroll Up".to_string()]);

    session
        .handle_text(r#"{"rightController":{"buttons":{"thumbstick":1.0}}}"#)
        .await;
    assert_eq!(actuator.take(), vec!["scroll Down".to_string()]);
}

#[tokio::test]
async fn quick_grip_tap_clicks_with_the_fixed_hold() {
    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(
        new_engine(),
        actuator.clone(),
        true,
        Arc::new(SessionRegistry::default()),
    );

    session
        .handle_text(r#"{"rightController":{"buttons":{"grip":1.0}}}"#)
        .await;
    assert_eq!(actuator.take(), vec!["button_down right".to_string()]);

    let released_at = std::time::Instant::now();
    session
        .handle_text(r#"{"rightController":{"buttons":{"grip":0.0}}}"#)
        .await;

    // Synthetic click first (down, 50ms hold, up), then the drag release.
    assert!(released_at.elapsed() >= std::time::Duration::from_millis(50));
    assert_eq!(
        actuator.take(),
        vec![
            "button_down right".to_string(),
            "button_up right".to_string(),
            "button_up right".to_string(),
        ]
    );
}

#[tokio::test]
async fn grip_hold_drags_and_disconnect_releases() {
    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(
        new_engine(),
        actuator.clone(),
        true,
        Arc::new(SessionRegistry::default()),
    );

    session
        .handle_text(r#"{"rightController":{"buttons":{"grip":1.0},"axes":[0.0,0.0]}}"#)
        .await;
    assert_eq!(actuator.take(), vec!["button_down right".to_string()]);

    // Transport drop mid-drag: teardown still brings the button up.
    session.finish();
    let log = actuator.take();
    assert!(log.contains(&"button_up right".to_string()));
}

#[tokio::test]
async fn key_command_chord_orders_modifiers() {
    let actuator = Arc::new(RecordingActuator::default());
    let mut session = new_session(
        new_engine(),
        actuator.clone(),
        true,
        Arc::new(SessionRegistry::default()),
    );

    session
        .handle_text(
            r#"{"type":"motion_key_command","key":"f","modifiers":["ctrl","shift"],"action":"press"}"#,
        )
        .await;
    assert_eq!(
        actuator.take(),
        vec![
            "key_down ctrl".to_string(),
            "key_down shift".to_string(),
            "key_down f".to_string(),
        ]
    );

    session
        .handle_text(
            r#"{"type":"motion_key_command","key":"f","modifiers":["ctrl","shift"],"action":"release"}"#,
        )
        .await;
    assert_eq!(
        actuator.take(),
        vec![
            "key_up f".to_string(),
            "key_up shift".to_string(),
            "key_up ctrl".to_string(),
        ]
    );
}
