//! Inbound wire message shapes.
//!
//! Messages are JSON objects distinguished by their top-level keys: a
//! `motion_key_command` chord, a controller-state frame carrying
//! `leftController` and/or `rightController`, or anything else, which is
//! mirrored to peers without local actuation.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Press or release direction of a key chord command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAction {
    Press,
    Release,
}

/// Raw key chord bypassing all thresholding. On press the modifiers go down
/// in declaration order before the key; on release the key comes up first,
/// then the modifiers in reverse order.
#[derive(Debug, Clone, Deserialize)]
pub struct MotionKeyCommand {
    pub key: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub action: KeyAction,
}

/// Button values arrive as analog floats from some clients and plain
/// booleans from others.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ButtonValue {
    Analog(f32),
    Digital(bool),
}

impl ButtonValue {
    pub fn as_f32(&self) -> f32 {
        match self {
            ButtonValue::Analog(v) => *v,
            ButtonValue::Digital(true) => 1.0,
            ButtonValue::Digital(false) => 0.0,
        }
    }
}

/// One controller's state in a frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerSnapshot {
    pub axes: Option<Vec<f32>>,
    pub buttons: Option<HashMap<String, ButtonValue>>,
}

impl ControllerSnapshot {
    /// Named button value, zero when absent.
    pub fn button(&self, name: &str) -> f32 {
        self.buttons
            .as_ref()
            .and_then(|b| b.get(name))
            .map(ButtonValue::as_f32)
            .unwrap_or(0.0)
    }

    /// The `(x, y)` axis pair when at least two components are present.
    pub fn axis_pair(&self) -> Option<(f32, f32)> {
        let axes = self.axes.as_ref()?;
        match axes.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        }
    }
}

/// A controller-state frame. At least one side is present.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerFrame {
    #[serde(rename = "leftController")]
    pub left: Option<ControllerSnapshot>,
    #[serde(rename = "rightController")]
    pub right: Option<ControllerSnapshot>,
}

/// A parsed inbound message.
#[derive(Debug)]
pub enum InboundMessage {
    KeyCommand(MotionKeyCommand),
    Controllers(ControllerFrame),
    /// Valid JSON without a shape we act on: broadcast to peers only.
    MirrorOnly,
}

/// Classifies an inbound text payload. Unparsable JSON or a recognized shape
/// with missing/invalid fields is an error; the session logs it, drops the
/// message and continues.
pub fn parse(text: &str) -> Result<InboundMessage, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;

    if value.get("type").and_then(Value::as_str) == Some("motion_key_command") {
        return Ok(InboundMessage::KeyCommand(serde_json::from_value(value)?));
    }

    if value.get("leftController").is_some() || value.get("rightController").is_some() {
        return Ok(InboundMessage::Controllers(serde_json::from_value(value)?));
    }

    Ok(InboundMessage::MirrorOnly)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_motion_key_command() {
        let msg = parse(
            r#"{"type":"motion_key_command","key":"f","modifiers":["ctrl","shift"],"action":"press"}"#,
        )
        .unwrap();

        match msg {
            InboundMessage::KeyCommand(cmd) => {
                assert_eq!(cmd.key, "f");
                assert_eq!(cmd.modifiers, vec!["ctrl", "shift"]);
                assert_eq!(cmd.action, KeyAction::Press);
            }
            other => panic!("expected key command, got {:?}", other),
        }
    }

    #[test]
    fn parses_controller_frame_with_mixed_button_values() {
        let msg = parse(
            r#"{"rightController":{"axes":[0.5,-0.25],"buttons":{"grip":0.8,"trigger":true,"thumbstick":0}}}"#,
        )
        .unwrap();

        match msg {
            InboundMessage::Controllers(frame) => {
                let right = frame.right.unwrap();
                assert_eq!(right.axis_pair(), Some((0.5, -0.25)));
                assert_eq!(right.button("grip"), 0.8);
                assert_eq!(right.button("trigger"), 1.0);
                assert_eq!(right.button("thumbstick"), 0.0);
                assert_eq!(right.button("missing"), 0.0);
                assert!(frame.left.is_none());
            }
            other => panic!("expected controller frame, got {:?}", other),
        }
    }

    #[test]
    fn unknown_payload_is_mirror_only() {
        let msg = parse(r#"{"hello":"world"}"#).unwrap();
        assert!(matches!(msg, InboundMessage::MirrorOnly));
    }

    #[test]
    fn unparsable_json_is_an_error() {
        assert!(parse("not json").is_err());
    }

    #[test]
    fn key_command_missing_fields_is_an_error() {
        assert!(parse(r#"{"type":"motion_key_command","modifiers":[]}"#).is_err());
    }

    #[test]
    fn short_axes_array_yields_no_pair() {
        let msg = parse(r#"{"leftController":{"axes":[0.4]}}"#).unwrap();
        match msg {
            InboundMessage::Controllers(frame) => {
                assert_eq!(frame.left.unwrap().axis_pair(), None);
            }
            other => panic!("expected controller frame, got {:?}", other),
        }
    }
}
