//! Logging-only actuation backend for platforms without input injection.

use std::sync::Mutex;

use tracing::debug;

use super::{ActuateError, Actuator, MouseButton, ScrollDirection};

/// Actuator that records a virtual cursor position and logs every intent
/// instead of touching the OS. Default backend on non-Windows hosts.
pub struct NullActuator {
    cursor: Mutex<(i32, i32)>,
}

impl NullActuator {
    pub fn new() -> Self {
        Self {
            cursor: Mutex::new((0, 0)),
        }
    }
}

impl Default for NullActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for NullActuator {
    fn key_down(&self, key: &str) -> Result<(), ActuateError> {
        debug!("key down: {}", key);
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), ActuateError> {
        debug!("key up: {}", key);
        Ok(())
    }

    fn button_down(&self, button: MouseButton) -> Result<(), ActuateError> {
        debug!("button down: {}", button);
        Ok(())
    }

    fn button_up(&self, button: MouseButton) -> Result<(), ActuateError> {
        debug!("button up: {}", button);
        Ok(())
    }

    fn scroll(&self, direction: ScrollDirection) -> Result<(), ActuateError> {
        debug!("scroll: {:?}", direction);
        Ok(())
    }

    fn cursor_pos(&self) -> Result<(i32, i32), ActuateError> {
        let cursor = self
            .cursor
            .lock()
            .map_err(|e| ActuateError::CursorUnavailable(e.to_string()))?;
        Ok(*cursor)
    }

    fn move_cursor_to(&self, x: i32, y: i32) -> Result<(), ActuateError> {
        debug!("cursor move to ({}, {})", x, y);
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|e| ActuateError::CursorUnavailable(e.to_string()))?;
        *cursor = (x, y);
        Ok(())
    }
}
