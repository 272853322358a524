//! OS actuation boundary.
//!
//! Everything that actually presses a key, moves the cursor or clicks a
//! button goes through the [`Actuator`] trait. The engine and relay only ever
//! talk to this capability, which keeps the translation logic testable and
//! the platform calls in one place.
//!
//! Backends:
//! - [`windows::WindowsActuator`]: SendInput/SetCursorPos injection (Windows)
//! - [`null::NullActuator`]: logs intents without touching the OS
//!
//! Actuation failures are never fatal: every method returns a
//! [`Result`] and callers log the error and treat the single actuation as a
//! no-op.

pub mod null;
#[cfg(windows)]
pub mod windows;

use std::sync::Arc;

use thiserror::Error;

/// Errors raised by an actuation backend.
#[derive(Debug, Error)]
pub enum ActuateError {
    /// The key symbol has no known mapping on this backend.
    #[error("unknown key symbol: {0}")]
    UnknownKey(String),

    /// The OS rejected the injected input.
    #[error("input injection rejected: {0}")]
    Rejected(String),

    /// The cursor position could not be read.
    #[error("cursor position unavailable: {0}")]
    CursorUnavailable(String),
}

/// Mouse buttons the bridge can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Right => write!(f, "right"),
        }
    }
}

/// Scroll wheel tick direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Capability for delivering input events to the host OS.
///
/// Key symbols are lowercase names as they appear on the wire and in the
/// configuration (`"w"`, `"space"`, `"tab"`, `"ctrl"`, ...). Implementations
/// must be cheap to call; the relay invokes them outside the shared state
/// lock but on the session's hot path.
pub trait Actuator: Send + Sync {
    fn key_down(&self, key: &str) -> Result<(), ActuateError>;
    fn key_up(&self, key: &str) -> Result<(), ActuateError>;
    fn button_down(&self, button: MouseButton) -> Result<(), ActuateError>;
    fn button_up(&self, button: MouseButton) -> Result<(), ActuateError>;
    fn scroll(&self, direction: ScrollDirection) -> Result<(), ActuateError>;
    fn cursor_pos(&self) -> Result<(i32, i32), ActuateError>;
    fn move_cursor_to(&self, x: i32, y: i32) -> Result<(), ActuateError>;
}

/// Returns the actuation backend for the current platform.
pub fn default_actuator() -> Arc<dyn Actuator> {
    #[cfg(windows)]
    {
        Arc::new(windows::WindowsActuator::new())
    }
    #[cfg(not(windows))]
    {
        Arc::new(null::NullActuator::new())
    }
}
