//! SendInput-based actuation backend for Windows.

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_KEYUP,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP,
    MOUSEEVENTF_WHEEL, MOUSEINPUT, VIRTUAL_KEY, VK_CONTROL, VK_ESCAPE, VK_LMENU, VK_RETURN,
    VK_SHIFT, VK_SPACE, VK_TAB,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

use super::{ActuateError, Actuator, MouseButton, ScrollDirection};

/// One wheel detent, per the WHEEL_DELTA convention.
const WHEEL_DELTA: i32 = 120;

/// Injects input through `SendInput` and positions the cursor through
/// `SetCursorPos`.
pub struct WindowsActuator;

impl WindowsActuator {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, input: INPUT) -> Result<(), ActuateError> {
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent == 0 {
            return Err(ActuateError::Rejected("SendInput queued 0 events".into()));
        }
        Ok(())
    }

    fn key_event(&self, key: &str, up: bool) -> Result<(), ActuateError> {
        let vk = virtual_key(key)?;
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: 0,
                    dwFlags: if up {
                        KEYEVENTF_KEYUP
                    } else {
                        Default::default()
                    },
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        self.send(input)
    }

    fn mouse_event(&self, flags: u32, mouse_data: i32) -> Result<(), ActuateError> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: mouse_data as u32,
                    dwFlags: windows::Win32::UI::Input::KeyboardAndMouse::MOUSE_EVENT_FLAGS(flags),
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        self.send(input)
    }
}

impl Default for WindowsActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for WindowsActuator {
    fn key_down(&self, key: &str) -> Result<(), ActuateError> {
        self.key_event(key, false)
    }

    fn key_up(&self, key: &str) -> Result<(), ActuateError> {
        self.key_event(key, true)
    }

    fn button_down(&self, button: MouseButton) -> Result<(), ActuateError> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTDOWN,
            MouseButton::Right => MOUSEEVENTF_RIGHTDOWN,
        };
        self.mouse_event(flags.0, 0)
    }

    fn button_up(&self, button: MouseButton) -> Result<(), ActuateError> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTUP,
            MouseButton::Right => MOUSEEVENTF_RIGHTUP,
        };
        self.mouse_event(flags.0, 0)
    }

    fn scroll(&self, direction: ScrollDirection) -> Result<(), ActuateError> {
        let delta = match direction {
            ScrollDirection::Up => WHEEL_DELTA,
            ScrollDirection::Down => -WHEEL_DELTA,
        };
        self.mouse_event(MOUSEEVENTF_WHEEL.0, delta)
    }

    fn cursor_pos(&self) -> Result<(i32, i32), ActuateError> {
        let mut point = windows::Win32::Foundation::POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| ActuateError::CursorUnavailable(e.to_string()))?;
        Ok((point.x, point.y))
    }

    fn move_cursor_to(&self, x: i32, y: i32) -> Result<(), ActuateError> {
        unsafe { SetCursorPos(x, y) }.map_err(|e| ActuateError::Rejected(e.to_string()))
    }
}

/// Maps a wire/config key symbol to a Windows virtual-key code.
fn virtual_key(key: &str) -> Result<VIRTUAL_KEY, ActuateError> {
    match key {
        "space" => return Ok(VK_SPACE),
        "tab" => return Ok(VK_TAB),
        "enter" => return Ok(VK_RETURN),
        "escape" | "esc" => return Ok(VK_ESCAPE),
        "shift" => return Ok(VK_SHIFT),
        "ctrl" | "control" => return Ok(VK_CONTROL),
        "alt" => return Ok(VK_LMENU),
        _ => {}
    }

    // Single letters and digits share their uppercase ASCII code.
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => {
            Ok(VIRTUAL_KEY(c.to_ascii_uppercase() as u16))
        }
        _ => Err(ActuateError::UnknownKey(key.to_string())),
    }
}
