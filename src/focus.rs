//! Target-application focus detection.
//!
//! A [`FocusOracle`] answers "does the target application have input focus
//! right now". The [`FocusWatcher`] polls it on a fixed cadence and publishes
//! the flag over a `watch` channel. The flag is the one piece of shared state
//! written by a task other than the session workers, so it gets its own
//! synchronization instead of living inside the engine lock.
//!
//! Losing focus releases every held input, so a key can stay stuck for at
//! most one polling interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::actuate::Actuator;
use crate::engine::{self, SharedEngine};

/// How often the oracle is polled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Capability answering whether the target application is focused.
pub trait FocusOracle: Send + Sync {
    fn is_focused(&self) -> bool;
}

/// Oracle that always answers yes. Default when no target window is
/// configured.
pub struct AlwaysFocused;

impl FocusOracle for AlwaysFocused {
    fn is_focused(&self) -> bool {
        true
    }
}

/// Oracle matching the foreground window title against a configured
/// substring, case-insensitively.
#[cfg(windows)]
pub struct ForegroundWindowOracle {
    title_fragment: String,
}

#[cfg(windows)]
impl ForegroundWindowOracle {
    pub fn new(title_fragment: &str) -> Self {
        Self {
            title_fragment: title_fragment.to_lowercase(),
        }
    }

    fn foreground_title() -> String {
        use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

        unsafe {
            let hwnd = GetForegroundWindow();
            let mut buf = [0u16; 512];
            let len = GetWindowTextW(hwnd, &mut buf);
            String::from_utf16_lossy(&buf[..len.max(0) as usize])
        }
    }
}

#[cfg(windows)]
impl FocusOracle for ForegroundWindowOracle {
    fn is_focused(&self) -> bool {
        Self::foreground_title()
            .to_lowercase()
            .contains(&self.title_fragment)
    }
}

/// Picks the oracle for the configured target window, if any.
pub fn oracle_for(target_window_title: Option<&str>) -> Arc<dyn FocusOracle> {
    match target_window_title {
        #[cfg(windows)]
        Some(title) => Arc::new(ForegroundWindowOracle::new(title)),
        #[cfg(not(windows))]
        Some(title) => {
            tracing::warn!(
                "window focus detection is unavailable on this platform, \
                 ignoring target window '{}'",
                title
            );
            Arc::new(AlwaysFocused)
        }
        None => Arc::new(AlwaysFocused),
    }
}

/// Periodic task publishing the focus flag.
pub struct FocusWatcher;

impl FocusWatcher {
    /// Spawns the polling task and returns the receiving side of the flag.
    /// The task stops when `cancel` fires.
    pub fn spawn(
        oracle: Arc<dyn FocusOracle>,
        engine: SharedEngine,
        actuator: Arc<dyn Actuator>,
        cancel: CancellationToken,
    ) -> watch::Receiver<bool> {
        let initial = oracle.is_focused();
        let (tx, rx) = watch::channel(initial);

        tokio::spawn(async move {
            let mut ticker = interval(POLL_INTERVAL);
            let mut focused = initial;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = cancel.cancelled() => {
                        debug!("focus watcher stopping");
                        break;
                    }
                }

                let now_focused = oracle.is_focused();
                if now_focused == focused {
                    continue;
                }
                focused = now_focused;

                info!(
                    "target focus state changed: {}",
                    if focused { "FOCUSED" } else { "NOT FOCUSED" }
                );
                if !focused {
                    engine::release_all(&engine, actuator.as_ref());
                }
                if tx.send(focused).is_err() {
                    debug!("focus flag has no subscribers left, watcher exiting");
                    break;
                }
            }
        });

        rx
    }
}
