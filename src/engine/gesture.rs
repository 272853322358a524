//! Quick-tap vs. held-drag disambiguation for the grip and trigger buttons.
//!
//! A VR controller's grip and trigger are dual-purpose: held down while the
//! thumbstick moves they drag the camera/aim, while a quick press and release
//! with no movement means "click". Elapsed time and a movement latch jointly
//! disambiguate the two on the release edge.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::actuate::MouseButton;

/// Presses shorter than this with no movement observed become a click.
pub const QUICK_TAP_WINDOW: Duration = Duration::from_millis(500);

/// How long the synthetic click holds the button down, so the target
/// application registers it as a human click.
pub const CLICK_HOLD: Duration = Duration::from_millis(50);

/// Axis magnitude past which a motion sample counts as movement.
pub const MOVEMENT_EPSILON: f32 = 0.01;

/// A synthetic press-hold-release of `button`, requested on a quick tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickClick {
    pub button: MouseButton,
}

/// The press timestamp exists only between a press edge and its matching
/// release edge; the moving state is a one-way latch until release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArmState {
    Idle,
    Armed { pressed_at: Instant },
    ArmedMoving { pressed_at: Instant },
}

/// Per-button gesture state machine: `Idle -> Armed -> [ArmedMoving] -> Idle`.
#[derive(Debug)]
pub struct GestureArm {
    button: MouseButton,
    state: ArmState,
}

impl GestureArm {
    pub fn new(button: MouseButton) -> Self {
        Self {
            button,
            state: ArmState::Idle,
        }
    }

    pub fn button(&self) -> MouseButton {
        self.button
    }

    /// True between a press edge and its release edge.
    pub fn is_armed(&self) -> bool {
        !matches!(self.state, ArmState::Idle)
    }

    /// Latches movement while armed. Has no effect when idle.
    pub fn observe_movement(&mut self) {
        if let ArmState::Armed { pressed_at } = self.state {
            debug!("{} gesture saw movement, drag latched", self.button);
            self.state = ArmState::ArmedMoving { pressed_at };
        }
    }

    /// Feeds the current discrete button state. Detects edges internally:
    /// a false→true sample arms the timer, a true→false sample classifies
    /// the gesture and may request a quick click.
    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<QuickClick> {
        match (self.state, pressed) {
            (ArmState::Idle, true) => {
                self.state = ArmState::Armed { pressed_at: now };
                None
            }
            (ArmState::Armed { pressed_at }, false) => {
                self.state = ArmState::Idle;
                let held_for = now.duration_since(pressed_at);
                if held_for < QUICK_TAP_WINDOW {
                    debug!("{} quick tap after {:?}", self.button, held_for);
                    Some(QuickClick {
                        button: self.button,
                    })
                } else {
                    None
                }
            }
            (ArmState::ArmedMoving { .. }, false) => {
                // The drag already actuated through the motion path.
                self.state = ArmState::Idle;
                None
            }
            _ => None,
        }
    }

    /// Drops any armed timer without classifying. Used by release-all resets.
    pub fn disarm(&mut self) {
        self.state = ArmState::Idle;
    }
}
