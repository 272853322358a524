//! Thumbstick-to-cursor motion filtering.
//!
//! Raw 2-axis samples pass a rate gate (~60Hz), a deadzone, an exponential
//! moving average and a non-linear response curve before becoming an integer
//! pixel delta. The smoothing memory is per-session state: concurrent
//! sessions must never share one history.

use std::time::{Duration, Instant};

use crate::engine::RateLimiter;

/// Minimum spacing between accepted samples, bounding actuation frequency
/// to roughly 60Hz regardless of how fast frames arrive.
pub const MOUSE_UPDATE_INTERVAL: Duration = Duration::from_millis(16);

/// Axis magnitudes below this are treated as exactly zero to suppress drift
/// and snapback.
pub const DEADZONE: f32 = 0.05;

/// Exponent of the response curve: finer control near center, larger throw
/// at the extremes.
pub const RESPONSE_EXPONENT: f32 = 1.5;

const SMOOTHING_CURRENT: f32 = 0.7;
const SMOOTHING_PREVIOUS: f32 = 0.3;

/// Result of feeding one motion sample through the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutput {
    /// Sample arrived inside the rate-limit window; nothing happens.
    Rejected,
    /// Stick is centered after the deadzone: no movement, and any
    /// motion-drag button must be released so it cannot stay stuck down.
    Neutral,
    /// Cursor delta in pixels, to be added to the current OS position.
    Move { dx: i32, dy: i32 },
}

/// Per-session motion filter state.
#[derive(Debug)]
pub struct PointerFilter {
    limiter: RateLimiter,
    previous: Option<(f32, f32)>,
    sensitivity: f32,
}

impl PointerFilter {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            limiter: RateLimiter::new(MOUSE_UPDATE_INTERVAL),
            previous: None,
            sensitivity,
        }
    }

    /// Runs one raw sample through gate, deadzone, smoothing and curve.
    pub fn filter(&mut self, x: f32, y: f32, now: Instant) -> PointerOutput {
        if !self.limiter.should_process(now) {
            return PointerOutput::Rejected;
        }

        let x = if x.abs() < DEADZONE { 0.0 } else { x };
        let y = if y.abs() < DEADZONE { 0.0 } else { y };

        if x == 0.0 && y == 0.0 {
            return PointerOutput::Neutral;
        }

        // Blend with the previous raw sample; the first sample of a session
        // passes through unsmoothed.
        let (smoothed_x, smoothed_y) = match self.previous {
            Some((px, py)) => (
                SMOOTHING_CURRENT * x + SMOOTHING_PREVIOUS * px,
                SMOOTHING_CURRENT * y + SMOOTHING_PREVIOUS * py,
            ),
            None => (x, y),
        };
        self.previous = Some((x, y));

        PointerOutput::Move {
            dx: self.scale(smoothed_x),
            dy: self.scale(smoothed_y),
        }
    }

    /// Sign-preserving response curve and sensitivity scale, truncated to
    /// whole pixels.
    fn scale(&self, value: f32) -> i32 {
        (value.signum() * value.abs().powf(RESPONSE_EXPONENT) * self.sensitivity) as i32
    }
}
