//! Thumbstick-click scroll ticks.
//!
//! Scrolling has no release state: a thumbstick click past the threshold is
//! a one-shot wheel tick, and a per-direction cooldown keeps a held click
//! from machine-gunning the wheel.

use std::time::{Duration, Instant};

use crate::actuate::ScrollDirection;
use crate::engine::RateLimiter;

/// Minimum spacing between ticks in one direction.
pub const SCROLL_COOLDOWN: Duration = Duration::from_millis(150);

/// Thumbstick click counts as pressed past this value.
pub const CLICK_THRESHOLD: f32 = 0.5;

/// Cooldown-gated scroll tick source for one direction.
#[derive(Debug)]
pub struct ScrollGate {
    direction: ScrollDirection,
    limiter: RateLimiter,
}

impl ScrollGate {
    pub fn new(direction: ScrollDirection) -> Self {
        Self {
            direction,
            limiter: RateLimiter::new(SCROLL_COOLDOWN),
        }
    }

    /// Feeds a thumbstick-click sample; returns the direction when a tick
    /// should fire.
    pub fn tick(&mut self, value: f32, now: Instant) -> Option<ScrollDirection> {
        if value > CLICK_THRESHOLD && self.limiter.should_process(now) {
            Some(self.direction)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_blocks_the_second_tick() {
        let mut gate = ScrollGate::new(ScrollDirection::Up);
        let t0 = Instant::now();

        assert_eq!(gate.tick(1.0, t0), Some(ScrollDirection::Up));
        assert_eq!(gate.tick(1.0, t0 + Duration::from_millis(100)), None);
    }

    #[test]
    fn ticks_past_the_cooldown_both_fire() {
        let mut gate = ScrollGate::new(ScrollDirection::Down);
        let t0 = Instant::now();

        assert_eq!(gate.tick(1.0, t0), Some(ScrollDirection::Down));
        assert_eq!(
            gate.tick(1.0, t0 + Duration::from_millis(200)),
            Some(ScrollDirection::Down)
        );
    }

    #[test]
    fn below_threshold_never_ticks() {
        let mut gate = ScrollGate::new(ScrollDirection::Up);
        assert_eq!(gate.tick(0.5, Instant::now()), None);
        assert_eq!(gate.tick(0.0, Instant::now()), None);
    }
}
