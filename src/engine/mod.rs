//! Input-state translation engine.
//!
//! Converts noisy, high-frequency controller samples into clean, debounced
//! actuation events:
//!
//! ```text
//! raw sample ──► channels (state store) ──► debounce ──► press/release
//!            ──► gesture (grip/trigger)  ──► quick click
//!            ──► pointer (per session)   ──► cursor delta / drag
//!            ──► scroll                  ──► wheel tick
//! ```
//!
//! The shared pieces (channel store, gesture arms, drag bookkeeping) live in
//! one [`EngineContext`] behind a single coarse lock. The lock is held only
//! for the read-modify-write of discrete state, never across an actuation
//! call. The focus flag is synchronized separately by the relay.

pub mod channels;
pub mod debounce;
pub mod gesture;
pub mod pointer;
pub mod scroll;

pub use channels::{Binding, Channel, ChannelSetting, ChannelStore};
pub use debounce::ActuationIntent;
pub use gesture::{GestureArm, QuickClick};
pub use pointer::{PointerFilter, PointerOutput};
pub use scroll::ScrollGate;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::actuate::{Actuator, MouseButton};

/// Minimum-interval gate over a monotonic clock. The caller supplies `now`
/// so timing behavior stays deterministic under test.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// True when enough time has passed since the last accepted event; the
    /// accepted instant becomes the new reference point.
    pub fn should_process(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// All actuation-relevant shared state: channel values, gesture timers and
/// which mouse button a motion-drag currently holds down.
#[derive(Debug)]
pub struct EngineContext {
    pub channels: ChannelStore,
    pub grip: GestureArm,
    pub trigger: GestureArm,
    /// Mouse button held down by the motion-drag path, if any.
    pub drag: Option<MouseButton>,
}

impl EngineContext {
    pub fn new(settings: HashMap<Channel, ChannelSetting>) -> Self {
        Self {
            channels: ChannelStore::new(settings),
            grip: GestureArm::new(MouseButton::Right),
            trigger: GestureArm::new(MouseButton::Left),
            drag: None,
        }
    }

    /// Clears every channel to zero, disarms the gesture timers and returns
    /// the release intents for everything that was held. Used on session
    /// start, session end and focus loss so no key or button ever stays
    /// stuck down.
    pub fn reset(&mut self) -> Vec<ActuationIntent> {
        let mut intents: Vec<ActuationIntent> = self
            .channels
            .held()
            .into_iter()
            .map(|(_, binding)| ActuationIntent::Release(binding))
            .collect();

        if let Some(button) = self.drag.take() {
            intents.push(ActuationIntent::Release(Binding::Mouse(button)));
        }

        self.channels.clear();
        self.grip.disarm();
        self.trigger.disarm();
        intents
    }
}

/// Engine state shared between session workers and the focus watcher.
pub type SharedEngine = Arc<Mutex<EngineContext>>;

/// Delivers one intent to the actuator. Failures are logged and swallowed:
/// a rejected OS call must never take the session down.
pub fn apply_intent(actuator: &dyn Actuator, intent: &ActuationIntent) {
    let result = match intent {
        ActuationIntent::Press(Binding::Key(key)) => actuator.key_down(key),
        ActuationIntent::Release(Binding::Key(key)) => actuator.key_up(key),
        ActuationIntent::Press(Binding::Mouse(button)) => actuator.button_down(*button),
        ActuationIntent::Release(Binding::Mouse(button)) => actuator.button_up(*button),
    };
    if let Err(e) = result {
        error!("actuation failed for {:?}: {}", intent, e);
    }
}

/// Releases every held key and button. Locks the context only to collect the
/// release set; the actuation calls run after the lock is dropped.
pub fn release_all(engine: &SharedEngine, actuator: &dyn Actuator) {
    let intents = match engine.lock() {
        Ok(mut ctx) => ctx.reset(),
        Err(poisoned) => poisoned.into_inner().reset(),
    };

    if !intents.is_empty() {
        info!("releasing {} held input(s)", intents.len());
    }
    for intent in &intents {
        apply_intent(actuator, intent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::channels::default_settings;

    #[test]
    fn rate_limiter_accepts_first_event() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        assert!(limiter.should_process(Instant::now()));
    }

    #[test]
    fn reset_releases_held_channels_and_drag() {
        let mut ctx = EngineContext::new(default_settings());
        ctx.channels.set_value(Channel::Forward, 0.9);
        ctx.drag = Some(MouseButton::Right);
        ctx.grip.update(true, Instant::now());

        let intents = ctx.reset();

        assert!(intents
            .iter()
            .any(|i| matches!(i, ActuationIntent::Release(Binding::Key(k)) if k == "w")));
        assert!(intents.iter().any(|i| matches!(
            i,
            ActuationIntent::Release(Binding::Mouse(MouseButton::Right))
        )));
        assert!(ctx.drag.is_none());
        assert!(!ctx.grip.is_armed());
        assert!(ctx.channels.held().is_empty());
    }

    #[test]
    fn reset_with_nothing_held_is_a_no_op() {
        let mut ctx = EngineContext::new(default_settings());
        assert!(ctx.reset().is_empty());
    }
}
