//! Threshold debouncing: noisy analog samples in, edge-triggered press and
//! release intents out.
//!
//! A channel's discrete state is `value >= threshold`. It is recomputed from
//! the raw value on every update; only a transition of that derived state
//! produces an intent. Repeated samples on the same side of the threshold
//! store the value and emit nothing.

use tracing::debug;

use crate::engine::channels::{Binding, Channel, ChannelStore};

/// A discrete actuation destined for the [`Actuator`](crate::actuate::Actuator).
#[derive(Debug, Clone, PartialEq)]
pub enum ActuationIntent {
    Press(Binding),
    Release(Binding),
}

/// Feeds one raw sample into a channel and reports the press/release edge,
/// if any.
///
/// Key channels are clamped to `[0, 1]`; mouse-button channels arrive
/// pre-normalized and pass through untouched. Callers gate on focus before
/// invoking this; the engine itself never checks the focus flag.
pub fn update(store: &mut ChannelStore, channel: Channel, raw: f32) -> Option<ActuationIntent> {
    let value = if channel.is_mouse() {
        raw
    } else {
        raw.clamp(0.0, 1.0)
    };

    let threshold = store.threshold(channel);
    let was_pressed = store.value(channel) >= threshold;
    let is_pressed = value >= threshold;
    store.set_value(channel, value);

    if was_pressed == is_pressed {
        return None;
    }

    let binding = store.binding(channel)?.clone();
    debug!(
        "channel {} {}: value {:.3} vs threshold {:.3}",
        channel.name(),
        if is_pressed { "pressed" } else { "released" },
        value,
        threshold
    );

    if is_pressed {
        Some(ActuationIntent::Press(binding))
    } else {
        Some(ActuationIntent::Release(binding))
    }
}

/// Splits a signed axis into two independent non-negative magnitudes:
/// `(negative side, positive side)`. Both halves then run through the same
/// debounce path so each direction edge-triggers on its own.
pub fn split_axis(axis: f32) -> (f32, f32) {
    (axis.min(0.0).abs(), axis.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::channels::default_settings;

    fn store() -> ChannelStore {
        ChannelStore::new(default_settings())
    }

    #[test]
    fn upward_crossing_emits_exactly_one_press() {
        let mut store = store();
        let intents: Vec<_> = [0.0, 0.05, 0.3, 0.8, 0.9]
            .iter()
            .filter_map(|v| update(&mut store, Channel::Forward, *v))
            .collect();

        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0], ActuationIntent::Press(_)));
    }

    #[test]
    fn downward_crossing_emits_exactly_one_release() {
        let mut store = store();
        update(&mut store, Channel::Forward, 0.8);

        let intents: Vec<_> = [0.5, 0.2, 0.05, 0.0, 0.0]
            .iter()
            .filter_map(|v| update(&mut store, Channel::Forward, *v))
            .collect();

        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0], ActuationIntent::Release(_)));
    }

    #[test]
    fn same_side_samples_emit_nothing() {
        let mut store = store();
        assert!(update(&mut store, Channel::Jump, 0.1).is_none());
        assert!(update(&mut store, Channel::Jump, 0.3).is_none());
        assert!(update(&mut store, Channel::Jump, 0.49).is_none());
    }

    #[test]
    fn exact_threshold_counts_as_pressed() {
        let mut store = store();
        assert!(matches!(
            update(&mut store, Channel::Jump, 0.5),
            Some(ActuationIntent::Press(_))
        ));
    }

    #[test]
    fn key_channel_input_is_clamped() {
        let mut store = store();
        update(&mut store, Channel::Forward, 3.5);
        assert_eq!(store.value(Channel::Forward), 1.0);
    }

    #[test]
    fn split_axis_separates_directions() {
        assert_eq!(split_axis(-0.7), (0.7, 0.0));
        assert_eq!(split_axis(0.4), (0.0, 0.4));
        assert_eq!(split_axis(0.0), (0.0, 0.0));
    }

    #[test]
    fn both_axis_directions_debounce_independently() {
        let mut store = store();

        // Stick pushed left, then re-centered.
        let (left, right) = split_axis(-0.8);
        let press = update(&mut store, Channel::Left, left);
        assert!(matches!(press, Some(ActuationIntent::Press(_))));
        assert!(update(&mut store, Channel::Right, right).is_none());

        let (left, right) = split_axis(0.0);
        let release = update(&mut store, Channel::Left, left);
        assert!(matches!(release, Some(ActuationIntent::Release(_))));
        assert!(update(&mut store, Channel::Right, right).is_none());
    }
}
