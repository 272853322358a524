//! Logical input channels and the store holding their last-known values.

use std::collections::HashMap;

use crate::actuate::MouseButton;

/// One logical input signal. The set is static: it is enumerated at startup
/// and never changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Ability1,
    Ability2,
    Ability3,
    Tab,
    LeftClick,
    RightClick,
    Spare,
}

impl Channel {
    pub const ALL: [Channel; 12] = [
        Channel::Forward,
        Channel::Backward,
        Channel::Left,
        Channel::Right,
        Channel::Jump,
        Channel::Ability1,
        Channel::Ability2,
        Channel::Ability3,
        Channel::Tab,
        Channel::LeftClick,
        Channel::RightClick,
        Channel::Spare,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Forward => "forward",
            Channel::Backward => "backward",
            Channel::Left => "left",
            Channel::Right => "right",
            Channel::Jump => "jump",
            Channel::Ability1 => "ability1",
            Channel::Ability2 => "ability2",
            Channel::Ability3 => "ability3",
            Channel::Tab => "tab",
            Channel::LeftClick => "left_click",
            Channel::RightClick => "right_click",
            Channel::Spare => "spare",
        }
    }

    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Mouse-button channels arrive pre-normalized and are never clamped.
    pub fn is_mouse(&self) -> bool {
        matches!(self, Channel::LeftClick | Channel::RightClick)
    }
}

/// What pressing a channel actuates.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Key(String),
    Mouse(MouseButton),
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Key(key) => write!(f, "key '{}'", key),
            Binding::Mouse(MouseButton::Left) => write!(f, "left mouse button"),
            Binding::Mouse(MouseButton::Right) => write!(f, "right mouse button"),
        }
    }
}

/// Press threshold and actuation binding for one channel.
#[derive(Debug, Clone)]
pub struct ChannelSetting {
    pub binding: Binding,
    pub threshold: f32,
}

impl ChannelSetting {
    fn key(key: &str, threshold: f32) -> Self {
        Self {
            binding: Binding::Key(key.to_string()),
            threshold,
        }
    }

    fn mouse(button: MouseButton, threshold: f32) -> Self {
        Self {
            binding: Binding::Mouse(button),
            threshold,
        }
    }
}

/// Default thresholds and bindings.
pub fn default_settings() -> HashMap<Channel, ChannelSetting> {
    let mut settings = HashMap::new();
    settings.insert(Channel::Forward, ChannelSetting::key("w", 0.1));
    settings.insert(Channel::Backward, ChannelSetting::key("s", 0.1));
    settings.insert(Channel::Left, ChannelSetting::key("a", 0.1));
    settings.insert(Channel::Right, ChannelSetting::key("d", 0.1));
    settings.insert(Channel::Jump, ChannelSetting::key("space", 0.5));
    settings.insert(Channel::Ability1, ChannelSetting::key("1", 0.5));
    settings.insert(Channel::Ability2, ChannelSetting::key("2", 0.5));
    settings.insert(Channel::Ability3, ChannelSetting::key("3", 0.5));
    settings.insert(Channel::Tab, ChannelSetting::key("tab", 0.5));
    settings.insert(
        Channel::LeftClick,
        ChannelSetting::mouse(MouseButton::Left, 0.1),
    );
    settings.insert(
        Channel::RightClick,
        ChannelSetting::mouse(MouseButton::Right, 0.1),
    );
    settings.insert(Channel::Spare, ChannelSetting::key("t", 0.5));
    settings
}

/// Holds the last-known normalized value and the static threshold/binding
/// metadata for every channel. Pure data plus lookups; the debounce engine
/// reads and writes values through it.
#[derive(Debug)]
pub struct ChannelStore {
    values: HashMap<Channel, f32>,
    settings: HashMap<Channel, ChannelSetting>,
}

impl ChannelStore {
    pub fn new(settings: HashMap<Channel, ChannelSetting>) -> Self {
        let values = Channel::ALL.iter().map(|c| (*c, 0.0)).collect();
        Self { values, settings }
    }

    pub fn value(&self, channel: Channel) -> f32 {
        self.values.get(&channel).copied().unwrap_or(0.0)
    }

    pub fn set_value(&mut self, channel: Channel, value: f32) {
        self.values.insert(channel, value);
    }

    pub fn threshold(&self, channel: Channel) -> f32 {
        self.settings.get(&channel).map(|s| s.threshold).unwrap_or(0.5)
    }

    pub fn binding(&self, channel: Channel) -> Option<&Binding> {
        self.settings.get(&channel).map(|s| &s.binding)
    }

    /// Channels currently on or past their threshold, with their bindings.
    pub fn held(&self) -> Vec<(Channel, Binding)> {
        Channel::ALL
            .iter()
            .filter(|c| self.value(**c) >= self.threshold(**c))
            .filter_map(|c| self.binding(*c).map(|b| (*c, b.clone())))
            .collect()
    }

    /// Zeroes every channel value. Thresholds and bindings are untouched.
    pub fn clear(&mut self) {
        for channel in Channel::ALL {
            self.values.insert(channel, 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_reports_channels_past_threshold() {
        let mut store = ChannelStore::new(default_settings());
        store.set_value(Channel::Forward, 0.4);
        store.set_value(Channel::Jump, 0.4); // below its 0.5 threshold

        let held = store.held();
        assert!(held.iter().any(|(c, _)| *c == Channel::Forward));
        assert!(!held.iter().any(|(c, _)| *c == Channel::Jump));
    }

    #[test]
    fn clear_zeroes_all_values() {
        let mut store = ChannelStore::new(default_settings());
        store.set_value(Channel::LeftClick, 1.0);
        store.clear();
        assert_eq!(store.value(Channel::LeftClick), 0.0);
        assert!(store.held().is_empty());
    }
}
