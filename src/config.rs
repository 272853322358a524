//! Static bridge configuration.
//!
//! Everything tunable (listen endpoint, mouse sensitivity, channel
//! thresholds and key bindings, target window) is fixed at startup. The
//! configuration is read from `vrbridge/config.toml` in the user config
//! directory when present and falls back to built-in defaults otherwise.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::channels::{self, Binding, Channel, ChannelSetting};

/// Default mouse movement speed multiplier.
pub const DEFAULT_MOUSE_SENSITIVITY: f32 = 25.0;

/// Per-channel override of the default binding and/or threshold.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BindingOverride {
    pub key: Option<String>,
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// WebSocket listen endpoint.
    pub listen_addr: String,

    /// Pointer sensitivity multiplier.
    pub mouse_sensitivity: f32,

    /// Substring of the target window title. When unset, every input is
    /// processed as if the target were always focused.
    pub target_window_title: Option<String>,

    /// Overrides keyed by channel name (`forward`, `jump`, ...). Mouse
    /// channels only honor the threshold part.
    pub bindings: HashMap<String, BindingOverride>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            mouse_sensitivity: DEFAULT_MOUSE_SENSITIVITY,
            target_window_title: None,
            bindings: HashMap::new(),
        }
    }
}

impl BridgeConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vrbridge").join("config.toml"))
    }

    /// Loads the config file when it exists; any read or parse problem is
    /// logged and answered with the defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("no user config directory available, using defaults");
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => {
                    info!("loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("invalid config at {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Effective per-channel settings: defaults plus any overrides.
    pub fn channel_settings(&self) -> HashMap<Channel, ChannelSetting> {
        let mut settings = channels::default_settings();

        for (name, overrides) in &self.bindings {
            let Some(channel) = Channel::from_name(name) else {
                warn!("binding override for unknown channel '{}' ignored", name);
                continue;
            };
            let Some(setting) = settings.get_mut(&channel) else {
                continue;
            };
            if let Some(threshold) = overrides.threshold {
                setting.threshold = threshold;
            }
            if let Some(key) = &overrides.key {
                if channel.is_mouse() {
                    warn!(
                        "channel '{}' is bound to a mouse button, key override ignored",
                        name
                    );
                } else {
                    setting.binding = Binding::Key(key.clone());
                }
            }
        }

        settings
    }

    /// Startup banner: effective mappings, sensitivity and focus target.
    pub fn log_summary(&self) {
        info!("current key mappings:");
        let settings = self.channel_settings();
        for channel in Channel::ALL {
            if let Some(setting) = settings.get(&channel) {
                info!(
                    "  {}: {} (threshold: {})",
                    channel.name(),
                    setting.binding,
                    setting.threshold
                );
            }
        }
        info!("mouse sensitivity: {}", self.mouse_sensitivity);
        match &self.target_window_title {
            Some(title) => info!("inputs gated on focus of window matching '{}'", title),
            None => info!("no target window configured, treating target as always focused"),
        }
    }
}
