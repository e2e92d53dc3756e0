//! Switchboard configuration
//!
//! Static description of the logical switches, the presence sensor and
//! the runtime tunables. Loaded once at startup from a JSON document and
//! never mutated afterwards.
//!
//! Keys are camelCase. The PascalCase keys written for the first
//! generation of this tool (`PhilipsHueSensorUrl`, `ButtonIndex`,
//! `GPIOPin`, ...) are accepted as aliases so existing files keep working.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// What a switch does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwitchKind {
    /// Pulse one relay and cycle the switch's own button.
    Toggle,
    /// Pulse every `Toggle` relay and cycle every button, including its own.
    ToggleAll,
    /// Flip the sync flag that gates relay pulses.
    Sync,
    /// Send a one-shot `toggle_screen` report to the sensor relay.
    #[serde(alias = "sensorpanelToggle")]
    Notify,
    /// Anything else. Resolves to a no-op.
    #[serde(other)]
    Unknown,
}

/// How the sync flag gates relay pulses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncPolarity {
    /// Pulses are suppressed while the flag is set.
    #[default]
    SuppressWhenSet,
    /// Pulses are suppressed while the flag is clear.
    SuppressWhenClear,
}

impl SyncPolarity {
    /// Whether a relay pulse must be skipped given the current flag value.
    pub fn suppresses_pulse(self, sync_flag: bool) -> bool {
        match self {
            Self::SuppressWhenSet => sync_flag,
            Self::SuppressWhenClear => !sync_flag,
        }
    }
}

/// One logical switch: an HTTP endpoint plus a panel button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchDefinition {
    /// HTTP path segment (`/<name>`).
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(rename = "type", alias = "Type", alias = "kind")]
    pub kind: SwitchKind,
    /// Panel slot showing this switch's button.
    #[serde(alias = "buttonIndex", alias = "ButtonIndex")]
    pub slot_index: u8,
    /// Relay pin; required for `toggle`.
    #[serde(default, alias = "GPIOPin", alias = "gpioPIN")]
    pub gpio_pin: Option<u8>,
    /// Images the button cycles through, relative to `image_dir`.
    #[serde(alias = "Images")]
    pub images: Vec<String>,
}

/// Core switchboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchboardConfig {
    // --- Presence sensor ---
    /// Hue sensor endpoint. Empty disables presence monitoring.
    #[serde(default, alias = "PhilipsHueSensorUrl")]
    pub philips_hue_sensor_url: String,
    /// Continuous absence (seconds) before the panel is blanked.
    #[serde(default = "default_threshold_secs", alias = "MotionSensorThresholdSecs")]
    pub motion_sensor_threshold_secs: u64,
    /// Sensor poll interval (seconds).
    #[serde(default = "default_poll_secs", alias = "MotionSensorPollSecs")]
    pub motion_sensor_poll_secs: u64,
    /// Upper bound for a single sensor request (seconds).
    #[serde(default = "default_timeout_secs", alias = "SensorTimeoutSecs")]
    pub sensor_timeout_secs: u64,

    // --- Relay ---
    /// Where `notify` switches post their report.
    #[serde(default, alias = "SensorRelayUrl")]
    pub sensor_relay_url: String,

    // --- Surfaces ---
    /// HTTP listen address.
    #[serde(default = "default_listen_addr", alias = "ListenAddr")]
    pub listen_addr: String,
    /// Directory holding button images.
    #[serde(default = "default_image_dir", alias = "ImageDir")]
    pub image_dir: PathBuf,
    /// Number of buttons on the panel.
    #[serde(default = "default_panel_slots", alias = "PanelSlots")]
    pub panel_slots: u8,

    /// Which sync flag value suppresses relay pulses.
    #[serde(default, alias = "SyncPolarity")]
    pub sync_polarity: SyncPolarity,

    #[serde(default, alias = "Switches")]
    pub switches: Vec<SwitchDefinition>,
}

fn default_threshold_secs() -> u64 {
    60
}

fn default_poll_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_panel_slots() -> u8 {
    6
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            philips_hue_sensor_url: String::new(),
            motion_sensor_threshold_secs: default_threshold_secs(),
            motion_sensor_poll_secs: default_poll_secs(),
            sensor_timeout_secs: default_timeout_secs(),
            sensor_relay_url: String::new(),
            listen_addr: default_listen_addr(),
            image_dir: default_image_dir(),
            panel_slots: default_panel_slots(),
            sync_polarity: SyncPolarity::default(),
            switches: Vec::new(),
        }
    }
}

impl SwitchboardConfig {
    /// Read, parse and validate the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a configuration document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break dispatch invariants.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.motion_sensor_poll_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "motionSensorPollSecs must be at least 1".into(),
            ));
        }
        if self.sensor_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "sensorTimeoutSecs must be at least 1".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut slots = HashSet::new();
        for sw in &self.switches {
            let segment_ok = sw
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            if sw.name.is_empty() || !segment_ok {
                return Err(ConfigError::ValidationFailed(format!(
                    "switch name {:?} must be a non-empty path segment",
                    sw.name
                )));
            }
            if !names.insert(sw.name.as_str()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "switch name '{}' is used twice",
                    sw.name
                )));
            }
            if !slots.insert(sw.slot_index) {
                return Err(ConfigError::ValidationFailed(format!(
                    "switch '{}': slot {} is already taken",
                    sw.name, sw.slot_index
                )));
            }
            if sw.slot_index >= self.panel_slots {
                return Err(ConfigError::ValidationFailed(format!(
                    "switch '{}': slot {} is outside the {}-button panel",
                    sw.name, sw.slot_index, self.panel_slots
                )));
            }
            if sw.images.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "switch '{}' needs at least one image",
                    sw.name
                )));
            }
            if sw.kind == SwitchKind::Toggle && sw.gpio_pin.is_none() {
                return Err(ConfigError::ValidationFailed(format!(
                    "toggle switch '{}' needs a gpioPin",
                    sw.name
                )));
            }
        }
        Ok(())
    }

    pub fn hold_threshold(&self) -> Duration {
        Duration::from_secs(self.motion_sensor_threshold_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.motion_sensor_poll_secs)
    }

    pub fn sensor_timeout(&self) -> Duration {
        Duration::from_secs(self.sensor_timeout_secs)
    }

    /// Switch bound to the HTTP path segment `name`.
    pub fn switch(&self, name: &str) -> Option<&SwitchDefinition> {
        self.switches.iter().find(|sw| sw.name == name)
    }

    /// Switch whose button sits at `slot`.
    pub fn switch_at(&self, slot: u8) -> Option<&SwitchDefinition> {
        self.switches.iter().find(|sw| sw.slot_index == slot)
    }

    /// Every `toggle` switch, in configuration order.
    pub fn toggle_members(&self) -> impl Iterator<Item = &SwitchDefinition> {
        self.switches
            .iter()
            .filter(|sw| sw.kind == SwitchKind::Toggle)
    }

    /// Resolve an image identifier against `image_dir`.
    pub fn image_path(&self, image: &str) -> PathBuf {
        self.image_dir.join(image)
    }

    /// Relay pins driven by `toggle` switches, deduplicated and sorted.
    pub fn relay_pins(&self) -> Vec<u8> {
        let mut pins: Vec<u8> = self.toggle_members().filter_map(|sw| sw.gpio_pin).collect();
        pins.sort_unstable();
        pins.dedup();
        pins
    }
}
