//! Resolved switch actions.
//!
//! A [`SwitchDefinition`] from configuration is turned into an [`Action`]
//! once per trigger; the [`SwitchBoard`](super::service::SwitchBoard)
//! interprets it. HTTP requests and panel presses both end up here, so a
//! switch behaves the same whichever surface fired it.

use log::warn;

use crate::config::{SwitchDefinition, SwitchKind};

/// What a switch does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pulse `pin`, then cycle `slot`.
    Toggle { name: String, slot: u8, pin: u8 },

    /// Pulse and cycle every toggle switch, then cycle `slot`.
    /// Members are looked up from configuration when the action runs.
    ToggleAll { name: String, slot: u8 },

    /// Flip the sync flag and cycle the indicator at `slot`.
    Sync { name: String, slot: u8 },

    /// Fire a best-effort `toggle_screen` report.
    Notify { name: String },

    /// Unknown switch kind.
    Noop,
}

impl Action {
    pub fn resolve(def: &SwitchDefinition) -> Self {
        let name = def.name.clone();
        let slot = def.slot_index;
        match def.kind {
            SwitchKind::Toggle => match def.gpio_pin {
                Some(pin) => Self::Toggle { name, slot, pin },
                None => {
                    warn!("Toggle switch '{}' has no GPIO pin, ignoring", name);
                    Self::Noop
                }
            },
            SwitchKind::ToggleAll => Self::ToggleAll { name, slot },
            SwitchKind::Sync => Self::Sync { name, slot },
            SwitchKind::Notify => Self::Notify { name },
            SwitchKind::Unknown => Self::Noop,
        }
    }
}
