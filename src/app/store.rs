//! Button state store: per-slot image cycling that survives restarts.
//!
//! Each panel slot that shows a multi-image button owns one
//! [`ButtonState`]. Entries are created lazily, advanced only by the
//! dispatcher under its lock, and never removed during a run.
//!
//! ## Snapshot format
//!
//! ```json
//! { "buttons": { "0": { "index": 1, "images": ["a.png", "b.png"] } } }
//! ```
//!
//! Snapshots are written to `<path>.tmp` and renamed over `<path>`, so a
//! reader sees either the previous snapshot or the new one.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Cycling state of one panel button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub slot_index: u8,
    pub images: Vec<String>,
    /// Always `< images.len()`.
    pub current_index: usize,
}

impl ButtonState {
    /// Fresh state showing the first image.
    pub fn new(slot_index: u8, images: Vec<String>) -> Self {
        Self {
            slot_index,
            images,
            current_index: 0,
        }
    }

    /// Image the button currently shows.
    pub fn current_image(&self) -> &str {
        &self.images[self.current_index]
    }
}

/// On-disk form of a single button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedButton {
    #[serde(alias = "Index")]
    pub index: usize,
    #[serde(alias = "Images")]
    pub images: Vec<String>,
}

/// On-disk form of the whole store, keyed by decimal slot index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    #[serde(default, alias = "Buttons")]
    pub buttons: BTreeMap<String, PersistedButton>,
}

#[derive(Debug, Default)]
pub struct ButtonStateStore {
    states: BTreeMap<u8, ButtonState>,
}

impl ButtonStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing state for `slot`, or the state built by `default_factory`.
    ///
    /// The factory runs at most once per slot.
    pub fn get(
        &mut self,
        slot: u8,
        default_factory: impl FnOnce() -> ButtonState,
    ) -> &ButtonState {
        self.states.entry(slot).or_insert_with(default_factory)
    }

    /// Read-only lookup.
    pub fn state(&self, slot: u8) -> Option<&ButtonState> {
        self.states.get(&slot)
    }

    /// Move `slot` to its next image, wrapping to the first.
    pub fn advance(&mut self, slot: u8) -> Result<&ButtonState, StoreError> {
        let state = self
            .states
            .get_mut(&slot)
            .ok_or(StoreError::NotFound(slot))?;
        state.current_index = (state.current_index + 1) % state.images.len();
        Ok(state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Every known state, ordered by slot.
    pub fn iter(&self) -> impl Iterator<Item = &ButtonState> {
        self.states.values()
    }

    // ── Snapshot conversion ───────────────────────────────────

    pub fn snapshot(&self) -> PersistedSnapshot {
        let buttons = self
            .states
            .iter()
            .map(|(slot, state)| {
                (
                    slot.to_string(),
                    PersistedButton {
                        index: state.current_index,
                        images: state.images.clone(),
                    },
                )
            })
            .collect();
        PersistedSnapshot { buttons }
    }

    /// Rebuild a store, rejecting entries that would break the index invariant.
    pub fn from_snapshot(snapshot: PersistedSnapshot) -> Result<Self, StoreError> {
        let mut states = BTreeMap::new();
        for (key, button) in snapshot.buttons {
            let slot: u8 = key.parse().map_err(|_| {
                StoreError::Corrupted(format!("slot key {:?} is not a slot index", key))
            })?;
            if button.images.is_empty() {
                return Err(StoreError::Corrupted(format!("slot {} has no images", slot)));
            }
            if button.index >= button.images.len() {
                return Err(StoreError::Corrupted(format!(
                    "slot {} index {} exceeds its {} image(s)",
                    slot,
                    button.index,
                    button.images.len()
                )));
            }
            states.insert(
                slot,
                ButtonState {
                    slot_index: slot,
                    images: button.images,
                    current_index: button.index,
                },
            );
        }
        Ok(Self { states })
    }

    // ── File persistence ──────────────────────────────────────

    /// Write every state to `path`.
    ///
    /// Callers treat failure as non-fatal: the in-memory state stays
    /// authoritative for the rest of the run.
    pub async fn persist(&self, path: &Path) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(&self.snapshot())?;
        let tmp = tmp_path(path);
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Load the snapshot at `path`.
    ///
    /// A missing or unreadable file yields an empty store. Content that
    /// does not parse, or parses to impossible state, is
    /// [`StoreError::Corrupted`].
    pub fn restore(path: &Path) -> Result<Self, StoreError> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to restore state from {}: {}", path.display(), e);
                return Ok(Self::new());
            }
        };
        let snapshot: PersistedSnapshot = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;
        let store = Self::from_snapshot(snapshot)?;
        info!("Restored {} button state(s) from {}", store.len(), path.display());
        Ok(store)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
