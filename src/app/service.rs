//! Switch dispatcher: the hexagonal core.
//!
//! [`SwitchBoard`] owns the button state store, the sync flag and the
//! driven ports. Every trigger surface (HTTP endpoint, panel press,
//! presence callback) goes through one cloneable handle, and every state
//! mutation happens under the single lock inside it.
//!
//! ```text
//!   HTTP ──┐                        ┌──▶ GpioPort   (relay pulse)
//!          ├──▶ SwitchBoard (lock) ─┼──▶ PanelPort  (button images)
//!  press ──┘        │               └──▶ state file (snapshot)
//!                   └── notify ──▶ Notifier (spawned, unlocked)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{Mutex, mpsc};

use crate::config::{SwitchKind, SwitchboardConfig};
use crate::error::Result;

use super::commands::Action;
use super::ports::{GpioPort, Notifier, PanelPort};
use super::store::{ButtonState, ButtonStateStore};

/// High time of a relay pulse.
pub const PULSE_WIDTH: Duration = Duration::from_millis(200);

// ───────────────────────────────────────────────────────────────
// Locked state
// ───────────────────────────────────────────────────────────────

struct BoardState<G, P> {
    store: ButtonStateStore,
    gpio: G,
    panel: P,
    sync: bool,
    /// Panel painted black after sustained absence; presses wake it.
    blanked: bool,
}

// ───────────────────────────────────────────────────────────────
// SwitchBoard
// ───────────────────────────────────────────────────────────────

/// Injected dispatch context shared by every trigger surface.
pub struct SwitchBoard<G, P, N> {
    config: Arc<SwitchboardConfig>,
    state_path: Arc<PathBuf>,
    notifier: Arc<N>,
    inner: Arc<Mutex<BoardState<G, P>>>,
}

impl<G, P, N> Clone for SwitchBoard<G, P, N> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            state_path: Arc::clone(&self.state_path),
            notifier: Arc::clone(&self.notifier),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G, P, N> SwitchBoard<G, P, N>
where
    G: GpioPort + 'static,
    P: PanelPort + 'static,
    N: Notifier,
{
    /// Build the board and make sure every configured slot has state.
    ///
    /// Slots already present in `store` (restored from the snapshot) keep
    /// their images and index; the rest start at their first image. After
    /// this returns, `advance` can no longer miss a configured slot.
    ///
    /// The sync flag is read back from the `sync` indicator: any index
    /// other than the first image means sync was engaged.
    pub fn new(
        config: SwitchboardConfig,
        mut store: ButtonStateStore,
        gpio: G,
        panel: P,
        notifier: N,
        state_path: impl Into<PathBuf>,
    ) -> Self {
        for sw in &config.switches {
            let state = store.get(sw.slot_index, || {
                ButtonState::new(sw.slot_index, sw.images.clone())
            });
            if state.images != sw.images {
                warn!(
                    "Slot {} restored with images {:?}, configuration lists {:?}",
                    sw.slot_index, state.images, sw.images
                );
            }
        }

        let sync = config
            .switches
            .iter()
            .filter(|sw| sw.kind == SwitchKind::Sync)
            .filter_map(|sw| store.state(sw.slot_index))
            .any(|state| state.current_index != 0);
        if sync {
            info!("Sync restored as engaged");
        }

        Self {
            config: Arc::new(config),
            state_path: Arc::new(state_path.into()),
            notifier: Arc::new(notifier),
            inner: Arc::new(Mutex::new(BoardState {
                store,
                gpio,
                panel,
                sync,
                blanked: false,
            })),
        }
    }

    pub fn config(&self) -> &SwitchboardConfig {
        &self.config
    }

    // ── Trigger surfaces ──────────────────────────────────────

    /// Fire the switch whose HTTP path segment is `name`.
    ///
    /// Returns `false` if no such switch exists. Action failures are
    /// logged, never returned: the caller always sees success.
    pub async fn trigger(&self, name: &str) -> bool {
        let Some(sw) = self.config.switch(name) else {
            return false;
        };
        info!("Action handler for /{} triggered", name);
        let action = Action::resolve(sw);
        if let Err(e) = self.execute(action).await {
            error!("Switch '{}' failed: {}", name, e);
        }
        true
    }

    /// Handle a physical press on `slot`.
    ///
    /// On a blanked panel any press wakes it instead of firing a switch.
    pub async fn press(&self, slot: u8) {
        {
            let mut board = self.inner.lock().await;
            if board.blanked {
                info!("Panel woken by press on slot {}", slot);
                self.repaint(&mut board);
                return;
            }
        }

        let Some(sw) = self.config.switch_at(slot) else {
            debug!("No switch bound to slot {}", slot);
            return;
        };
        info!("Press on slot {} fires '{}'", slot, sw.name);
        if let Err(e) = self.execute(Action::resolve(sw)).await {
            error!("Switch '{}' failed: {}", sw.name, e);
        }
    }

    /// Deliver panel presses until the sender side closes.
    ///
    /// Each press runs as its own task; the board lock serialises them.
    pub async fn run_press_loop(self, mut presses: mpsc::Receiver<u8>) {
        while let Some(slot) = presses.recv().await {
            let board = self.clone();
            tokio::spawn(async move { board.press(slot).await });
        }
        debug!("Panel press channel closed");
    }

    /// Presence callback: blank on confirmed absence, repaint on return.
    pub async fn on_presence_changed(&self, present: bool) {
        let mut board = self.inner.lock().await;
        if present {
            info!("Turning display on");
            self.repaint(&mut board);
        } else {
            info!("Turning display off");
            Self::blank_all(&mut board);
        }
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Run a resolved action.
    ///
    /// Mutating actions hold the board lock for their whole duration,
    /// relay pulses included. `notify` is spawned without the lock.
    pub async fn execute(&self, action: Action) -> Result<()> {
        match action {
            Action::Noop => Ok(()),
            Action::Notify { name } => {
                self.spawn_notify(&name);
                Ok(())
            }
            action => {
                let mut board = self.inner.lock().await;
                self.apply(&mut board, action).await
            }
        }
    }

    async fn apply(&self, board: &mut BoardState<G, P>, action: Action) -> Result<()> {
        let suppress = self.config.sync_polarity.suppresses_pulse(board.sync);

        match action {
            Action::Toggle { name, slot, pin } => {
                info!("Toggle '{}' on pin {}", name, pin);
                if suppress {
                    info!("Sync engaged, not pulsing pin {}", pin);
                } else {
                    pulse(&mut board.gpio, pin).await;
                }
                self.advance(board, slot).await?;
            }
            Action::ToggleAll { name, slot } => {
                info!("Toggling all pins for '{}'", name);
                if !suppress {
                    for member in self.config.toggle_members() {
                        if let Some(pin) = member.gpio_pin {
                            info!("Toggling pin {}", pin);
                            pulse(&mut board.gpio, pin).await;
                        }
                        self.advance(board, member.slot_index).await?;
                    }
                }
                self.advance(board, slot).await?;
            }
            Action::Sync { name, slot } => {
                board.sync = !board.sync;
                info!("Sync state for '{}' is now {}", name, board.sync);
                self.advance(board, slot).await?;
            }
            Action::Notify { .. } | Action::Noop => {}
        }
        Ok(())
    }

    /// Cycle `slot`, persist the snapshot, and show the new image.
    async fn advance(&self, board: &mut BoardState<G, P>, slot: u8) -> Result<()> {
        let image = self.config.image_path(board.store.advance(slot)?.current_image());
        if let Err(e) = board.store.persist(&self.state_path).await {
            warn!("Failed to persist button state: {}", e);
        }
        if board.blanked {
            debug!("Panel blanked, slot {} repaints on wake", slot);
        } else if let Err(e) = board.panel.render(slot, &image) {
            warn!("Failed to render slot {}: {}", slot, e);
        }
        Ok(())
    }

    fn spawn_notify(&self, name: &str) {
        info!("Sending toggle_screen report for '{}'", name);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.toggle_screen().await {
                warn!("Failed to send sensor report: {}", e);
            }
        });
    }

    // ── Panel painting ────────────────────────────────────────

    /// Paint every configured switch's current image.
    pub async fn init_panel(&self) {
        let mut board = self.inner.lock().await;
        self.repaint(&mut board);
    }

    /// Paint the whole panel black (shutdown and sustained absence).
    pub async fn blank_panel(&self) {
        let mut board = self.inner.lock().await;
        Self::blank_all(&mut board);
    }

    fn repaint(&self, board: &mut BoardState<G, P>) {
        board.blanked = false;
        for sw in &self.config.switches {
            let Some(state) = board.store.state(sw.slot_index) else {
                continue;
            };
            let image = self.config.image_path(state.current_image());
            if let Err(e) = board.panel.render(sw.slot_index, &image) {
                warn!("Failed to render slot {}: {}", sw.slot_index, e);
            }
        }
    }

    fn blank_all(board: &mut BoardState<G, P>) {
        board.blanked = true;
        for slot in 0..board.panel.slot_count() {
            if let Err(e) = board.panel.blank(slot) {
                warn!("Failed to blank slot {}: {}", slot, e);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub async fn sync_engaged(&self) -> bool {
        self.inner.lock().await.sync
    }

    pub async fn is_blanked(&self) -> bool {
        self.inner.lock().await.blanked
    }

    /// Copy of the state behind `slot`.
    pub async fn button_state(&self, slot: u8) -> Option<ButtonState> {
        self.inner.lock().await.store.state(slot).cloned()
    }
}

/// Fixed-width high pulse. Failures are logged; the pin is always driven
/// low again if it was driven high.
async fn pulse<G: GpioPort>(gpio: &mut G, pin: u8) {
    if let Err(e) = gpio.set_level(pin, true) {
        warn!("Failed to raise pin {}: {}", pin, e);
        return;
    }
    tokio::time::sleep(PULSE_WIDTH).await;
    if let Err(e) = gpio.set_level(pin, false) {
        warn!("Failed to lower pin {}: {}", pin, e);
    }
}
