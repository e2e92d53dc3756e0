//! Mock adapters for integration tests.
//!
//! Every mock hands out a shared handle to what it recorded so tests can
//! inspect the history after the adapter has moved into the board.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use deskswitch::adapters::panel::{SimulatedPanel, SlotView};
use deskswitch::app::ports::{
    GpioError, GpioPort, Notifier, NotifyError, PanelError, PanelPort, PresenceSensor, SensorError,
};
use deskswitch::app::service::SwitchBoard;
use deskswitch::app::store::ButtonStateStore;
use deskswitch::config::SwitchboardConfig;

// ── GPIO ──────────────────────────────────────────────────────

/// Records every level change as `(pin, high)`.
#[derive(Clone, Default)]
pub struct MockGpio {
    pub levels: Arc<Mutex<Vec<(u8, bool)>>>,
}

#[allow(dead_code)]
impl MockGpio {
    pub fn history(&self) -> Vec<(u8, bool)> {
        self.levels.lock().unwrap().clone()
    }

    /// Pins driven high, in order.
    pub fn pulsed_pins(&self) -> Vec<u8> {
        self.history()
            .into_iter()
            .filter(|&(_, high)| high)
            .map(|(pin, _)| pin)
            .collect()
    }
}

impl GpioPort for MockGpio {
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        self.levels.lock().unwrap().push((pin, high));
        Ok(())
    }
}

// ── Panel ─────────────────────────────────────────────────────

/// [`SimulatedPanel`] behind a shared handle.
#[derive(Clone)]
pub struct SharedPanel(pub Arc<Mutex<SimulatedPanel>>);

#[allow(dead_code)]
impl SharedPanel {
    pub fn new(slots: u8) -> Self {
        Self(Arc::new(Mutex::new(SimulatedPanel::new(slots))))
    }

    pub fn view(&self, slot: u8) -> Option<SlotView> {
        self.0.lock().unwrap().view(slot).cloned()
    }

    pub fn shows(&self, slot: u8, image: &str) -> bool {
        self.view(slot) == Some(SlotView::Image(PathBuf::from("images").join(image)))
    }
}

impl PanelPort for SharedPanel {
    fn slot_count(&self) -> u8 {
        self.0.lock().unwrap().slot_count()
    }

    fn render(&mut self, slot: u8, image: &Path) -> Result<(), PanelError> {
        self.0.lock().unwrap().render(slot, image)
    }

    fn blank(&mut self, slot: u8) -> Result<(), PanelError> {
        self.0.lock().unwrap().blank(slot)
    }

    fn reset(&mut self) -> Result<(), PanelError> {
        self.0.lock().unwrap().reset()
    }
}

// ── Notifier ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockNotifier {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Notifier for MockNotifier {
    async fn toggle_screen(&self) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Presence sensor ───────────────────────────────────────────

/// Replays scripted readings, then keeps returning the last one.
pub struct ScriptedSensor {
    readings: VecDeque<Result<bool, SensorError>>,
    last: Result<bool, SensorError>,
}

#[allow(dead_code)]
impl ScriptedSensor {
    pub fn new(readings: impl IntoIterator<Item = Result<bool, SensorError>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: Ok(false),
        }
    }
}

impl PresenceSensor for ScriptedSensor {
    async fn fetch(&mut self) -> Result<bool, SensorError> {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type TestBoard = SwitchBoard<MockGpio, SharedPanel, MockNotifier>;

/// Three toggles, a toggleAll, a sync, a notify and an unknown kind.
pub const DESK_CONFIG: &str = r#"{
    "sensorRelayUrl": "http://relay.local/report",
    "switches": [
        {"name": "screen1", "type": "toggle", "slotIndex": 0, "gpioPin": 17, "images": ["s1-a.png", "s1-b.png"]},
        {"name": "screen2", "type": "toggle", "slotIndex": 1, "gpioPin": 27, "images": ["s2-a.png", "s2-b.png"]},
        {"name": "screen3", "type": "toggle", "slotIndex": 2, "gpioPin": 22, "images": ["s3-a.png", "s3-b.png"]},
        {"name": "all", "type": "toggleAll", "slotIndex": 3, "images": ["all-a.png", "all-b.png"]},
        {"name": "sync", "type": "sync", "slotIndex": 4, "images": ["sync-off.png", "sync-on.png"]},
        {"name": "panel", "type": "notify", "slotIndex": 5, "images": ["panel.png"]},
        {"name": "mystery", "type": "teleport", "slotIndex": 6, "images": ["q.png"]}
    ],
    "panelSlots": 8
}"#;

pub struct Fixture {
    pub board: TestBoard,
    pub gpio: MockGpio,
    pub panel: SharedPanel,
    pub notifier: MockNotifier,
    pub state_path: PathBuf,
}

/// Scratch state file unique to `name` and this test process.
pub fn scratch_state(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("deskswitch-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir.join("state.json")
}

pub fn fixture_with(name: &str, config_json: &str, store: ButtonStateStore) -> Fixture {
    fixture_at(scratch_state(name), config_json, store)
}

/// Board persisting to exactly `state_path`.
pub fn fixture_at(state_path: PathBuf, config_json: &str, store: ButtonStateStore) -> Fixture {
    let config = SwitchboardConfig::from_json(config_json).unwrap();
    let gpio = MockGpio::default();
    let panel = SharedPanel::new(config.panel_slots);
    let notifier = MockNotifier::default();
    let board = SwitchBoard::new(
        config,
        store,
        gpio.clone(),
        panel.clone(),
        notifier.clone(),
        state_path.clone(),
    );
    Fixture {
        board,
        gpio,
        panel,
        notifier,
        state_path,
    }
}

pub fn fixture(name: &str) -> Fixture {
    fixture_with(name, DESK_CONFIG, ButtonStateStore::new())
}

/// Let spawned tasks run to completion on a current-thread runtime.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
