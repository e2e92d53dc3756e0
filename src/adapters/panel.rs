//! Button panel backends.
//!
//! [`SimulatedPanel`] keeps the image shown on each slot in memory and
//! logs every change. It backs no-hardware mode, where presses are typed
//! on stdin as slot numbers, and lets tests assert on what the panel
//! shows. [`Deck`] is the backend chosen at startup; a physical deck
//! driver is a new variant there.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::app::ports::{PanelError, PanelPort};

/// What a single slot currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotView {
    Image(PathBuf),
    Black,
}

pub struct SimulatedPanel {
    slots: Vec<Option<SlotView>>,
}

impl SimulatedPanel {
    pub fn new(slot_count: u8) -> Self {
        Self {
            slots: vec![None; slot_count as usize],
        }
    }

    /// View of `slot`, `None` if never painted.
    pub fn view(&self, slot: u8) -> Option<&SlotView> {
        self.slots.get(slot as usize).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, slot: u8) -> Result<&mut Option<SlotView>, PanelError> {
        self.slots
            .get_mut(slot as usize)
            .ok_or(PanelError::SlotOutOfRange(slot))
    }
}

impl PanelPort for SimulatedPanel {
    fn slot_count(&self) -> u8 {
        self.slots.len() as u8
    }

    fn render(&mut self, slot: u8, image: &Path) -> Result<(), PanelError> {
        *self.slot_mut(slot)? = Some(SlotView::Image(image.to_path_buf()));
        info!("Panel slot {} shows {}", slot, image.display());
        Ok(())
    }

    fn blank(&mut self, slot: u8) -> Result<(), PanelError> {
        *self.slot_mut(slot)? = Some(SlotView::Black);
        debug!("Panel slot {} blanked", slot);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), PanelError> {
        self.slots.iter_mut().for_each(|s| *s = None);
        info!("Panel reset");
        Ok(())
    }
}

/// Panel backend chosen at startup.
pub enum Deck {
    Simulated(SimulatedPanel),
}

impl Deck {
    /// Attach the panel for this run.
    ///
    /// Only the simulated panel is built in. Asking for hardware without
    /// a deck driver fails with [`PanelError::NoDevice`].
    pub fn open(simulated: bool, slot_count: u8) -> Result<Self, PanelError> {
        if simulated {
            Ok(Self::Simulated(SimulatedPanel::new(slot_count)))
        } else {
            Err(PanelError::NoDevice)
        }
    }
}

impl PanelPort for Deck {
    fn slot_count(&self) -> u8 {
        match self {
            Self::Simulated(panel) => panel.slot_count(),
        }
    }

    fn render(&mut self, slot: u8, image: &Path) -> Result<(), PanelError> {
        match self {
            Self::Simulated(panel) => panel.render(slot, image),
        }
    }

    fn blank(&mut self, slot: u8) -> Result<(), PanelError> {
        match self {
            Self::Simulated(panel) => panel.blank(slot),
        }
    }

    fn reset(&mut self) -> Result<(), PanelError> {
        match self {
            Self::Simulated(panel) => panel.reset(),
        }
    }
}

/// Parse one line of simulated input into a slot number.
pub fn parse_press(line: &str) -> Option<u8> {
    line.trim().parse().ok()
}

/// Forward slot numbers typed on stdin as panel presses.
pub fn spawn_stdin_presses(presses: mpsc::Sender<u8>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_press(&line) {
                    Some(slot) => {
                        if presses.send(slot).await.is_err() {
                            break;
                        }
                    }
                    None => warn!("Ignoring press input {:?}", line.trim()),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Stdin press source failed: {}", e);
                    break;
                }
            }
        }
        debug!("Stdin press source closed");
    });
}
