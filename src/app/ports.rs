//! Port traits: the hexagonal boundary between dispatch logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SwitchBoard (domain)
//! ```
//!
//! Driven adapters (relay pins, button panel, presence sensor, report
//! relay) implement these traits. The [`SwitchBoard`](super::service::SwitchBoard)
//! and [`PresenceMonitor`](crate::presence::PresenceMonitor) consume them
//! via generics, so the domain core never touches hardware or sockets
//! directly.

use core::fmt;
use std::future::Future;
use std::path::Path;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → relay pins)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the relay header.
///
/// Only level changes cross this boundary. The fixed-width pulse is
/// composed by the dispatcher so its timing stays testable on a paused
/// clock.
pub trait GpioPort: Send {
    /// Drive `pin` high or low.
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Panel port (driven adapter: domain → button surface)
// ───────────────────────────────────────────────────────────────

/// Render-side port for the button panel.
///
/// Press events travel the other way over a channel of slot numbers
/// (see [`SwitchBoard::run_press_loop`](super::service::SwitchBoard::run_press_loop)).
pub trait PanelPort: Send {
    /// Number of addressable buttons.
    fn slot_count(&self) -> u8;

    /// Show the image at `image` on button `slot`.
    fn render(&mut self, slot: u8, image: &Path) -> Result<(), PanelError>;

    /// Paint button `slot` black.
    fn blank(&mut self, slot: u8) -> Result<(), PanelError>;

    /// Reset the device's communication state.
    fn reset(&mut self) -> Result<(), PanelError>;
}

// ───────────────────────────────────────────────────────────────
// Presence sensor port (driven adapter: motion sensor → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the single presence endpoint.
pub trait PresenceSensor: Send {
    /// Fetch the current presence reading.
    fn fetch(&mut self) -> impl Future<Output = Result<bool, SensorError>> + Send;
}

// ───────────────────────────────────────────────────────────────
// Notification port (driven adapter: domain → report relay)
// ───────────────────────────────────────────────────────────────

/// Best-effort outbound notification channel.
pub trait Notifier: Send + Sync + 'static {
    /// Deliver a `toggle_screen` action report.
    fn toggle_screen(&self) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`GpioPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioError {
    /// The GPIO peripheral could not be opened.
    Unavailable(String),
    /// `pin` was never claimed as an output.
    UnknownPin(u8),
    /// Driving `pin` failed.
    WriteFailed { pin: u8, reason: String },
}

/// Errors from [`PanelPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// No deck driver is attached.
    NoDevice,
    /// Slot index beyond the panel's buttons.
    SlotOutOfRange(u8),
}

/// Errors from [`PresenceSensor::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// Request failed or timed out.
    Transport(String),
    /// Sensor answered with a non-success status.
    Status(u16),
    /// Body did not contain a presence reading.
    Decode(String),
}

/// Errors from [`Notifier::toggle_screen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// No relay URL configured.
    NotConfigured,
    /// Request failed or timed out.
    Transport(String),
    /// Relay answered with something other than 200.
    Status(u16),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "GPIO unavailable: {}", msg),
            Self::UnknownPin(pin) => write!(f, "pin {} is not a relay output", pin),
            Self::WriteFailed { pin, reason } => {
                write!(f, "write to pin {} failed: {}", pin, reason)
            }
        }
    }
}

impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no deck driver attached"),
            Self::SlotOutOfRange(slot) => write!(f, "slot {} out of range", slot),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "sensor request failed: {}", msg),
            Self::Status(code) => write!(f, "unexpected sensor response: {}", code),
            Self::Decode(msg) => write!(f, "cannot decode sensor response: {}", msg),
        }
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "no sensor relay configured"),
            Self::Transport(msg) => write!(f, "report request failed: {}", msg),
            Self::Status(code) => write!(f, "relay answered {}", code),
        }
    }
}

impl std::error::Error for GpioError {}
impl std::error::Error for PanelError {}
impl std::error::Error for SensorError {}
impl std::error::Error for NotifyError {}
