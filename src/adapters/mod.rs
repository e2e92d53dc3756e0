//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter  | Implements       | Connects to                      |
//! |----------|------------------|----------------------------------|
//! | `gpio`   | GpioPort         | embedded-hal pins / rppal header |
//! | `panel`  | PanelPort        | In-memory simulated deck, stdin  |
//! | `hue`    | PresenceSensor   | Hue motion sensor REST resource  |
//! | `relay`  | Notifier         | Sensor relay report endpoint     |
//! | `http`   | (trigger surface)| axum router, one route per switch|

pub mod gpio;
pub mod http;
pub mod hue;
pub mod panel;
pub mod relay;
