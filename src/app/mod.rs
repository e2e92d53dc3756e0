//! Application core: dispatch logic with all I/O behind ports.
//!
//! Switch resolution, the button state store and the dispatcher live
//! here. Relays, the panel, the presence sensor and the report relay are
//! reached only through the **port traits** in [`ports`], so the whole
//! core runs against mock adapters in tests.

pub mod commands;
pub mod ports;
pub mod service;
pub mod store;
