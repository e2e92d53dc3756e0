//! Deskswitch library.
//!
//! Exposes the dispatch core, presence debounce and adapters for the
//! binary and for integration testing. Raspberry Pi GPIO support is
//! behind the `rpi` feature; everything else builds and tests on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod presence;

pub use error::{Error, Result};
