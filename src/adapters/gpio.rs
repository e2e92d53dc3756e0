//! Relay GPIO adapters.
//!
//! [`RelayBank`] drives any `embedded-hal` output pins and is the real
//! hardware path. On a Raspberry Pi the pins come from `rppal` (feature
//! `rpi`). [`SimulatedGpio`] only logs and is used in no-hardware mode.

use std::collections::BTreeMap;

use embedded_hal::digital::{Error as _, OutputPin};
use log::{debug, info};

use crate::app::ports::{GpioError, GpioPort};

/// Claimed relay outputs, keyed by BCM pin number.
pub struct RelayBank<P> {
    pins: BTreeMap<u8, P>,
}

impl<P: OutputPin> RelayBank<P> {
    pub fn new(pins: impl IntoIterator<Item = (u8, P)>) -> Self {
        Self {
            pins: pins.into_iter().collect(),
        }
    }
}

impl<P: OutputPin + Send> GpioPort for RelayBank<P> {
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        let out = self.pins.get_mut(&pin).ok_or(GpioError::UnknownPin(pin))?;
        let result = if high { out.set_high() } else { out.set_low() };
        result.map_err(|e| GpioError::WriteFailed {
            pin,
            reason: format!("{:?}", e.kind()),
        })?;
        debug!("Pin {} -> {}", pin, if high { "high" } else { "low" });
        Ok(())
    }
}

/// Claim `pins` as low outputs on the Raspberry Pi header.
#[cfg(feature = "rpi")]
pub fn open_rpi_relays(pins: &[u8]) -> Result<RelayBank<rppal::gpio::OutputPin>, GpioError> {
    let gpio = rppal::gpio::Gpio::new().map_err(|e| GpioError::Unavailable(e.to_string()))?;
    let mut claimed = Vec::with_capacity(pins.len());
    for &pin in pins {
        let out = gpio
            .get(pin)
            .map_err(|e| GpioError::Unavailable(format!("pin {}: {}", pin, e)))?
            .into_output_low();
        claimed.push((pin, out));
    }
    info!("Claimed relay pins {:?}", pins);
    Ok(RelayBank::new(claimed))
}

/// No-hardware stand-in: logs what it would have done.
#[derive(Debug, Default)]
pub struct SimulatedGpio;

impl GpioPort for SimulatedGpio {
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        if high {
            info!("Would pulse pin {}", pin);
        }
        Ok(())
    }
}

/// Relay backend chosen at startup.
pub enum Relays {
    #[cfg(feature = "rpi")]
    Pi(RelayBank<rppal::gpio::OutputPin>),
    Simulated(SimulatedGpio),
}

impl GpioPort for Relays {
    fn set_level(&mut self, pin: u8, high: bool) -> Result<(), GpioError> {
        match self {
            #[cfg(feature = "rpi")]
            Self::Pi(bank) => bank.set_level(pin, high),
            Self::Simulated(sim) => sim.set_level(pin, high),
        }
    }
}
