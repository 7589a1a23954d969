//! Microstep resolution select
//!
//! A4988-style drivers pick their resolution from three static pins. They
//! are set once at startup, before any step is emitted, and shared by all
//! four drivers.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use rotachron_core::config::microstep_levels;

use super::ConfiguredPin;

/// Requested resolution cannot be expressed with the wired pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MicrostepError {
    /// Factor not in the driver's table
    Unsupported(u16),
    /// Factor needs a select pin that is not wired
    PinMissing(u16),
}

/// MS1/MS2/MS3 levels for a microstep factor
pub fn select_levels(microsteps: u16) -> Result<[bool; 3], MicrostepError> {
    microstep_levels(microsteps).ok_or(MicrostepError::Unsupported(microsteps))
}

/// The three shared select pins; any of them may be hard-wired on the board
pub struct MicrostepSelect<P> {
    pins: [Option<ConfiguredPin<P>>; 3],
}

impl<P: OutputPin<Error = Infallible>> MicrostepSelect<P> {
    /// Pins as `(pin, inverted)`
    pub fn new(ms1: Option<(P, bool)>, ms2: Option<(P, bool)>, ms3: Option<(P, bool)>) -> Self {
        let wrap = |pin: Option<(P, bool)>| pin.map(|(pin, inverted)| ConfiguredPin::new(pin, inverted));
        Self {
            pins: [wrap(ms1), wrap(ms2), wrap(ms3)],
        }
    }

    /// Drive the select pins for `microsteps`
    ///
    /// Missing pins are assumed hard-wired low; a factor that needs one of
    /// them high is rejected without touching any pin.
    pub fn apply(&mut self, microsteps: u16) -> Result<(), MicrostepError> {
        let levels = select_levels(microsteps)?;

        let unreachable = self
            .pins
            .iter()
            .zip(levels)
            .any(|(pin, high)| pin.is_none() && high);
        if unreachable {
            return Err(MicrostepError::PinMissing(microsteps));
        }

        for (pin, high) in self.pins.iter_mut().zip(levels) {
            if let Some(pin) = pin {
                pin.set_active(high);
            }
        }
        Ok(())
    }
}
