//! Stepper driver implementations

pub mod microstep;
pub mod step_dir;

pub use microstep::{MicrostepError, MicrostepSelect};
pub use step_dir::{StepDirConfig, StepDirDriver};

use core::convert::Infallible;

use embedded_hal::digital::{OutputPin, PinState};

/// A pin together with its active level
pub struct ConfiguredPin<P> {
    pin: P,
    inverted: bool,
}

impl<P: OutputPin<Error = Infallible>> ConfiguredPin<P> {
    pub fn new(pin: P, inverted: bool) -> Self {
        Self { pin, inverted }
    }

    /// Drive the pin to its logical level, honouring inversion
    pub fn set_active(&mut self, active: bool) {
        let state = PinState::from(active != self.inverted);
        match self.pin.set_state(state) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}
