//! Step/direction stepper driver
//!
//! Drives the common STEP/DIR/EN interface of A4988-class drivers. A step
//! is a single high pulse of fixed width; the driver advances one microstep
//! on the rising edge. There is no position feedback.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use rotachron_core::traits::{Direction, StepperDriver};

use super::ConfiguredPin;

/// Timing and polarity of a step/dir driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepDirConfig {
    /// STEP high time, in nanoseconds
    pub pulse_width_ns: u32,
    /// STEP pulses are active-low (level shifter or opto-isolated input)
    pub step_inverted: bool,
    /// DIR is inverted (drum wired to turn the other way)
    pub dir_inverted: bool,
    /// EN is active-low (A4988, DRV8825)
    pub enable_inverted: bool,
}

impl Default for StepDirConfig {
    fn default() -> Self {
        Self {
            pulse_width_ns: 2000,
            step_inverted: false,
            dir_inverted: false,
            enable_inverted: true,
        }
    }
}

/// Step/dir driver over `embedded-hal` output pins
///
/// `step()` blocks for the pulse width only.
pub struct StepDirDriver<P, D> {
    step: ConfiguredPin<P>,
    dir: ConfiguredPin<P>,
    enable: Option<ConfiguredPin<P>>,
    delay: D,
    pulse_width_ns: u32,
    direction: Direction,
    enabled: bool,
}

impl<P, D> StepDirDriver<P, D>
where
    P: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    /// Create a driver; it starts disabled, direction clockwise, STEP low
    pub fn new(step: P, dir: P, enable: Option<P>, delay: D, config: StepDirConfig) -> Self {
        let mut driver = Self {
            step: ConfiguredPin::new(step, config.step_inverted),
            dir: ConfiguredPin::new(dir, config.dir_inverted),
            enable: enable.map(|pin| ConfiguredPin::new(pin, config.enable_inverted)),
            delay,
            pulse_width_ns: config.pulse_width_ns,
            direction: Direction::Clockwise,
            enabled: false,
        };
        driver.step.set_active(false);
        driver.dir.set_active(true);
        driver.enable(false);
        driver
    }

    pub fn step_pin(&self) -> &P {
        self.step.pin()
    }

    pub fn dir_pin(&self) -> &P {
        self.dir.pin()
    }

    pub fn enable_pin(&self) -> Option<&P> {
        self.enable.as_ref().map(ConfiguredPin::pin)
    }
}

impl<P, D> StepperDriver for StepDirDriver<P, D>
where
    P: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    fn set_direction(&mut self, dir: Direction) {
        if dir == self.direction {
            return;
        }
        self.direction = dir;
        self.dir.set_active(dir == Direction::Clockwise);
        // DIR setup time before the next rising STEP edge
        self.delay.delay_ns(self.pulse_width_ns);
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn step(&mut self) {
        self.step.set_active(true);
        self.delay.delay_ns(self.pulse_width_ns);
        self.step.set_active(false);
    }

    fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        if let Some(pin) = self.enable.as_mut() {
            pin.set_active(enabled);
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
