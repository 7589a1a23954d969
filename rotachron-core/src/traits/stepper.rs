//! Stepper motor driver trait
//!
//! The axis controller only needs step/direction/enable. Microstep
//! resolution is applied once at startup, before the first step.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motor rotation direction
///
/// `Clockwise` increases the step position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Clockwise rotation (towards higher digits)
    Clockwise,
    /// Counter-clockwise rotation (towards lower digits)
    CounterClockwise,
}

impl Direction {
    /// Direction that moves `from` towards `to`
    pub fn towards(from: i64, to: i64) -> Self {
        if to >= from {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Signed position change of one step
    pub fn delta(self) -> i64 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// Trait for step/direction stepper drivers
///
/// Implementations must not block for longer than the step pulse width.
/// There is no feedback: a step that is commanded is assumed taken.
pub trait StepperDriver {
    /// Set the rotation direction for following steps
    fn set_direction(&mut self, dir: Direction);

    /// Get the current direction
    fn direction(&self) -> Direction;

    /// Emit exactly one step pulse
    fn step(&mut self);

    /// Enable or disable the motor driver
    ///
    /// When disabled, the motor is free to rotate and does not hold position.
    fn enable(&mut self, enabled: bool);

    /// Check if the motor is enabled
    fn is_enabled(&self) -> bool;
}
