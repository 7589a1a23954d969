//! Per-axis motion controller
//!
//! One instance per drum. Each call to [`AxisController::poll`] is one
//! scheduling quantum: an Idle axis checks the target board, a Moving axis
//! advances its ramp and emits at most one step pulse. Nothing here blocks
//! or touches another axis.

use crate::config::MotionConfig;
use crate::display::{AxisId, Digit, TargetBoard};
use crate::traits::{Direction, StepperDriver};

use super::geometry::DigitGeometry;
use super::profile::StepRamp;

/// Axis phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    Idle,
    Moving,
}

/// Position bookkeeping, owned exclusively by one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionState {
    /// Steps from the reference zero assumed at power-up
    pub current: i64,
    pub target: i64,
    pub phase: MotionPhase,
}

impl MotionState {
    const fn at_home() -> Self {
        Self {
            current: 0,
            target: 0,
            phase: MotionPhase::Idle,
        }
    }

    /// Steps left in the current move
    pub fn remaining(&self) -> u64 {
        self.target.abs_diff(self.current)
    }
}

/// Phase transitions reported to the caller for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisEvent {
    /// A target was taken from the board
    MoveStarted { digit: Digit, from: i64, to: i64 },
    /// The drum reached its target
    MoveCompleted { digit: Digit, position: i64 },
}

/// Drives one drum to the targets published for its axis
pub struct AxisController<S: StepperDriver> {
    axis: AxisId,
    driver: S,
    geometry: DigitGeometry,
    ramp: StepRamp,
    state: MotionState,
    digit: Digit,
    release_when_idle: bool,
    move_poll_us: u32,
    idle_poll_us: u32,
}

impl<S: StepperDriver> AxisController<S> {
    /// Create a controller at the reference zero (digit zero)
    ///
    /// The driver's microstep resolution must already be configured.
    pub fn new(
        axis: AxisId,
        mut driver: S,
        geometry: DigitGeometry,
        motion: &MotionConfig,
        microsteps: u16,
    ) -> Self {
        driver.enable(!motion.release_when_idle);

        Self {
            axis,
            driver,
            geometry,
            ramp: StepRamp::new(
                motion.max_speed_microsteps(microsteps),
                motion.acceleration_microsteps(microsteps),
            ),
            state: MotionState::at_home(),
            digit: Digit::Zero,
            release_when_idle: motion.release_when_idle,
            move_poll_us: motion.move_poll_us,
            idle_poll_us: motion.idle_poll_us,
        }
    }

    pub fn axis(&self) -> AxisId {
        self.axis
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    /// Current step position
    pub fn position(&self) -> i64 {
        self.state.current
    }

    /// Digit of the current or last completed move
    pub fn digit(&self) -> Digit {
        self.digit
    }

    pub fn is_moving(&self) -> bool {
        self.state.phase == MotionPhase::Moving
    }

    pub fn driver(&self) -> &S {
        &self.driver
    }

    /// Delay before the next quantum, in microseconds
    pub fn next_poll_us(&self) -> u32 {
        if self.is_moving() {
            self.move_poll_us
        } else {
            self.idle_poll_us
        }
    }

    /// Run one scheduling quantum
    ///
    /// `elapsed_us` is the time since the previous quantum.
    pub fn poll(&mut self, board: &TargetBoard, elapsed_us: u32) -> Option<AxisEvent> {
        match self.state.phase {
            MotionPhase::Idle => {
                let digit = board.take(self.axis)?;
                Some(self.begin(board, digit))
            }
            MotionPhase::Moving => self.advance(board, elapsed_us),
        }
    }

    fn begin(&mut self, board: &TargetBoard, digit: Digit) -> AxisEvent {
        let from = self.state.current;
        let to = self.geometry.steps_for_digit(digit);

        self.digit = digit;
        self.state.target = to;
        self.state.phase = MotionPhase::Moving;
        board.set_moving(self.axis, true);

        if self.release_when_idle {
            self.driver.enable(true);
        }
        self.driver.set_direction(Direction::towards(from, to));
        self.ramp.start();

        AxisEvent::MoveStarted { digit, from, to }
    }

    fn advance(&mut self, board: &TargetBoard, elapsed_us: u32) -> Option<AxisEvent> {
        let remaining = self.state.remaining();
        if remaining == 0 {
            return Some(self.finish(board));
        }

        if self.ramp.update(elapsed_us, remaining) {
            self.driver.step();
            self.state.current += self.driver.direction().delta();
        }
        None
    }

    fn finish(&mut self, board: &TargetBoard) -> AxisEvent {
        self.ramp.stop();
        self.state.phase = MotionPhase::Idle;
        board.set_moving(self.axis, false);

        if self.release_when_idle {
            self.driver.enable(false);
        }

        AxisEvent::MoveCompleted {
            digit: self.digit,
            position: self.state.current,
        }
    }
}
