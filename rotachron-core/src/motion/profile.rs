//! Step ramp for trapezoidal moves
//!
//! Turns elapsed time into step pulses with bounded acceleration. Speed is
//! kept in milli-steps per second and position phase in a fixed-point
//! accumulator, so there is no floating point on the hot path.
//!
//! The ramp never asks for more than one step per update; if the caller
//! polls too slowly for the requested speed, the speed is effectively
//! capped by the poll rate.

/// Phase accumulator units per step (milli-steps/s * microseconds)
const PHASE_PER_STEP: u64 = 1_000 * 1_000_000;

/// Current ramp segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampState {
    /// Not moving
    Stopped,
    /// Speeding up toward max speed
    Accelerating,
    /// At max speed
    Cruising,
    /// Slowing down to stop on the target
    Decelerating,
}

/// Acceleration-limited step generator
#[derive(Debug, Clone)]
pub struct StepRamp {
    /// Max speed in milli-steps/s
    max_speed_milli: u64,
    /// Acceleration in steps/s²
    acceleration: u64,
    /// Lowest speed in milli-steps/s; one step of deceleration from here stops
    min_speed_milli: u64,
    /// Current speed in milli-steps/s
    speed_milli: u64,
    phase: u64,
    state: RampState,
}

impl StepRamp {
    /// Create a ramp with speed in steps/s and acceleration in steps/s²
    pub fn new(max_speed: u32, acceleration: u32) -> Self {
        let max_speed_milli = (max_speed.max(1) as u64) * 1000;
        let acceleration = acceleration.max(1) as u64;
        let min_speed_milli = (isqrt(2 * acceleration).max(1) * 1000).min(max_speed_milli);

        Self {
            max_speed_milli,
            acceleration,
            min_speed_milli,
            speed_milli: 0,
            phase: 0,
            state: RampState::Stopped,
        }
    }

    pub fn state(&self) -> RampState {
        self.state
    }

    /// Current speed in whole steps/s
    pub fn speed(&self) -> u32 {
        (self.speed_milli / 1000) as u32
    }

    pub fn is_stopped(&self) -> bool {
        self.state == RampState::Stopped
    }

    /// Begin a move from standstill
    pub fn start(&mut self) {
        self.speed_milli = self.min_speed_milli;
        self.phase = 0;
        self.state = RampState::Accelerating;
    }

    /// Stop immediately
    pub fn stop(&mut self) {
        self.speed_milli = 0;
        self.phase = 0;
        self.state = RampState::Stopped;
    }

    /// Steps needed to decelerate from the current speed to standstill
    pub fn stopping_distance(&self) -> u64 {
        // v² / 2a with v in milli-steps/s
        self.speed_milli.saturating_mul(self.speed_milli) / (2 * self.acceleration * 1_000_000)
    }

    /// Advance by `elapsed_us`
    ///
    /// `remaining` is the number of steps left in the move. Returns `true`
    /// when exactly one step pulse is due now.
    pub fn update(&mut self, elapsed_us: u32, remaining: u64) -> bool {
        if remaining == 0 {
            self.stop();
            return false;
        }
        if self.state == RampState::Stopped {
            self.start();
        }

        let elapsed_us = elapsed_us as u64;
        // a [steps/s²] * t [µs] -> milli-steps/s
        let dv = self.acceleration * elapsed_us / 1000;

        if self.stopping_distance() >= remaining {
            self.state = RampState::Decelerating;
            self.speed_milli = self.speed_milli.saturating_sub(dv).max(self.min_speed_milli);
        } else if self.speed_milli < self.max_speed_milli {
            self.state = RampState::Accelerating;
            self.speed_milli = (self.speed_milli + dv).min(self.max_speed_milli);
        } else {
            self.state = RampState::Cruising;
        }

        self.phase = self
            .phase
            .saturating_add(self.speed_milli.saturating_mul(elapsed_us));
        if self.phase >= PHASE_PER_STEP {
            // Drop any backlog beyond one step
            self.phase = (self.phase - PHASE_PER_STEP).min(PHASE_PER_STEP - 1);
            true
        } else {
            false
        }
    }
}

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a move of `distance` steps, returning (steps, updates)
    fn run(ramp: &mut StepRamp, distance: u64, dt_us: u32) -> (u64, u32) {
        let mut remaining = distance;
        let mut updates = 0;
        while remaining > 0 {
            if ramp.update(dt_us, remaining) {
                remaining -= 1;
            }
            updates += 1;
            assert!(updates < 10_000_000, "ramp stalled");
        }
        ramp.update(dt_us, 0);
        (distance - remaining, updates)
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(9600), 97);
    }

    #[test]
    fn test_initial_state() {
        let ramp = StepRamp::new(2400, 4800);
        assert_eq!(ramp.state(), RampState::Stopped);
        assert_eq!(ramp.speed(), 0);
    }

    #[test]
    fn test_accelerates_then_cruises() {
        let mut ramp = StepRamp::new(2400, 4800);
        let mut remaining = 100_000;
        for _ in 0..4000 {
            if ramp.update(250, remaining) {
                remaining -= 1;
            }
        }
        // 1 s at 4800 steps/s² saturates at max speed
        assert_eq!(ramp.state(), RampState::Cruising);
        assert_eq!(ramp.speed(), 2400);
    }

    #[test]
    fn test_completes_move_and_stops() {
        let mut ramp = StepRamp::new(2400, 4800);
        let (steps, _) = run(&mut ramp, 2610, 250);
        assert_eq!(steps, 2610);
        assert!(ramp.is_stopped());
    }

    #[test]
    fn test_decelerates_near_target() {
        let mut ramp = StepRamp::new(2400, 4800);
        let mut remaining = 5000u64;
        let mut saw_decel = false;
        while remaining > 0 {
            if ramp.update(250, remaining) {
                remaining -= 1;
            }
            if ramp.state() == RampState::Decelerating {
                saw_decel = true;
            }
        }
        assert!(saw_decel);
        assert!(ramp.speed() < 2400 / 4);
    }

    #[test]
    fn test_at_most_one_step_per_update() {
        // Long gap between updates must not produce a burst
        let mut ramp = StepRamp::new(2400, 4800);
        ramp.start();
        let mut steps = 0;
        for _ in 0..10 {
            if ramp.update(100_000, 1000) {
                steps += 1;
            }
        }
        assert!(steps <= 10);
    }

    #[test]
    fn test_short_move_never_stalls() {
        let mut ramp = StepRamp::new(2400, 4800);
        let (steps, _) = run(&mut ramp, 1, 250);
        assert_eq!(steps, 1);
    }

    #[test]
    fn test_stop_resets() {
        let mut ramp = StepRamp::new(2400, 4800);
        ramp.update(250, 100);
        ramp.stop();
        assert!(ramp.is_stopped());
        assert_eq!(ramp.speed(), 0);
    }
}
