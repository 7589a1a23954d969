//! Motion control
//!
//! Digit geometry, the acceleration ramp and the per-axis controller that
//! turns published targets into step pulses.

pub mod axis;
pub mod geometry;
pub mod profile;

pub use axis::{AxisController, AxisEvent, MotionPhase, MotionState};
pub use geometry::DigitGeometry;
pub use profile::{RampState, StepRamp};
