//! Hardware abstraction traits
//!
//! These traits define the interface between the clock logic and the
//! board-specific implementations of motors, clocks and storage.

pub mod clock;
pub mod stepper;
pub mod storage;

pub use clock::{TimeSource, TimeSourceError};
pub use stepper::{Direction, StepperDriver};
pub use storage::TimestampStore;
