//! Clock face
//!
//! Digit and axis types, the shared target board the axes consume from,
//! and the coordinator that turns wall-clock time into four digits.

pub mod board;
pub mod coordinator;
pub mod digit;

pub use board::{SlotView, TargetBoard};
pub use coordinator::{DisplayCoordinator, DisplayOptions};
pub use digit::{AxisId, Digit, DisplaySnapshot, AXIS_COUNT, BLANK_VALUE};
