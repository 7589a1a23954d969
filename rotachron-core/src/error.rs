//! Boundary errors
//!
//! Raised where raw numbers from the outside world (command frames,
//! configuration) are turned into typed digits and axes. Nothing past
//! that boundary can fail.

/// Rejected input at the override, dispatch or geometry boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Digit value outside 0..=10
    InvalidDigit(u8),
    /// Axis index outside 0..=3
    InvalidAxis(u8),
}
