//! Authoritative time source trait

use crate::time::EpochSeconds;

/// Errors from the time source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeSourceError {
    /// The clock has not been set since it lost power
    NotRunning,
    /// The hardware rejected the value
    InvalidTime,
    /// The clock chip did not respond
    Bus,
}

/// Something that knows the current wall-clock time
pub trait TimeSource {
    /// Current time, or `None` if the clock has not been set
    fn now(&mut self) -> Option<EpochSeconds>;

    /// Adjust the clock
    fn set(&mut self, timestamp: EpochSeconds) -> Result<(), TimeSourceError>;
}
