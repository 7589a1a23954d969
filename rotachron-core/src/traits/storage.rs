//! Timestamp persistence trait

use crate::time::EpochSeconds;

/// Durable sink for the last rendered time
///
/// Called once per render. Implementations must not block the caller on
/// flash I/O; the firmware hands the value to a storage task.
pub trait TimestampStore {
    fn persist(&mut self, timestamp: EpochSeconds);
}
