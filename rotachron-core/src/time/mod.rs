//! Timekeeping
//!
//! Epoch seconds, calendar conversion, the persisted timestamp record and
//! boot-time recovery planning.

pub mod epoch;
pub mod record;
pub mod recovery;

pub use epoch::{CivilDateTime, EpochSeconds, WallTime, SECONDS_PER_DAY};
pub use record::TimestampRecord;
pub use recovery::{plan_recovery, RecoveryOutcome, RecoveryPlanner, DEFAULT_RECOVERY_WINDOW_S};
