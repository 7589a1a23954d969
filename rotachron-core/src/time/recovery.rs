//! Power-loss recovery planning
//!
//! On cold start the drums are wherever they stopped when power went
//! away, which is the last rendered time. If that time is recent enough,
//! the display is brought up to the current time; otherwise it is left
//! alone until the next minute rollover.

use super::epoch::{EpochSeconds, SECONDS_PER_DAY};

/// Default recovery window: one day
pub const DEFAULT_RECOVERY_WINDOW_S: u32 = SECONDS_PER_DAY;

/// Outcome of a recovery decision, with the reason kept for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryOutcome {
    /// Nothing was persisted; the display stays at rest
    MissingPersistedState,
    /// The persisted time is too old to fast-forward from
    StaleRecoveryWindow { gap_s: u32 },
    /// The persisted time is later than the current time
    ClockBehind { persisted: EpochSeconds },
    /// Render this time once at boot
    FastForward(EpochSeconds),
}

impl RecoveryOutcome {
    /// Time to render, if any
    pub const fn target(self) -> Option<EpochSeconds> {
        match self {
            RecoveryOutcome::FastForward(target) => Some(target),
            _ => None,
        }
    }
}

/// Decides whether to fast-forward the display after a restart
#[derive(Debug, Clone, Copy)]
pub struct RecoveryPlanner {
    window_s: u32,
}

impl Default for RecoveryPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_RECOVERY_WINDOW_S)
    }
}

impl RecoveryPlanner {
    pub const fn new(window_s: u32) -> Self {
        Self { window_s }
    }

    /// Reconcile the persisted timestamp against the current time
    pub fn plan(&self, persisted: Option<EpochSeconds>, now: EpochSeconds) -> RecoveryOutcome {
        let Some(persisted) = persisted else {
            return RecoveryOutcome::MissingPersistedState;
        };

        match now.since(persisted) {
            None => RecoveryOutcome::ClockBehind { persisted },
            Some(gap_s) if gap_s >= self.window_s => RecoveryOutcome::StaleRecoveryWindow { gap_s },
            Some(gap_s) => match persisted.checked_add(gap_s) {
                Some(target) => RecoveryOutcome::FastForward(target),
                None => RecoveryOutcome::StaleRecoveryWindow { gap_s },
            },
        }
    }
}

/// Recovery with the default one-day window
pub fn plan_recovery(persisted: Option<EpochSeconds>, now: EpochSeconds) -> Option<EpochSeconds> {
    RecoveryPlanner::default().plan(persisted, now).target()
}
