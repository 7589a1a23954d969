//! Display coordinator
//!
//! Converts an authoritative time into the four digits the clock should
//! show, publishes them to the target board as one batch and records the
//! rendered time with the storage collaborator.

use crate::config::{HourMode, TimeConfig};
use crate::time::EpochSeconds;
use crate::traits::{TimeSource, TimeSourceError, TimestampStore};

use super::board::TargetBoard;
use super::digit::{Digit, DisplaySnapshot};

/// How wall-clock time is mapped onto the drums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayOptions {
    /// Local time offset from UTC in minutes
    pub utc_offset_minutes: i16,
    pub hour_mode: HourMode,
    /// Show the blank flap instead of a leading hour zero
    pub blank_leading_zero: bool,
}

impl From<&TimeConfig> for DisplayOptions {
    fn from(time: &TimeConfig) -> Self {
        Self {
            utc_offset_minutes: time.utc_offset_minutes,
            hour_mode: time.hour_mode,
            blank_leading_zero: time.blank_leading_zero,
        }
    }
}

/// Sole producer of whole-face renders
///
/// Must be driven from the single command dispatcher so the four publishes
/// of one render are never interleaved with another producer.
#[derive(Debug, Clone)]
pub struct DisplayCoordinator {
    options: DisplayOptions,
    last_rendered: Option<EpochSeconds>,
    last_minute: Option<u32>,
}

impl DisplayCoordinator {
    pub const fn new(options: DisplayOptions) -> Self {
        Self {
            options,
            last_rendered: None,
            last_minute: None,
        }
    }

    /// Most recent rendered time, if any
    pub fn last_rendered(&self) -> Option<EpochSeconds> {
        self.last_rendered
    }

    /// Digits for a timestamp, without side effects
    pub fn snapshot(&self, timestamp: EpochSeconds) -> DisplaySnapshot {
        let wall = timestamp.wall_time(self.options.utc_offset_minutes);

        let hour = u32::from(match self.options.hour_mode {
            HourMode::Twelve => match wall.hour % 12 {
                0 => 12,
                h => h,
            },
            HourMode::TwentyFour => wall.hour,
        });
        let minute = u32::from(wall.minute);

        let hour_tens = if self.options.blank_leading_zero && hour < 10 {
            Digit::Blank
        } else {
            Digit::tens(hour)
        };

        DisplaySnapshot::new([
            hour_tens,
            Digit::ones(hour),
            Digit::tens(minute),
            Digit::ones(minute),
        ])
    }

    /// Publish the digits for `timestamp` and persist it
    ///
    /// Exactly one durable write per call.
    pub fn render<S: TimestampStore>(
        &mut self,
        timestamp: EpochSeconds,
        board: &TargetBoard,
        store: &mut S,
    ) -> DisplaySnapshot {
        let snapshot = self.snapshot(timestamp);
        board.publish_all(&snapshot);
        store.persist(timestamp);

        self.last_rendered = Some(timestamp);
        self.last_minute = Some(timestamp.minute_index());
        snapshot
    }

    /// Set the time source, then render the new time
    ///
    /// Nothing is published or persisted if the time source rejects the
    /// value.
    pub fn set_time<T: TimeSource, S: TimestampStore>(
        &mut self,
        timestamp: EpochSeconds,
        source: &mut T,
        board: &TargetBoard,
        store: &mut S,
    ) -> Result<DisplaySnapshot, TimeSourceError> {
        source.set(timestamp)?;
        Ok(self.render(timestamp, board, store))
    }

    /// Render only when `now` is in a different minute than the last
    /// render or observation
    ///
    /// The first observation after boot only arms the rollover detector.
    pub fn tick<S: TimestampStore>(
        &mut self,
        now: EpochSeconds,
        board: &TargetBoard,
        store: &mut S,
    ) -> Option<DisplaySnapshot> {
        let minute = now.minute_index();
        match self.last_minute {
            Some(last) if last == minute => None,
            Some(_) => Some(self.render(now, board, store)),
            None => {
                self.last_minute = Some(minute);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::AxisId;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingStore {
        writes: Vec<EpochSeconds>,
    }

    impl TimestampStore for RecordingStore {
        fn persist(&mut self, timestamp: EpochSeconds) {
            self.writes.push(timestamp);
        }
    }

    /// Time source that remembers what it was set to
    struct FakeClock {
        now: Option<EpochSeconds>,
        fail: Option<TimeSourceError>,
    }

    impl TimeSource for FakeClock {
        fn now(&mut self) -> Option<EpochSeconds> {
            self.now
        }

        fn set(&mut self, timestamp: EpochSeconds) -> Result<(), TimeSourceError> {
            if let Some(e) = self.fail {
                return Err(e);
            }
            self.now = Some(timestamp);
            Ok(())
        }
    }

    fn at(hour: u32, minute: u32) -> EpochSeconds {
        EpochSeconds(hour * 3600 + minute * 60)
    }

    fn values(coordinator: &DisplayCoordinator, ts: EpochSeconds) -> [u8; 4] {
        coordinator.snapshot(ts).values()
    }

    #[test]
    fn test_twelve_hour_wraparound() {
        let coordinator = DisplayCoordinator::new(DisplayOptions::default());
        assert_eq!(values(&coordinator, at(0, 0)), [1, 2, 0, 0]);
        assert_eq!(values(&coordinator, at(12, 0)), [1, 2, 0, 0]);
        assert_eq!(values(&coordinator, at(13, 5)), [0, 1, 0, 5]);
        assert_eq!(values(&coordinator, at(23, 59)), [1, 1, 5, 9]);
        assert_eq!(values(&coordinator, at(10, 10)), [1, 0, 1, 0]);
    }

    #[test]
    fn test_twenty_four_hour_mode() {
        let coordinator = DisplayCoordinator::new(DisplayOptions {
            hour_mode: HourMode::TwentyFour,
            ..DisplayOptions::default()
        });
        assert_eq!(values(&coordinator, at(0, 7)), [0, 0, 0, 7]);
        assert_eq!(values(&coordinator, at(23, 59)), [2, 3, 5, 9]);
    }

    #[test]
    fn test_blank_leading_zero() {
        let coordinator = DisplayCoordinator::new(DisplayOptions {
            blank_leading_zero: true,
            ..DisplayOptions::default()
        });
        assert_eq!(values(&coordinator, at(13, 5)), [10, 1, 0, 5]);
        assert_eq!(values(&coordinator, at(11, 5)), [1, 1, 0, 5]);
    }

    #[test]
    fn test_utc_offset() {
        let coordinator = DisplayCoordinator::new(DisplayOptions {
            utc_offset_minutes: -300,
            ..DisplayOptions::default()
        });
        // 03:30 UTC is 22:30 the previous day at UTC-5
        assert_eq!(values(&coordinator, at(3, 30)), [1, 0, 3, 0]);
    }

    #[test]
    fn test_render_publishes_and_persists() {
        let board = TargetBoard::new();
        let mut store = RecordingStore::default();
        let mut coordinator = DisplayCoordinator::new(DisplayOptions::default());

        coordinator.render(at(10, 10), &board, &mut store);

        let taken = AxisId::ALL.map(|axis| board.take(axis).map(Digit::value));
        assert_eq!(taken, [Some(1), Some(0), Some(1), Some(0)]);
        assert_eq!(store.writes, vec![at(10, 10)]);
        assert_eq!(coordinator.last_rendered(), Some(at(10, 10)));
    }

    #[test]
    fn test_render_is_idempotent() {
        let board = TargetBoard::new();
        let mut store = RecordingStore::default();
        let mut coordinator = DisplayCoordinator::new(DisplayOptions::default());

        let first = coordinator.render(at(7, 45), &board, &mut store);
        let second = coordinator.render(at(7, 45), &board, &mut store);

        assert_eq!(first, second);
        assert_eq!(board.targets(), first.digits());
        assert_eq!(store.writes, vec![at(7, 45), at(7, 45)]);
    }

    #[test]
    fn test_set_time_sets_source_then_renders() {
        let board = TargetBoard::new();
        let mut store = RecordingStore::default();
        let mut clock = FakeClock { now: None, fail: None };
        let mut coordinator = DisplayCoordinator::new(DisplayOptions::default());

        let snapshot = coordinator
            .set_time(at(9, 41), &mut clock, &board, &mut store)
            .unwrap();

        assert_eq!(snapshot.values(), [0, 9, 4, 1]);
        assert_eq!(clock.now, Some(at(9, 41)));
        assert_eq!(board.targets(), snapshot.digits());
        assert_eq!(store.writes, vec![at(9, 41)]);
        assert_eq!(coordinator.last_rendered(), Some(at(9, 41)));
    }

    #[test]
    fn test_failed_set_time_changes_nothing() {
        let board = TargetBoard::new();
        let mut store = RecordingStore::default();
        let mut clock = FakeClock {
            now: Some(at(1, 0)),
            fail: Some(TimeSourceError::Bus),
        };
        let mut coordinator = DisplayCoordinator::new(DisplayOptions::default());

        assert_eq!(
            coordinator.set_time(at(9, 41), &mut clock, &board, &mut store),
            Err(TimeSourceError::Bus)
        );

        assert_eq!(clock.now, Some(at(1, 0)));
        assert!(store.writes.is_empty());
        assert_eq!(coordinator.last_rendered(), None);
        for axis in AxisId::ALL {
            assert_eq!(board.take(axis), None);
        }
    }

    #[test]
    fn test_tick_renders_on_rollover_only() {
        let board = TargetBoard::new();
        let mut store = RecordingStore::default();
        let mut coordinator = DisplayCoordinator::new(DisplayOptions::default());

        // First observation arms the detector
        assert_eq!(coordinator.tick(at(10, 9), &board, &mut store), None);
        assert_eq!(
            coordinator.tick(EpochSeconds(at(10, 9).0 + 59), &board, &mut store),
            None
        );
        assert!(store.writes.is_empty());

        let rendered = coordinator.tick(at(10, 10), &board, &mut store);
        assert_eq!(rendered.map(|s| s.values()), Some([1, 0, 1, 0]));
        assert_eq!(store.writes, vec![at(10, 10)]);

        assert_eq!(
            coordinator.tick(EpochSeconds(at(10, 10).0 + 30), &board, &mut store),
            None
        );
    }

    #[test]
    fn test_tick_after_render_uses_rendered_minute() {
        let board = TargetBoard::new();
        let mut store = RecordingStore::default();
        let mut coordinator = DisplayCoordinator::new(DisplayOptions::default());

        coordinator.render(EpochSeconds(1200), &board, &mut store);
        assert_eq!(coordinator.tick(EpochSeconds(1230), &board, &mut store), None);
        assert!(coordinator
            .tick(EpochSeconds(1260), &board, &mut store)
            .is_some());
        assert_eq!(store.writes, vec![EpochSeconds(1200), EpochSeconds(1260)]);
    }

    proptest! {
        #[test]
        fn prop_twelve_hour_digits(seconds in any::<u32>()) {
            let coordinator = DisplayCoordinator::new(DisplayOptions::default());
            let ts = EpochSeconds(seconds);
            let wall = ts.wall_time(0);
            let [ht, hu, mt, mu] = values(&coordinator, ts);

            let hour = ht as u32 * 10 + hu as u32;
            prop_assert!((1..=12).contains(&hour));
            prop_assert_eq!(hour % 12, wall.hour as u32 % 12);
            prop_assert_eq!(mt * 10 + mu, wall.minute);
        }
    }
}
