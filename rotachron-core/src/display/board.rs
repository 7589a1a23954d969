//! Shared target board
//!
//! The only mutable state shared between the command path and the four
//! axis tasks. Each slot is one atomic byte holding the target digit in
//! the low bits and a dirty flag in the top bit, so a publish is a single
//! store and a take is a single read-modify-write. No lock is ever held
//! while an axis is generating steps.
//!
//! Slot discipline: one producer role at a time (the command dispatcher)
//! and one consumer per slot (the owning axis). The board does not enforce
//! the producer side; the dispatcher does.

use portable_atomic::{AtomicU8, Ordering};

use crate::error::ClockError;

use super::digit::{AxisId, Digit, DisplaySnapshot, AXIS_COUNT};

/// Dirty bit: a target has been published but not yet taken
const DIRTY: u8 = 0x80;

/// Read-only view of a slot, for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotView {
    /// Most recently published digit
    pub digit: Digit,
    /// Published but not yet taken by the axis
    pub dirty: bool,
}

/// Per-axis target slots plus a moving bitmask
pub struct TargetBoard {
    slots: [AtomicU8; AXIS_COUNT],
    moving: AtomicU8,
}

impl Default for TargetBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetBoard {
    /// Create a board with every slot clean at digit zero (the step origin)
    pub const fn new() -> Self {
        Self {
            slots: [
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(0),
            ],
            moving: AtomicU8::new(0),
        }
    }

    /// Publish a new target for one axis
    ///
    /// Overwrites any target that has not been taken yet.
    pub fn publish(&self, axis: AxisId, digit: Digit) {
        self.slots[axis.index()].store(digit.value() | DIRTY, Ordering::Release);
    }

    /// Publish an override given as raw wire values
    ///
    /// The axis is checked before the digit. On error nothing is published.
    pub fn publish_raw(&self, axis: u8, digit: u8) -> Result<(AxisId, Digit), ClockError> {
        let axis = AxisId::new(axis)?;
        let digit = Digit::new(digit)?;
        self.publish(axis, digit);
        Ok((axis, digit))
    }

    /// Publish all four digits of a snapshot, in axis order
    pub fn publish_all(&self, snapshot: &DisplaySnapshot) {
        for axis in AxisId::ALL {
            self.publish(axis, snapshot.digit(axis));
        }
    }

    /// Take the pending target for an axis, clearing its dirty flag
    ///
    /// Returns `None` if nothing new was published since the last take.
    pub fn take(&self, axis: AxisId) -> Option<Digit> {
        let previous = self.slots[axis.index()].fetch_and(!DIRTY, Ordering::AcqRel);
        if previous & DIRTY == 0 {
            return None;
        }
        Digit::new(previous & !DIRTY).ok()
    }

    /// Look at a slot without consuming it
    pub fn peek(&self, axis: AxisId) -> SlotView {
        let raw = self.slots[axis.index()].load(Ordering::Acquire);
        SlotView {
            digit: Digit::new(raw & !DIRTY).unwrap_or(Digit::Zero),
            dirty: raw & DIRTY != 0,
        }
    }

    /// Current target digits of all axes
    pub fn targets(&self) -> [Digit; AXIS_COUNT] {
        AxisId::ALL.map(|axis| self.peek(axis).digit)
    }

    /// Record whether an axis is moving (written only by that axis)
    pub fn set_moving(&self, axis: AxisId, moving: bool) {
        let bit = 1u8 << axis.index();
        if moving {
            self.moving.fetch_or(bit, Ordering::Release);
        } else {
            self.moving.fetch_and(!bit, Ordering::Release);
        }
    }

    /// Bitmask of moving axes, bit N = axis index N
    pub fn moving_mask(&self) -> u8 {
        self.moving.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_initial_board_is_clean() {
        let board = TargetBoard::new();
        for axis in AxisId::ALL {
            assert_eq!(board.take(axis), None);
            assert_eq!(
                board.peek(axis),
                SlotView {
                    digit: Digit::Zero,
                    dirty: false
                }
            );
        }
        assert_eq!(board.moving_mask(), 0);
    }

    #[test]
    fn test_publish_then_take_once() {
        let board = TargetBoard::new();
        board.publish(AxisId::MinuteTens, Digit::Four);

        assert!(board.peek(AxisId::MinuteTens).dirty);
        assert_eq!(board.take(AxisId::MinuteTens), Some(Digit::Four));
        assert_eq!(board.take(AxisId::MinuteTens), None);

        // Digit is retained after the take
        assert_eq!(
            board.peek(AxisId::MinuteTens),
            SlotView {
                digit: Digit::Four,
                dirty: false
            }
        );
    }

    #[test]
    fn test_last_write_wins() {
        let board = TargetBoard::new();
        board.publish(AxisId::HourUnits, Digit::Three);
        board.publish(AxisId::HourUnits, Digit::Seven);

        assert_eq!(board.take(AxisId::HourUnits), Some(Digit::Seven));
        assert_eq!(board.take(AxisId::HourUnits), None);
    }

    #[test]
    fn test_slots_are_independent() {
        let board = TargetBoard::new();
        board.publish(AxisId::HourTens, Digit::One);

        assert_eq!(board.take(AxisId::HourUnits), None);
        assert_eq!(board.take(AxisId::MinuteTens), None);
        assert_eq!(board.take(AxisId::MinuteUnits), None);
        assert_eq!(board.take(AxisId::HourTens), Some(Digit::One));
    }

    #[test]
    fn test_publish_all() {
        let board = TargetBoard::new();
        let snapshot = DisplaySnapshot::new([Digit::One, Digit::Two, Digit::Three, Digit::Blank]);
        board.publish_all(&snapshot);

        assert_eq!(board.targets(), snapshot.digits());
        for axis in AxisId::ALL {
            assert_eq!(board.take(axis), Some(snapshot.digit(axis)));
        }
    }

    #[test]
    fn test_publish_raw() {
        let board = TargetBoard::new();
        assert_eq!(
            board.publish_raw(3, 10),
            Ok((AxisId::MinuteUnits, Digit::Blank))
        );
        assert_eq!(board.take(AxisId::MinuteUnits), Some(Digit::Blank));
    }

    #[test]
    fn test_publish_raw_rejects_without_side_effects() {
        let board = TargetBoard::new();
        board.publish(AxisId::HourUnits, Digit::Two);
        assert_eq!(board.take(AxisId::HourUnits), Some(Digit::Two));
        board.set_moving(AxisId::HourUnits, true);
        let before = AxisId::ALL.map(|axis| board.peek(axis));

        assert_eq!(board.publish_raw(4, 3), Err(ClockError::InvalidAxis(4)));
        assert_eq!(board.publish_raw(1, 11), Err(ClockError::InvalidDigit(11)));
        // Both out of range reports the axis
        assert_eq!(board.publish_raw(9, 200), Err(ClockError::InvalidAxis(9)));

        assert_eq!(AxisId::ALL.map(|axis| board.peek(axis)), before);
        assert_eq!(board.moving_mask(), 0b0010);
        for axis in AxisId::ALL {
            assert_eq!(board.take(axis), None);
        }
    }

    #[test]
    fn test_blank_survives_the_dirty_bit() {
        let board = TargetBoard::new();
        board.publish(AxisId::MinuteUnits, Digit::Blank);
        assert_eq!(board.take(AxisId::MinuteUnits), Some(Digit::Blank));
    }

    #[test]
    fn test_moving_mask() {
        let board = TargetBoard::new();
        board.set_moving(AxisId::HourTens, true);
        board.set_moving(AxisId::MinuteUnits, true);
        assert_eq!(board.moving_mask(), 0b1001);

        board.set_moving(AxisId::HourTens, false);
        assert_eq!(board.moving_mask(), 0b1000);
    }

    #[test]
    fn test_concurrent_producer_and_consumer() {
        use std::sync::Arc;
        use std::thread;

        let board = Arc::new(TargetBoard::new());
        let producer = {
            let board = Arc::clone(&board);
            thread::spawn(move || {
                for i in 0..10_000u32 {
                    board.publish(AxisId::MinuteUnits, Digit::ones(i));
                }
                board.publish(AxisId::MinuteUnits, Digit::Blank);
            })
        };

        let mut last = None;
        while !producer.is_finished() {
            if let Some(digit) = board.take(AxisId::MinuteUnits) {
                last = Some(digit);
            }
        }
        producer.join().unwrap();
        if let Some(digit) = board.take(AxisId::MinuteUnits) {
            last = Some(digit);
        }

        // Whatever was missed, the final publish is always observed
        assert_eq!(last, Some(Digit::Blank));
    }

    proptest! {
        #[test]
        fn prop_only_latest_publish_is_observed(values in proptest::collection::vec(0u8..=10, 1..20)) {
            let board = TargetBoard::new();
            for &value in &values {
                board.publish(AxisId::HourTens, Digit::new(value).unwrap());
            }
            let expected = Digit::new(*values.last().unwrap()).unwrap();
            prop_assert_eq!(board.take(AxisId::HourTens), Some(expected));
            prop_assert_eq!(board.take(AxisId::HourTens), None);
        }
    }
}
