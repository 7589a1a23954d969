//! Digit geometry
//!
//! Maps a digit onto an absolute step position of its drum. Step zero is
//! the digit zero flap, and each following digit sits one fixed pitch
//! further clockwise. The blank flap is one pitch past nine.

use crate::config::GeometryConfig;
use crate::display::Digit;
use crate::error::ClockError;

/// Centidegrees in one full revolution
const CENTIDEGREES_PER_REV: u64 = 36_000;

/// Step pitch between adjacent digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitGeometry {
    steps_per_digit: i64,
}

impl Default for DigitGeometry {
    fn default() -> Self {
        Self::from_config(&GeometryConfig::default())
    }
}

impl DigitGeometry {
    /// Compute the pitch from motor and drum parameters
    ///
    /// The pitch is floored once; every digit position is an exact multiple
    /// of it so rounding never accumulates across digits.
    pub fn new(full_steps_per_rev: u16, microsteps: u16, centidegrees_per_digit: u32) -> Self {
        let steps_per_rev = full_steps_per_rev as u64 * microsteps as u64;
        let steps_per_digit = steps_per_rev * centidegrees_per_digit as u64 / CENTIDEGREES_PER_REV;
        Self {
            steps_per_digit: steps_per_digit as i64,
        }
    }

    pub fn from_config(config: &GeometryConfig) -> Self {
        Self::new(
            config.full_steps_per_rev,
            config.microsteps,
            config.centidegrees_per_digit,
        )
    }

    /// Steps between two adjacent digits
    pub const fn steps_per_digit(&self) -> i64 {
        self.steps_per_digit
    }

    /// Absolute step position of a digit
    pub const fn steps_for_digit(&self, digit: Digit) -> i64 {
        digit.value() as i64 * self.steps_per_digit
    }

    /// Absolute step position of a raw digit value
    pub fn steps_for_value(&self, value: u8) -> Result<i64, ClockError> {
        Digit::new(value).map(|digit| self.steps_for_digit(digit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_pitch() {
        // 200 * 16 * 32.72 / 360 = 290.84..., floored
        let geometry = DigitGeometry::default();
        assert_eq!(geometry.steps_per_digit(), 290);
    }

    #[test]
    fn test_boundary_digits() {
        let geometry = DigitGeometry::default();
        assert_eq!(geometry.steps_for_digit(Digit::Zero), 0);
        assert_eq!(geometry.steps_for_digit(Digit::Nine), 2610);
    }

    #[test]
    fn test_blank_is_one_pitch_past_nine() {
        let geometry = DigitGeometry::default();
        assert_eq!(
            geometry.steps_for_digit(Digit::Blank),
            geometry.steps_for_digit(Digit::Nine) + geometry.steps_per_digit()
        );
        assert_eq!(geometry.steps_for_digit(Digit::Blank), 2900);
    }

    #[test]
    fn test_rejects_invalid_value() {
        let geometry = DigitGeometry::default();
        assert_eq!(geometry.steps_for_value(10), Ok(2900));
        assert_eq!(geometry.steps_for_value(11), Err(ClockError::InvalidDigit(11)));
    }

    #[test]
    fn test_other_builds() {
        // Full-step drive, 36 degree pitch
        assert_eq!(DigitGeometry::new(200, 1, 3600).steps_per_digit(), 20);
        // 0.9 degree motor at 8x
        assert_eq!(DigitGeometry::new(400, 8, 3272).steps_per_digit(), 290);
    }

    proptest! {
        #[test]
        fn prop_digit_is_exact_multiple(value in 0u8..=10) {
            let geometry = DigitGeometry::default();
            prop_assert_eq!(
                geometry.steps_for_value(value),
                Ok(value as i64 * geometry.steps_per_digit())
            );
        }

        #[test]
        fn prop_positions_increase(
            full in 1u16..=400,
            micro in prop::sample::select(vec![1u16, 2, 4, 8, 16]),
            pitch in 1u32..=36_000,
        ) {
            let geometry = DigitGeometry::new(full, micro, pitch);
            for pair in Digit::NUMERALS.windows(2) {
                prop_assert!(
                    geometry.steps_for_digit(pair[1]) >= geometry.steps_for_digit(pair[0])
                );
            }
        }
    }
}
