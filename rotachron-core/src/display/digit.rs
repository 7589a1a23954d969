//! Digit and axis identifiers
//!
//! A clock face is four drums, each showing one of ten digits or a blank
//! flap. Both types are closed enums so out-of-range values are rejected
//! once, at the boundary, and never reach the target board.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ClockError;

/// Number of independently driven digit drums
pub const AXIS_COUNT: usize = 4;

/// Wire value of the blank/home flap
pub const BLANK_VALUE: u8 = 10;

/// A displayable digit
///
/// `Blank` sits one digit pitch past nine on the drum and is used as the
/// home position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Digit {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Blank = BLANK_VALUE,
}

impl Digit {
    /// All numeric digits in drum order
    pub const NUMERALS: [Digit; 10] = [
        Digit::Zero,
        Digit::One,
        Digit::Two,
        Digit::Three,
        Digit::Four,
        Digit::Five,
        Digit::Six,
        Digit::Seven,
        Digit::Eight,
        Digit::Nine,
    ];

    /// Validate a raw value (0..=9, or 10 for blank)
    pub const fn new(value: u8) -> Result<Self, ClockError> {
        match value {
            0..=9 => Ok(Self::NUMERALS[value as usize]),
            BLANK_VALUE => Ok(Digit::Blank),
            _ => Err(ClockError::InvalidDigit(value)),
        }
    }

    /// Units digit of a number
    pub const fn ones(value: u32) -> Self {
        Self::NUMERALS[(value % 10) as usize]
    }

    /// Tens digit of a number
    pub const fn tens(value: u32) -> Self {
        Self::NUMERALS[((value / 10) % 10) as usize]
    }

    /// Raw value, 10 for blank
    pub const fn value(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Digit {
    type Error = ClockError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> u8 {
        digit.value()
    }
}

/// One digit drum of the clock face
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum AxisId {
    HourTens = 0,
    HourUnits = 1,
    MinuteTens = 2,
    MinuteUnits = 3,
}

impl AxisId {
    /// All axes, left to right
    pub const ALL: [AxisId; AXIS_COUNT] = [
        AxisId::HourTens,
        AxisId::HourUnits,
        AxisId::MinuteTens,
        AxisId::MinuteUnits,
    ];

    /// Validate a raw axis index (0..=3)
    pub const fn new(index: u8) -> Result<Self, ClockError> {
        if (index as usize) < AXIS_COUNT {
            Ok(Self::ALL[index as usize])
        } else {
            Err(ClockError::InvalidAxis(index))
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Name used in configuration sections and log output
    pub const fn name(self) -> &'static str {
        match self {
            AxisId::HourTens => "hour_tens",
            AxisId::HourUnits => "hour_units",
            AxisId::MinuteTens => "minute_tens",
            AxisId::MinuteUnits => "minute_units",
        }
    }

    /// Look up an axis by configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.name() == name)
    }
}

impl TryFrom<u8> for AxisId {
    type Error = ClockError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index)
    }
}

/// What the clock face should show, one digit per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplaySnapshot {
    digits: [Digit; AXIS_COUNT],
}

impl DisplaySnapshot {
    pub const fn new(digits: [Digit; AXIS_COUNT]) -> Self {
        Self { digits }
    }

    pub const fn digit(&self, axis: AxisId) -> Digit {
        self.digits[axis.index()]
    }

    pub const fn digits(&self) -> [Digit; AXIS_COUNT] {
        self.digits
    }

    /// Raw digit values in axis order
    pub fn values(&self) -> [u8; AXIS_COUNT] {
        self.digits.map(Digit::value)
    }
}
