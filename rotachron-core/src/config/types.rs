//! Clock configuration types
//!
//! Everything that varies between physical builds: drum geometry, motor
//! limits, pin assignments and time display options. Stored in flash as
//! TOML text or postcard binary, with an embedded TOML fallback.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::display::{AxisId, AXIS_COUNT};
use crate::time::DEFAULT_RECOVERY_WINDOW_S;

/// Configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Highest usable GPIO number on the RP2040
pub const MAX_GPIO: u8 = 29;

/// MS1/MS2/MS3 levels for a microstep factor (A4988 table)
///
/// `None` for factors the select pins cannot express.
pub const fn microstep_levels(microsteps: u16) -> Option<[bool; 3]> {
    match microsteps {
        1 => Some([false, false, false]),
        2 => Some([true, false, false]),
        4 => Some([false, true, false]),
        8 => Some([true, true, false]),
        16 => Some([true, true, true]),
        _ => None,
    }
}

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// Drum geometry shared by all four axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeometryConfig {
    /// Full steps per motor rotation (200 for 1.8° motors)
    pub full_steps_per_rev: u16,
    /// Microstep factor set on the driver
    pub microsteps: u16,
    /// Drum rotation between adjacent digits, in hundredths of a degree
    pub centidegrees_per_digit: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            full_steps_per_rev: 200,
            microsteps: 16,
            centidegrees_per_digit: 3272,
        }
    }
}

/// Motion limits and scheduling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionConfig {
    /// Maximum speed in full steps per second
    pub max_speed: u32,
    /// Acceleration in full steps per second squared
    pub acceleration: u32,
    /// Poll interval while moving, in microseconds
    pub move_poll_us: u32,
    /// Poll interval while idle, in microseconds
    pub idle_poll_us: u32,
    /// Step pulse high time, in nanoseconds
    pub pulse_width_ns: u32,
    /// Disable drivers while their axis is idle
    pub release_when_idle: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 150,
            acceleration: 300,
            move_poll_us: 250,
            idle_poll_us: 2500,
            pulse_width_ns: 2000,
            release_when_idle: false,
        }
    }
}

impl MotionConfig {
    /// Maximum speed in microsteps per second
    pub fn max_speed_microsteps(&self, microsteps: u16) -> u32 {
        self.max_speed.saturating_mul(microsteps as u32)
    }

    /// Acceleration in microsteps per second squared
    pub fn acceleration_microsteps(&self, microsteps: u16) -> u32 {
        self.acceleration.saturating_mul(microsteps as u32)
    }
}

/// Pins for one digit drum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisHwConfig {
    /// Step pulse pin
    pub step_pin: PinConfig,
    /// Direction pin; inversion reverses the drum
    pub dir_pin: PinConfig,
    /// Enable pin (active-low typically)
    pub enable_pin: Option<PinConfig>,
}

/// Microstep resolution select pins (MS1/MS2/MS3), shared by all drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MicrostepPins {
    pub ms1: Option<PinConfig>,
    pub ms2: Option<PinConfig>,
    pub ms3: Option<PinConfig>,
}

impl MicrostepPins {
    /// MS1, MS2, MS3 in order; `None` where the line is hard-wired low
    pub const fn slots(&self) -> [Option<PinConfig>; 3] {
        [self.ms1, self.ms2, self.ms3]
    }

    pub fn iter(&self) -> impl Iterator<Item = PinConfig> + '_ {
        self.slots().into_iter().flatten()
    }

    /// Whether every select line `microsteps` drives high is wired
    pub fn can_select(&self, microsteps: u16) -> bool {
        match microstep_levels(microsteps) {
            Some(levels) => self
                .slots()
                .iter()
                .zip(levels)
                .all(|(pin, high)| pin.is_some() || !high),
            None => false,
        }
    }
}

/// Hour display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HourMode {
    /// 1..=12, midnight and noon show 12
    #[default]
    Twelve,
    /// 0..=23
    TwentyFour,
}

/// Time display and recovery options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeConfig {
    /// Local time offset from UTC in minutes
    pub utc_offset_minutes: i16,
    /// 12- or 24-hour display
    pub hour_mode: HourMode,
    /// Show a blank flap instead of a leading hour zero
    pub blank_leading_zero: bool,
    /// Maximum outage, in seconds, that is fast-forwarded at boot
    pub recovery_window_s: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            hour_mode: HourMode::Twelve,
            blank_leading_zero: false,
            recovery_window_s: DEFAULT_RECOVERY_WINDOW_S,
        }
    }
}

/// GPIOs wired to the command link UART (UART0 TX/RX)
pub const LINK_PINS: [u8; 2] = [0, 1];

/// GPIOs wired to the battery-backed RTC (I2C1 SDA/SCL)
pub const RTC_PINS: [u8; 2] = [26, 27];

/// Command link UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Baud rate
    pub baud_rate: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { baud_rate: 115_200 }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Config version mismatch
    VersionMismatch(u8),
    /// Steps per revolution or digit pitch is zero
    InvalidGeometry,
    /// Microstep factor the select pins cannot express
    UnsupportedMicrosteps(u16),
    /// Microstep factor needs a select pin that is not wired
    MicrostepPinMissing(u16),
    /// Speed or acceleration is zero
    InvalidMotion,
    /// Idle polling must not be faster than moving polling
    InvalidCadence,
    /// GPIO number out of range
    InvalidPin(u8),
    /// Same GPIO assigned twice
    DuplicatePin(u8),
    /// An axis section is missing
    MissingAxis(AxisId),
}

/// Complete clock configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClockConfig {
    /// Configuration version for compatibility checks
    pub version: u8,
    pub geometry: GeometryConfig,
    pub motion: MotionConfig,
    /// Per-axis pins, indexed by `AxisId`
    pub axes: [Option<AxisHwConfig>; AXIS_COUNT],
    pub microstep_pins: MicrostepPins,
    pub time: TimeConfig,
    pub link: LinkConfig,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            geometry: GeometryConfig::default(),
            motion: MotionConfig::default(),
            axes: [None; AXIS_COUNT],
            microstep_pins: MicrostepPins::default(),
            time: TimeConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

impl ClockConfig {
    /// Create a new configuration with defaults and no axes
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins for an axis
    pub fn axis(&self, axis: AxisId) -> Option<&AxisHwConfig> {
        self.axes[axis.index()].as_ref()
    }

    /// Check the configuration is usable on hardware
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch(self.version));
        }

        let g = &self.geometry;
        if g.full_steps_per_rev == 0 || g.centidegrees_per_digit == 0 {
            return Err(ConfigError::InvalidGeometry);
        }
        if microstep_levels(g.microsteps).is_none() {
            return Err(ConfigError::UnsupportedMicrosteps(g.microsteps));
        }

        let m = &self.motion;
        if m.max_speed == 0 || m.acceleration == 0 || m.move_poll_us == 0 {
            return Err(ConfigError::InvalidMotion);
        }
        if m.idle_poll_us < m.move_poll_us {
            return Err(ConfigError::InvalidCadence);
        }

        // Every GPIO may be claimed once
        let mut claimed: u32 = 0;
        let mut claim = |pin: u8| -> Result<(), ConfigError> {
            if pin > MAX_GPIO {
                return Err(ConfigError::InvalidPin(pin));
            }
            let bit = 1u32 << pin;
            if claimed & bit != 0 {
                return Err(ConfigError::DuplicatePin(pin));
            }
            claimed |= bit;
            Ok(())
        };

        for axis in AxisId::ALL {
            let hw = self.axis(axis).ok_or(ConfigError::MissingAxis(axis))?;
            claim(hw.step_pin.pin)?;
            claim(hw.dir_pin.pin)?;
            if let Some(enable) = hw.enable_pin {
                claim(enable.pin)?;
            }
        }
        for pin in self.microstep_pins.iter() {
            claim(pin.pin)?;
        }
        for pin in LINK_PINS.into_iter().chain(RTC_PINS) {
            claim(pin)?;
        }

        // Unwired select lines are hard-wired low
        if !self.microstep_pins.can_select(g.microsteps) {
            return Err(ConfigError::MicrostepPinMissing(g.microsteps));
        }

        Ok(())
    }
}
