//! Epoch seconds and civil date/time conversion
//!
//! The clock keeps time as unsigned seconds since 1970-01-01T00:00:00Z.
//! Conversion to calendar fields is needed to read and set the hardware
//! RTC; only hour and minute matter for the display.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Seconds in one day
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Unsigned seconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpochSeconds(pub u32);

impl EpochSeconds {
    pub const fn new(seconds: u32) -> Self {
        Self(seconds)
    }

    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Whole minutes since the epoch; changes exactly at each minute rollover
    pub const fn minute_index(self) -> u32 {
        self.0 / 60
    }

    /// Seconds from `earlier` to `self`, or `None` if `earlier` is later
    pub const fn since(self, earlier: EpochSeconds) -> Option<u32> {
        self.0.checked_sub(earlier.0)
    }

    pub const fn checked_add(self, seconds: u32) -> Option<Self> {
        match self.0.checked_add(seconds) {
            Some(s) => Some(Self(s)),
            None => None,
        }
    }

    /// Local hour/minute/second after applying a UTC offset
    pub fn wall_time(self, utc_offset_minutes: i16) -> WallTime {
        let local = self.0 as i64 + utc_offset_minutes as i64 * 60;
        let second_of_day = local.rem_euclid(SECONDS_PER_DAY as i64) as u32;
        WallTime {
            hour: (second_of_day / 3600) as u8,
            minute: ((second_of_day / 60) % 60) as u8,
            second: (second_of_day % 60) as u8,
        }
    }
}

impl From<u32> for EpochSeconds {
    fn from(seconds: u32) -> Self {
        Self(seconds)
    }
}

/// Time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallTime {
    /// 0..=23
    pub hour: u8,
    /// 0..=59
    pub minute: u8,
    /// 0..=59
    pub second: u8,
}

/// Calendar date and time in UTC, as an RTC chip presents it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilDateTime {
    pub year: u16,
    /// 1..=12
    pub month: u8,
    /// 1..=31
    pub day: u8,
    /// 0 = Sunday
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilDateTime {
    /// Break epoch seconds into calendar fields
    pub fn from_epoch(epoch: EpochSeconds) -> Self {
        let days = (epoch.0 / SECONDS_PER_DAY) as i64;
        let second_of_day = epoch.0 % SECONDS_PER_DAY;
        let (year, month, day) = civil_from_days(days);

        Self {
            year: year as u16,
            month,
            day,
            // 1970-01-01 was a Thursday
            weekday: ((days + 4) % 7) as u8,
            hour: (second_of_day / 3600) as u8,
            minute: ((second_of_day / 60) % 60) as u8,
            second: (second_of_day % 60) as u8,
        }
    }

    /// Convert back to epoch seconds
    ///
    /// Returns `None` for dates before 1970 or beyond the `u32` range.
    /// The weekday field is ignored.
    pub fn to_epoch(&self) -> Option<EpochSeconds> {
        if !(1..=12).contains(&self.month) || !(1..=31).contains(&self.day) {
            return None;
        }
        if self.hour > 23 || self.minute > 59 || self.second > 59 {
            return None;
        }

        let days = days_from_civil(self.year as i64, self.month, self.day);
        let seconds = days * SECONDS_PER_DAY as i64
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64;

        u32::try_from(seconds).ok().map(EpochSeconds)
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of `days_from_civil`
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
