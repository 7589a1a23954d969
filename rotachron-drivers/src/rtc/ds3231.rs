//! DS3231 time source
//!
//! The DS3231 keeps calendar time on its coin cell across power loss. Its
//! oscillator-stop flag is set whenever the cell ran flat (or on first
//! power-up), and stays set until the clock is written, so a set flag
//! means "no authoritative time".

use ds323x::interface::I2cInterface;
use ds323x::{ic, DateTimeAccess, Datelike, Ds323x, NaiveDate, Timelike};
use embedded_hal::i2c::I2c;
use rotachron_core::time::{CivilDateTime, EpochSeconds};
use rotachron_core::traits::{TimeSource, TimeSourceError};

/// DS3231 on an I2C bus, wrapped as a [`TimeSource`]
pub struct Ds3231Clock<I2C> {
    rtc: Ds323x<I2cInterface<I2C>, ic::DS3231>,
}

impl<I2C: I2c> Ds3231Clock<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            rtc: Ds323x::new_ds3231(i2c),
        }
    }

    /// Oscillator has kept time since the last set
    ///
    /// A chip that does not answer is reported as not running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.rtc.has_been_stopped(), Ok(false))
    }
}

impl<I2C: I2c> TimeSource for Ds3231Clock<I2C> {
    fn now(&mut self) -> Option<EpochSeconds> {
        if !self.is_running() {
            return None;
        }
        let dt = self.rtc.datetime().ok()?;

        CivilDateTime {
            year: u16::try_from(dt.year()).ok()?,
            month: dt.month() as u8,
            day: dt.day() as u8,
            weekday: dt.weekday().num_days_from_sunday() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
        }
        .to_epoch()
    }

    fn set(&mut self, timestamp: EpochSeconds) -> Result<(), TimeSourceError> {
        let civil = CivilDateTime::from_epoch(timestamp);
        let datetime = NaiveDate::from_ymd_opt(
            i32::from(civil.year),
            u32::from(civil.month),
            u32::from(civil.day),
        )
        .and_then(|date| {
            date.and_hms_opt(
                u32::from(civil.hour),
                u32::from(civil.minute),
                u32::from(civil.second),
            )
        })
        .ok_or(TimeSourceError::InvalidTime)?;

        self.rtc.set_datetime(&datetime).map_err(|e| match e {
            // Outside the chip's 2000..=2100 calendar
            ds323x::Error::InvalidInputData => TimeSourceError::InvalidTime,
            _ => TimeSourceError::Bus,
        })?;
        self.rtc
            .clear_has_been_stopped_flag()
            .map_err(|_| TimeSourceError::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation, SevenBitAddress};

    const ADDRESS: u8 = 0x68;
    const REG_STATUS: usize = 0x0F;
    const OSF: u8 = 0x80;

    /// DS3231 register file behind an I2C bus
    struct FakeDs3231 {
        regs: [u8; 0x13],
        pointer: usize,
        offline: bool,
    }

    impl FakeDs3231 {
        /// Fresh chip: oscillator-stop flag set, calendar at reset values
        fn powered_up() -> Self {
            let mut regs = [0u8; 0x13];
            regs[0x03] = 0x01;
            regs[0x04] = 0x01;
            regs[0x05] = 0x01;
            regs[REG_STATUS] = OSF;
            Self {
                regs,
                pointer: 0,
                offline: false,
            }
        }
    }

    impl ErrorType for &mut FakeDs3231 {
        type Error = ErrorKind;
    }

    impl I2c<SevenBitAddress> for &mut FakeDs3231 {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.offline || address != ADDRESS {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        let Some((&reg, data)) = bytes.split_first() else {
                            continue;
                        };
                        self.pointer = reg as usize;
                        for &byte in data {
                            self.regs[self.pointer % self.regs.len()] = byte;
                            self.pointer += 1;
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.regs[self.pointer % self.regs.len()];
                            self.pointer += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    /// 2024-03-09 14:05:30 UTC
    fn sample_time() -> EpochSeconds {
        CivilDateTime {
            year: 2024,
            month: 3,
            day: 9,
            weekday: 6,
            hour: 14,
            minute: 5,
            second: 30,
        }
        .to_epoch()
        .unwrap()
    }

    #[test]
    fn test_stopped_oscillator_has_no_time() {
        let mut chip = FakeDs3231::powered_up();
        let mut clock = Ds3231Clock::new(&mut chip);

        assert!(!clock.is_running());
        assert_eq!(clock.now(), None);
    }

    #[test]
    fn test_set_writes_bcd_and_clears_stop_flag() {
        let mut chip = FakeDs3231::powered_up();
        let mut clock = Ds3231Clock::new(&mut chip);

        assert_eq!(clock.set(sample_time()), Ok(()));
        assert!(clock.is_running());
        assert_eq!(clock.now(), Some(sample_time()));

        drop(clock);
        assert_eq!(chip.regs[0x00], 0x30);
        assert_eq!(chip.regs[0x01], 0x05);
        assert_eq!(chip.regs[0x02], 0x14);
        assert_eq!(chip.regs[0x04], 0x09);
        assert_eq!(chip.regs[0x05], 0x03);
        assert_eq!(chip.regs[0x06], 0x24);
        assert_eq!(chip.regs[REG_STATUS] & OSF, 0);
    }

    #[test]
    fn test_time_survives_reattach() {
        let mut chip = FakeDs3231::powered_up();
        Ds3231Clock::new(&mut chip).set(sample_time()).unwrap();

        // Board power cycle: the chip kept its registers on the coin cell
        let mut clock = Ds3231Clock::new(&mut chip);
        assert_eq!(clock.now(), Some(sample_time()));
    }

    #[test]
    fn test_pre_2000_time_is_rejected() {
        let mut chip = FakeDs3231::powered_up();
        let mut clock = Ds3231Clock::new(&mut chip);

        assert_eq!(
            clock.set(EpochSeconds(86_400)),
            Err(TimeSourceError::InvalidTime)
        );
        assert!(!clock.is_running());
    }

    #[test]
    fn test_bus_failure() {
        let mut chip = FakeDs3231::powered_up();
        chip.offline = true;
        let mut clock = Ds3231Clock::new(&mut chip);

        assert_eq!(clock.now(), None);
        assert!(!clock.is_running());
        assert_eq!(clock.set(sample_time()), Err(TimeSourceError::Bus));
    }
}
