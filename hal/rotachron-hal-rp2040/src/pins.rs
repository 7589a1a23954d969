//! Config-driven GPIO allocation
//!
//! Pin numbers come from the clock configuration rather than the source,
//! so GPIOs are handed out by number at runtime. GPIO0/1 are wired to the
//! command link UART and GPIO26/27 to the RTC on I2C1; neither pair ever
//! enters the bank.

use embassy_rp::gpio::{AnyPin, Level, Output};
use embassy_rp::peripherals::{DMA_CH0, FLASH, I2C1, PIN_0, PIN_1, PIN_26, PIN_27, UART0};
use embassy_rp::{Peri, Peripherals};
use rotachron_core::config::{PinConfig, LINK_PINS, RTC_PINS};

/// Number of GPIO pins on RP2040
pub const GPIO_COUNT: usize = 30;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin(u8),
    /// Pin already taken
    AlreadyTaken(u8),
    /// Pin reserved for the command link or the RTC bus
    Reserved(u8),
}

/// Pin bank that holds GPIO pins and hands them out by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if LINK_PINS.contains(&pin_num) || RTC_PINS.contains(&pin_num) {
            return Err(PinError::Reserved(pin_num));
        }
        self.pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin(pin_num))?
            .take()
            .ok_or(PinError::AlreadyTaken(pin_num))
    }

    /// Take a pin as a push-pull output, driven inactive
    ///
    /// The returned output is raw; inversion is applied by the driver that
    /// owns it.
    pub fn output(&mut self, config: PinConfig) -> Result<Output<'static>, PinError> {
        let pin = self.take(config.pin)?;
        let idle = if config.inverted { Level::High } else { Level::Low };
        Ok(Output::new(pin, idle))
    }
}

/// Peripherals used by the clock, split out of the Embassy `Peripherals`
pub struct BoardPeripherals {
    /// Config-assignable GPIOs
    pub pins: PinBank,
    pub flash: Peri<'static, FLASH>,
    pub flash_dma: Peri<'static, DMA_CH0>,
    pub i2c: Peri<'static, I2C1>,
    pub i2c_sda: Peri<'static, PIN_26>,
    pub i2c_scl: Peri<'static, PIN_27>,
    pub uart: Peri<'static, UART0>,
    pub uart_tx: Peri<'static, PIN_0>,
    pub uart_rx: Peri<'static, PIN_1>,
}

impl BoardPeripherals {
    /// Split the chip peripherals into a pin bank and fixed-function parts
    pub fn split(p: Peripherals) -> Self {
        let pins = PinBank {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                None,
                None,
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };

        Self {
            pins,
            flash: p.FLASH,
            flash_dma: p.DMA_CH0,
            i2c: p.I2C1,
            i2c_sda: p.PIN_26,
            i2c_scl: p.PIN_27,
            uart: p.UART0,
            uart_tx: p.PIN_0,
            uart_rx: p.PIN_1,
        }
    }
}
