//! Hardware driver implementations
//!
//! Concrete implementations of the traits defined in rotachron-core,
//! written against `embedded-hal` 1.0 so they run on any chip HAL:
//!
//! - Step/direction stepper drivers (A4988, DRV8825, TMC in standalone mode)
//! - Microstep resolution select pins (MS1/MS2/MS3)
//! - DS3231 battery-backed RTC as the authoritative time source

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod rtc;
pub mod stepper;
