//! Board-agnostic core logic for the rotary-digit clock firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Digit and axis types, and the lock-free target board
//! - Digit geometry (digit -> absolute step position)
//! - Per-axis motion controller and acceleration ramp
//! - Display coordinator (wall-clock time -> four digits)
//! - Power-loss recovery planning
//! - Configuration types and the embedded TOML-subset parser
//! - Hardware abstraction traits (stepper, time source, timestamp store)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod display;
pub mod error;
pub mod motion;
pub mod time;
pub mod traits;

pub use error::ClockError;

#[cfg(test)]
mod scenarios;
