//! RP2040-specific HAL for the rotary-digit clock firmware
//!
//! This crate provides RP2040 implementations of the shared traits:
//!
//! - Flash storage driver (implements `rotachron_hal::FlashStorage`)
//! - Config-driven GPIO allocation

#![no_std]

pub mod flash;
pub mod pins;

// Re-export shared traits from rotachron-hal for convenience
pub use rotachron_hal::{FlashStorage as FlashStorageTrait, StorageKey};
