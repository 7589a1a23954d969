//! Rotachron Hardware Abstraction Layer
//!
//! Hardware abstraction traits implemented by chip-specific HALs. The
//! clock logic itself lives in `rotachron-core` and only sees the traits
//! defined there; this crate covers the firmware-side collaborators.
//!
//! # Traits
//!
//! - [`flash::FlashStorage`] - Persistent key-value storage

#![no_std]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey};
