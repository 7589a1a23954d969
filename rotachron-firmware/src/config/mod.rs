//! Configuration and timestamp persistence
//!
//! Loads the clock configuration from flash or embedded defaults, and
//! reads and writes the last rendered time.

pub mod loader;
pub mod timestamp;

pub use loader::ConfigPersistence;
pub use timestamp::{load_timestamp, save_timestamp};
