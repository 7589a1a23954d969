//! Configuration types
//!
//! Board-agnostic configuration structures, stored in flash as TOML text
//! or postcard binary data.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ParseError};
pub use types::*;
