//! Clock Command Protocol
//!
//! UART protocol between a host (network bridge, desktop tool) and the
//! clock controller. It carries the two override surfaces of the clock,
//! setting the time and forcing a single digit, plus status queries.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 0–16B       │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! Every host command is answered with exactly one reply frame. Values in
//! a command are passed through unvalidated; range checks belong to the
//! clock, which answers out-of-range values with a `Nak`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{ClockReply, HostCommand, NakCode, StatusReport};
