//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks. The target board is
//! lock-free; everything else goes through embassy-sync primitives.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use rotachron_core::display::TargetBoard;
use rotachron_core::time::EpochSeconds;
use rotachron_protocol::{ClockReply, HostCommand};

/// Channel capacity for dispatcher requests
const REQUEST_CHANNEL_SIZE: usize = 8;

/// Channel capacity for replies to the host
const REPLY_CHANNEL_SIZE: usize = 8;

/// Work for the dispatcher, the single writer of whole-face renders
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Render once, ahead of periodic ticking (boot recovery)
    Render(EpochSeconds),
    /// Decoded host command
    Command(HostCommand),
    /// Frame with a valid checksum but unknown type or bad payload
    Malformed { msg_type: u8 },
}

/// Desired digit per axis, written by the dispatcher, read by axis tasks
pub static TARGET_BOARD: TargetBoard = TargetBoard::new();

/// Requests for the dispatcher (command RX and boot)
pub static REQUESTS: Channel<CriticalSectionRawMutex, Request, REQUEST_CHANNEL_SIZE> =
    Channel::new();

/// Replies for the command TX task
pub static REPLIES: Channel<CriticalSectionRawMutex, ClockReply, REPLY_CHANNEL_SIZE> =
    Channel::new();

/// Latest rendered time to write to flash
///
/// A render that lands while the previous write is still in flight
/// replaces the pending value.
pub static PERSIST: Signal<CriticalSectionRawMutex, EpochSeconds> = Signal::new();
