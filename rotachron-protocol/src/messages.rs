//! Message types for the clock command protocol
//!
//! Message types are divided into two categories:
//! - Host → Clock: time set, digit override, status query, heartbeat
//! - Clock → Host: one reply per command

use crate::frame::{Frame, FrameError};

// Message type IDs: Host → Clock
pub const MSG_SET_TIME: u8 = 0x01;
pub const MSG_SET_DIGIT: u8 = 0x02;
pub const MSG_GET_STATUS: u8 = 0x03;
pub const MSG_PING: u8 = 0x04;

// Message type IDs: Clock → Host
pub const MSG_ACK: u8 = 0x20;
pub const MSG_NAK: u8 = 0x21;
pub const MSG_STATUS: u8 = 0x22;
pub const MSG_PONG: u8 = 0x24;

/// Commands sent by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand {
    /// Set the authoritative clock and render it
    SetTime { epoch_seconds: u32 },
    /// Force one drum to a digit (10 = blank)
    SetDigit { axis: u8, digit: u8 },
    /// Ask for a status report
    GetStatus,
    /// Heartbeat
    Ping,
}

impl HostCommand {
    /// Parse a command from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_SET_TIME => {
                let bytes = frame.payload_array::<4>()?;
                Ok(HostCommand::SetTime {
                    epoch_seconds: u32::from_le_bytes(bytes),
                })
            }
            MSG_SET_DIGIT => {
                let [axis, digit] = frame.payload_array::<2>()?;
                Ok(HostCommand::SetDigit { axis, digit })
            }
            MSG_GET_STATUS => Ok(HostCommand::GetStatus),
            MSG_PING => Ok(HostCommand::Ping),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this command into a frame (host side and tests)
    pub fn to_frame(&self) -> Frame {
        match *self {
            HostCommand::SetTime { epoch_seconds } => {
                Frame::new(MSG_SET_TIME, &epoch_seconds.to_le_bytes())
                    .unwrap_or_else(|_| Frame::empty(MSG_SET_TIME))
            }
            HostCommand::SetDigit { axis, digit } => Frame::new(MSG_SET_DIGIT, &[axis, digit])
                .unwrap_or_else(|_| Frame::empty(MSG_SET_DIGIT)),
            HostCommand::GetStatus => Frame::empty(MSG_GET_STATUS),
            HostCommand::Ping => Frame::empty(MSG_PING),
        }
    }

    /// Message type of this command, echoed in `Ack`/`Nak`
    pub fn msg_type(&self) -> u8 {
        match self {
            HostCommand::SetTime { .. } => MSG_SET_TIME,
            HostCommand::SetDigit { .. } => MSG_SET_DIGIT,
            HostCommand::GetStatus => MSG_GET_STATUS,
            HostCommand::Ping => MSG_PING,
        }
    }
}

/// Reason a command was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NakCode {
    /// Axis index outside 0..=3
    InvalidAxis = 1,
    /// Digit outside 0..=10
    InvalidDigit = 2,
    /// Frame type unknown or payload of the wrong size
    Malformed = 3,
    /// The time source rejected the new time
    ClockFault = 4,
    /// Command queue full; retry later
    Busy = 5,
}

impl NakCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(NakCode::InvalidAxis),
            2 => Some(NakCode::InvalidDigit),
            3 => Some(NakCode::Malformed),
            4 => Some(NakCode::ClockFault),
            5 => Some(NakCode::Busy),
            _ => None,
        }
    }
}

/// Snapshot of the clock for `GetStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    /// Latest target digit per axis (10 = blank)
    pub targets: [u8; 4],
    /// Bit N set while axis N is moving
    pub moving_mask: u8,
    /// Last rendered time; 0 if nothing rendered since boot
    pub last_rendered: u32,
}

/// Replies sent by the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockReply {
    /// Command accepted
    Ack { msg_type: u8 },
    /// Command refused
    Nak { msg_type: u8, code: NakCode },
    Status(StatusReport),
    /// Heartbeat response
    Pong,
}

impl ClockReply {
    /// Encode this reply into a frame
    pub fn to_frame(&self) -> Frame {
        let frame = match *self {
            ClockReply::Ack { msg_type } => Frame::new(MSG_ACK, &[msg_type]),
            ClockReply::Nak { msg_type, code } => Frame::new(MSG_NAK, &[msg_type, code as u8]),
            ClockReply::Status(status) => {
                let mut payload = [0u8; 9];
                payload[..4].copy_from_slice(&status.targets);
                payload[4] = status.moving_mask;
                payload[5..].copy_from_slice(&status.last_rendered.to_le_bytes());
                Frame::new(MSG_STATUS, &payload)
            }
            ClockReply::Pong => Ok(Frame::empty(MSG_PONG)),
        };
        // Every reply payload is far below the frame limit
        frame.unwrap_or_else(|_| Frame::empty(MSG_NAK))
    }

    /// Parse a reply from a frame (host side and tests)
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_ACK => {
                let [msg_type] = frame.payload_array::<1>()?;
                Ok(ClockReply::Ack { msg_type })
            }
            MSG_NAK => {
                let [msg_type, code] = frame.payload_array::<2>()?;
                let code = NakCode::from_byte(code).ok_or(FrameError::InvalidFrame)?;
                Ok(ClockReply::Nak { msg_type, code })
            }
            MSG_STATUS => {
                let p = frame.payload_array::<9>()?;
                Ok(ClockReply::Status(StatusReport {
                    targets: [p[0], p[1], p[2], p[3]],
                    moving_mask: p[4],
                    last_rendered: u32::from_le_bytes([p[5], p[6], p[7], p[8]]),
                }))
            }
            MSG_PONG => Ok(ClockReply::Pong),
            _ => Err(FrameError::InvalidFrame),
        }
    }
}
