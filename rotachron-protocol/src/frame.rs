//! Frame encoding and decoding
//!
//! Frame format:
//! - START (1 byte): 0xA5 synchronization byte
//! - LENGTH (1 byte): payload length (0-16)
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (0-16 bytes): type-specific data
//! - CHECKSUM (1 byte): XOR of LENGTH, TYPE, and all PAYLOAD bytes

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xA5;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 16;

/// Maximum complete frame size (START + LENGTH + TYPE + MAX_PAYLOAD + CHECKSUM)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Unknown type or payload of the wrong shape
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given message type and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Payload as a fixed-size array, or `InvalidFrame` if the length differs
    pub fn payload_array<const N: usize>(&self) -> Result<[u8; N], FrameError> {
        self.payload
            .as_slice()
            .try_into()
            .map_err(|_| FrameError::InvalidFrame)
    }

    fn checksum(length: u8, msg_type: u8, payload: &[u8]) -> u8 {
        payload.iter().fold(length ^ msg_type, |acc, &b| acc ^ b)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let payload_len = self.payload.len();
        let frame_len = 4 + payload_len;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = payload_len as u8;
        buffer[0] = FRAME_START;
        buffer[1] = length;
        buffer[2] = self.msg_type;
        buffer[3..3 + payload_len].copy_from_slice(&self.payload);
        buffer[3 + payload_len] = Self::checksum(length, self.msg_type, &self.payload);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Vec<u8, MAX_FRAME_SIZE> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        // A frame always fits MAX_FRAME_SIZE
        let len = self.encode(&mut buffer).unwrap_or(0);
        let mut vec = Vec::new();
        let _ = vec.extend_from_slice(&buffer[..len]);
        vec
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Got START, waiting for LENGTH
    WaitingForLength,
    /// Got LENGTH, waiting for TYPE
    WaitingForType,
    /// Reading payload bytes
    ReadingPayload,
    /// Waiting for CHECKSUM
    WaitingForChecksum,
}

/// Byte-at-a-time frame parser
///
/// Resynchronizes on the next START byte after any error, so a corrupted
/// frame costs at most that frame.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
    expected_length: u8,
    msg_type: u8,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
            expected_length: 0,
            msg_type: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
        self.expected_length = 0;
        self.msg_type = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.state = ParseState::WaitingForLength;
                }
                Ok(None)
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::PayloadTooLarge);
                }
                self.expected_length = byte;
                self.state = ParseState::WaitingForType;
                Ok(None)
            }
            ParseState::WaitingForType => {
                self.msg_type = byte;
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForChecksum
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Length was bounded above, so this cannot overflow
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForChecksum;
                }
                Ok(None)
            }
            ParseState::WaitingForChecksum => {
                let expected = Frame::checksum(self.expected_length, self.msg_type, &self.buffer);
                if byte != expected {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame {
                    msg_type: self.msg_type,
                    payload: core::mem::take(&mut self.buffer),
                };
                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any. Bytes after that
    /// frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame_encode_empty_payload() {
        let frame = Frame::empty(0x04);
        let mut buffer = [0u8; 10];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 4);
        assert_eq!(&buffer[..4], &[FRAME_START, 0, 0x04, 0x04]);
    }

    #[test]
    fn test_frame_encode_with_payload() {
        let frame = Frame::new(0x02, &[3, 10]).unwrap();
        let mut buffer = [0u8; 10];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 6);
        // checksum = 2 ^ 0x02 ^ 3 ^ 10
        assert_eq!(&buffer[..6], &[FRAME_START, 2, 0x02, 3, 10, 0x09]);
    }

    #[test]
    fn test_buffer_too_small() {
        let frame = Frame::new(0x01, &[1, 2, 3, 4]).unwrap();
        let mut buffer = [0u8; 7];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_parse_encoded_frame() {
        let original = Frame::new(0x01, &[0xB0, 0x04, 0x00, 0x00]).unwrap();
        let encoded = original.encode_to_vec();

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Ok(Some(original)));
    }

    #[test]
    fn test_parser_invalid_checksum() {
        let mut encoded = Frame::empty(0x03).encode_to_vec();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Err(FrameError::InvalidChecksum));

        // Recovers on the next frame
        let good = Frame::empty(0x03).encode_to_vec();
        assert!(parser.feed_bytes(&good).unwrap().is_some());
    }

    #[test]
    fn test_parser_rejects_oversized_length() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed(FRAME_START), Ok(None));
        assert_eq!(parser.feed(17), Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn test_parser_resync_after_garbage() {
        let encoded = Frame::empty(0x04).encode_to_vec();
        let mut data = Vec::<u8, 32>::new();
        data.extend_from_slice(&[0x00, 0xFF, 0x12, 0x34]).unwrap();
        data.extend_from_slice(&encoded).unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&data).unwrap().unwrap();
        assert_eq!(parsed.msg_type, 0x04);
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(
            Frame::new(0x01, &large_payload),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_payload_array() {
        let frame = Frame::new(0x02, &[1, 2]).unwrap();
        assert_eq!(frame.payload_array::<2>(), Ok([1, 2]));
        assert_eq!(frame.payload_array::<4>(), Err(FrameError::InvalidFrame));
    }

    proptest! {
        #[test]
        fn prop_parser_survives_noise(noise in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut parser = FrameParser::new();
            for byte in noise {
                let _ = parser.feed(byte);
            }
            // A clean frame always gets through once the parser is resynced
            parser.reset();
            let frame = Frame::new(0x02, &[1, 5]).unwrap();
            prop_assert_eq!(parser.feed_bytes(&frame.encode_to_vec()), Ok(Some(frame)));
        }
    }
}
