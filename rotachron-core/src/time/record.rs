//! Persisted timestamp record
//!
//! The last rendered time is stored in flash so the display can be
//! reconciled after a power loss. The record carries a magic number,
//! version and CRC so a torn or foreign write reads back as "nothing
//! persisted" instead of a bogus time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::epoch::EpochSeconds;

/// Magic number to identify a timestamp record
pub const TIMESTAMP_MAGIC: u32 = 0x524F_5443; // "ROTC"

/// Current record format version
pub const TIMESTAMP_VERSION: u8 = 1;

/// Last rendered time, as written to flash
///
/// Serialized with postcard by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimestampRecord {
    /// Magic number for validation
    pub magic: u32,
    /// Format version
    pub version: u8,
    /// Last rendered time
    pub epoch_seconds: u32,
    /// CRC32 over magic, version and epoch_seconds
    pub crc: u32,
}

impl TimestampRecord {
    /// Create a sealed record for a timestamp
    pub fn new(timestamp: EpochSeconds) -> Self {
        let mut record = Self {
            magic: TIMESTAMP_MAGIC,
            version: TIMESTAMP_VERSION,
            epoch_seconds: timestamp.as_secs(),
            crc: 0,
        };
        record.crc = record.calculate_crc();
        record
    }

    /// Check magic and version
    pub fn is_valid(&self) -> bool {
        self.magic == TIMESTAMP_MAGIC && self.version == TIMESTAMP_VERSION
    }

    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.epoch_seconds.to_le_bytes());
        !crc
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// The stored timestamp, if the record is intact
    pub fn timestamp(&self) -> Option<EpochSeconds> {
        (self.is_valid() && self.verify_crc()).then_some(EpochSeconds(self.epoch_seconds))
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_intact() {
        let record = TimestampRecord::new(EpochSeconds(1200));
        assert!(record.is_valid());
        assert!(record.verify_crc());
        assert_eq!(record.timestamp(), Some(EpochSeconds(1200)));
    }

    #[test]
    fn test_corrupted_record_reads_as_missing() {
        let mut record = TimestampRecord::new(EpochSeconds(1200));
        record.epoch_seconds = 1201;
        assert_eq!(record.timestamp(), None);
    }

    #[test]
    fn test_foreign_magic_reads_as_missing() {
        let mut record = TimestampRecord::new(EpochSeconds(1200));
        record.magic = 0x5049_4443;
        record.crc = record.calculate_crc();
        assert_eq!(record.timestamp(), None);
    }

    #[test]
    fn test_crc_known_value() {
        // Standard check value for the IEEE CRC32
        assert_eq!(!crc32_update(0xFFFF_FFFF, b"123456789"), 0xCBF4_3926);
    }
}
