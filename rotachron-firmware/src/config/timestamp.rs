//! Persisted timestamp
//!
//! The last rendered time is stored as a postcard-encoded
//! `TimestampRecord`. A missing, torn or foreign record reads back as
//! "nothing persisted".

use defmt::*;

use rotachron_core::time::{EpochSeconds, TimestampRecord};
use rotachron_hal_rp2040::flash::{FlashError, FlashStorage, StorageKey};
use rotachron_hal_rp2040::FlashStorageTrait;

/// Maximum serialized record size
const MAX_RECORD_SIZE: usize = 32;

/// Timestamp persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// Magic, version or CRC check failed
    InvalidRecord,
}

impl From<FlashError> for PersistError {
    fn from(e: FlashError) -> Self {
        PersistError::Flash(e)
    }
}

/// Load the last rendered time from flash
///
/// Must run before the first write of this boot.
pub async fn load_timestamp(storage: &mut FlashStorage<'_>) -> Option<EpochSeconds> {
    match load_timestamp_inner(storage).await {
        Ok(timestamp) => {
            info!("Persisted timestamp: {}", timestamp.as_secs());
            Some(timestamp)
        }
        Err(PersistError::Flash(FlashError::NotFound)) => {
            info!("No persisted timestamp in flash");
            None
        }
        Err(e) => {
            warn!("Failed to load persisted timestamp: {:?}", e);
            None
        }
    }
}

async fn load_timestamp_inner(
    storage: &mut FlashStorage<'_>,
) -> Result<EpochSeconds, PersistError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let len = storage.read(StorageKey::LastTimestamp, &mut buffer).await?;

    let record: TimestampRecord =
        postcard::from_bytes(&buffer[..len]).map_err(|_| PersistError::Deserialize)?;

    record.timestamp().ok_or(PersistError::InvalidRecord)
}

/// Save the last rendered time to flash
pub async fn save_timestamp(
    storage: &mut FlashStorage<'_>,
    timestamp: EpochSeconds,
) -> Result<(), PersistError> {
    let record = TimestampRecord::new(timestamp);

    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let bytes = postcard::to_slice(&record, &mut buffer).map_err(|_| PersistError::Serialize)?;

    storage.write(StorageKey::LastTimestamp, bytes).await?;

    trace!("Persisted timestamp {}", timestamp.as_secs());
    Ok(())
}
