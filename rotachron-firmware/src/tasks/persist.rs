//! Persist task
//!
//! Owns the flash after boot and writes each rendered time, so the
//! dispatcher never waits on an erase or program cycle.

use defmt::*;

use rotachron_hal_rp2040::flash::FlashStorage;

use crate::channels::PERSIST;
use crate::config::save_timestamp;

/// Persist task - writes the latest rendered time to flash
#[embassy_executor::task]
pub async fn persist_task(mut storage: FlashStorage<'static>) {
    info!("Persist task started");

    loop {
        let timestamp = PERSIST.wait().await;

        if let Err(e) = save_timestamp(&mut storage, timestamp).await {
            warn!("Failed to persist timestamp {}: {:?}", timestamp.as_secs(), e);
        }
    }
}
