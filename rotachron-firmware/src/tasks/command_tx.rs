//! Command UART transmit task
//!
//! Sends one reply frame per host command.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::REPLIES;

/// Command TX task - encodes and sends replies to the host
#[embassy_executor::task]
pub async fn command_tx_task(mut tx: BufferedUartTx) {
    info!("Command TX task started");

    loop {
        let reply = REPLIES.receive().await;
        let bytes = reply.to_frame().encode_to_vec();

        match tx.write_all(&bytes).await {
            Ok(()) => trace!("Reply sent: {:?}", reply),
            Err(e) => warn!("Failed to send reply: {:?}", e),
        }
    }
}
