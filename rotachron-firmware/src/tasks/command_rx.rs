//! Command UART receive task
//!
//! Receives frames from the host and queues them for the dispatcher.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use rotachron_protocol::{ClockReply, Frame, FrameParser, HostCommand, NakCode};

use crate::channels::{Request, REPLIES, REQUESTS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Command RX task - receives and parses frames from the host
#[embassy_executor::task]
pub async fn command_rx_task(mut rx: BufferedUartRx) {
    info!("Command RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => handle_frame(&frame).await,
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Queue a received frame for the dispatcher
///
/// Every frame is answered exactly once. A full queue is answered here
/// with `Busy`; everything else is answered by the dispatcher in order.
async fn handle_frame(frame: &Frame) {
    let request = match HostCommand::from_frame(frame) {
        Ok(cmd) => {
            debug!("Command: {:?}", cmd);
            Request::Command(cmd)
        }
        Err(e) => {
            warn!("Malformed command 0x{:02x}: {:?}", frame.msg_type, e);
            Request::Malformed {
                msg_type: frame.msg_type,
            }
        }
    };

    if REQUESTS.try_send(request).is_err() {
        warn!("Request queue full, rejecting 0x{:02x}", frame.msg_type);
        let busy = ClockReply::Nak {
            msg_type: frame.msg_type,
            code: NakCode::Busy,
        };
        REPLIES.send(busy).await;
    }
}
