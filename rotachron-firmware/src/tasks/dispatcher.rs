//! Dispatcher task
//!
//! The single serialization point for everything that changes what the
//! clock shows: RTC minute ticks, time-set commands, digit overrides and
//! the boot recovery render. Owns the display coordinator and the RTC, so
//! the four publishes of one render are never interleaved with another
//! producer.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C1;
use embassy_time::{Duration, Ticker};

use rotachron_core::display::{DisplayCoordinator, DisplayOptions, DisplaySnapshot};
use rotachron_core::time::EpochSeconds;
use rotachron_core::traits::{TimeSource, TimestampStore};
use rotachron_core::ClockError;
use rotachron_drivers::rtc::Ds3231Clock;
use rotachron_protocol::{ClockReply, HostCommand, NakCode, StatusReport};

use crate::channels::{Request, PERSIST, REPLIES, REQUESTS, TARGET_BOARD};

/// RTC polling interval; minute rollovers are detected within this bound
const RTC_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Battery-backed RTC on I2C1
pub type ClockRtc = Ds3231Clock<I2c<'static, I2C1, Blocking>>;

/// Hands rendered times to the persist task
struct PersistSignal;

impl TimestampStore for PersistSignal {
    fn persist(&mut self, timestamp: EpochSeconds) {
        PERSIST.signal(timestamp);
    }
}

/// Dispatcher task - renders the time and applies host commands
#[embassy_executor::task]
pub async fn dispatcher_task(mut rtc: ClockRtc, options: DisplayOptions) {
    info!("Dispatcher task started");

    let mut coordinator = DisplayCoordinator::new(options);
    let mut store = PersistSignal;
    let mut ticker = Ticker::every(RTC_POLL_INTERVAL);

    loop {
        match select(REQUESTS.receive(), ticker.next()).await {
            Either::First(Request::Render(timestamp)) => {
                let snapshot = coordinator.render(timestamp, &TARGET_BOARD, &mut store);
                log_render("Recovery render", timestamp, &snapshot);
            }
            Either::First(Request::Command(cmd)) => {
                let reply = handle_command(cmd, &mut coordinator, &mut rtc, &mut store);
                REPLIES.send(reply).await;
            }
            Either::First(Request::Malformed { msg_type }) => {
                let reply = ClockReply::Nak {
                    msg_type,
                    code: NakCode::Malformed,
                };
                REPLIES.send(reply).await;
            }
            Either::Second(()) => {
                let Some(now) = rtc.now() else {
                    trace!("RTC not running");
                    continue;
                };
                if let Some(snapshot) = coordinator.tick(now, &TARGET_BOARD, &mut store) {
                    log_render("Minute rollover", now, &snapshot);
                }
            }
        }
    }
}

/// Apply one host command and build its reply
fn handle_command(
    cmd: HostCommand,
    coordinator: &mut DisplayCoordinator,
    rtc: &mut impl TimeSource,
    store: &mut PersistSignal,
) -> ClockReply {
    let msg_type = cmd.msg_type();
    let nak = |code| ClockReply::Nak { msg_type, code };

    match cmd {
        HostCommand::SetTime { epoch_seconds } => {
            let timestamp = EpochSeconds::new(epoch_seconds);
            match coordinator.set_time(timestamp, rtc, &TARGET_BOARD, store) {
                Ok(snapshot) => {
                    log_render("Time set", timestamp, &snapshot);
                    ClockReply::Ack { msg_type }
                }
                Err(e) => {
                    warn!("Failed to set RTC to {}: {:?}", epoch_seconds, e);
                    nak(NakCode::ClockFault)
                }
            }
        }
        HostCommand::SetDigit { axis, digit } => match TARGET_BOARD.publish_raw(axis, digit) {
            Ok((axis_id, value)) => {
                info!("Override: {} -> {}", axis_id.name(), value.value());
                ClockReply::Ack { msg_type }
            }
            Err(e) => {
                warn!("Override rejected: {:?}", e);
                nak(match e {
                    ClockError::InvalidAxis(_) => NakCode::InvalidAxis,
                    ClockError::InvalidDigit(_) => NakCode::InvalidDigit,
                })
            }
        },
        HostCommand::GetStatus => ClockReply::Status(StatusReport {
            targets: TARGET_BOARD.targets().map(u8::from),
            moving_mask: TARGET_BOARD.moving_mask(),
            last_rendered: coordinator.last_rendered().map_or(0, EpochSeconds::as_secs),
        }),
        HostCommand::Ping => {
            trace!("PING received");
            ClockReply::Pong
        }
    }
}

fn log_render(reason: &str, timestamp: EpochSeconds, snapshot: &DisplaySnapshot) {
    info!(
        "{}: {} -> {:?}",
        reason,
        timestamp.as_secs(),
        snapshot.values()
    );
}
