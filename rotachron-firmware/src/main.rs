//! Rotachron - Rotary-Digit Clock Firmware
//!
//! Main firmware binary for RP2040-based four-drum clocks. Each drum is
//! turned by its own stepper to the flap of one digit of the time.
//!
//! Named after the Latin "rota" (wheel) and Greek "chronos" (time).

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Output;
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use rotachron_core::config::{
    parse_config, AxisHwConfig, ClockConfig, ConfigError, PinConfig,
};
use rotachron_core::display::{AxisId, DisplayOptions};
use rotachron_core::motion::{AxisController, DigitGeometry};
use rotachron_core::time::{RecoveryOutcome, RecoveryPlanner};
use rotachron_core::traits::TimeSource;
use rotachron_drivers::rtc::Ds3231Clock;
use rotachron_drivers::stepper::{MicrostepError, MicrostepSelect, StepDirConfig, StepDirDriver};
use rotachron_hal_rp2040::flash::FlashStorage;
use rotachron_hal_rp2040::pins::{BoardPeripherals, PinBank, PinError};

use crate::channels::{Request, REQUESTS};
use crate::config::{load_timestamp, loader::log_config_summary, ConfigPersistence};
use crate::tasks::ClockStepper;

/// Embedded default configuration (compiled into firmware)
/// Edit clock.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../clock.toml");

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Hardware setup failures
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum SetupError {
    Pin(PinError),
    Microstep(MicrostepError),
    Config(ConfigError),
}

impl From<PinError> for SetupError {
    fn from(e: PinError) -> Self {
        SetupError::Pin(e)
    }
}

impl From<MicrostepError> for SetupError {
    fn from(e: MicrostepError) -> Self {
        SetupError::Microstep(e)
    }
}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self {
        SetupError::Config(e)
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Rotachron firmware starting...");

    let p = embassy_rp::init(Default::default());
    let mut board = BoardPeripherals::split(p);
    info!("Peripherals initialized");

    // Configuration from flash (or embedded defaults), then the timestamp
    // persisted by the previous boot, both before the first flash write
    let mut persistence = ConfigPersistence::new(FlashStorage::new(board.flash, board.flash_dma));
    let config = load_config(&mut persistence).await;
    let mut storage = persistence.into_storage();
    let persisted = load_timestamp(&mut storage).await;

    // Microstep resolution is latched before the first axis quantum
    if let Err(e) = setup_microsteps(&mut board.pins, &config) {
        error!("Microstep select setup failed: {:?}", e);
        return;
    }
    info!("Microstep resolution set to 1/{}", config.geometry.microsteps);

    for axis in AxisId::ALL {
        match build_axis(&mut board.pins, &config, axis) {
            Ok(controller) => spawner.spawn(tasks::axis_task(controller)).unwrap(),
            Err(e) => {
                error!("Axis {} setup failed: {:?}", axis.name(), e);
                return;
            }
        }
    }
    info!("Axis tasks spawned");

    // Boot recovery: bring the drums from the last rendered time to now
    let i2c = I2c::new_blocking(board.i2c, board.i2c_scl, board.i2c_sda, I2cConfig::default());
    let mut rtc = Ds3231Clock::new(i2c);
    let planner = RecoveryPlanner::new(config.time.recovery_window_s);
    match rtc.now() {
        Some(now) => {
            let outcome = planner.plan(persisted, now);
            log_recovery(&outcome);
            if let Some(target) = outcome.target() {
                // Queue is empty at boot; the render precedes any tick
                if REQUESTS.try_send(Request::Render(target)).is_err() {
                    warn!("Request queue full, skipping recovery render");
                }
            }
        }
        None if rtc.is_running() => warn!("RTC time unreadable, waiting for a time-set command"),
        None => info!("RTC lost power, waiting for a time-set command"),
    }

    // Command link UART
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.link.baud_rate;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(board.uart, board.uart_tx, board.uart_rx, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config.link.baud_rate);

    // Spawn the remaining tasks
    spawner.spawn(tasks::persist_task(storage)).unwrap();
    spawner
        .spawn(tasks::dispatcher_task(rtc, DisplayOptions::from(&config.time)))
        .unwrap();
    spawner.spawn(tasks::command_rx_task(rx)).unwrap();
    spawner.spawn(tasks::command_tx_task(tx)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Load and validate the configuration
///
/// A flash configuration that fails validation is ignored in favour of the
/// embedded one.
async fn load_config(persistence: &mut ConfigPersistence<'_>) -> ClockConfig {
    match persistence.load().await {
        Ok(config) => match config.validate() {
            Ok(()) => {
                info!("Loaded configuration from flash");
                return config;
            }
            Err(e) => warn!("Flash configuration invalid: {:?}", e),
        },
        Err(_) => {
            info!("No valid configuration in flash, using embedded defaults");
        }
    }

    create_default_config()
}

/// Create the embedded default configuration
///
/// Parses the clock.toml file that was embedded at compile time.
fn create_default_config() -> ClockConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => match config.validate() {
            Ok(()) => {
                info!("Parsed embedded configuration successfully");
                log_config_summary(&config);
                return config;
            }
            Err(e) => error!("Embedded config invalid: {:?}", e),
        },
        Err(e) => error!("Failed to parse embedded config: {:?}", e),
    }

    // Only reachable if clock.toml slipped past the build-time check
    error!("Using minimal fallback configuration");
    create_minimal_fallback_config()
}

/// Minimal fallback configuration if the embedded TOML is unusable
///
/// Reference board wiring: each axis takes three consecutive GPIOs from
/// GPIO2 (STEP, DIR, active-low EN), microstep select is left hard-wired.
fn create_minimal_fallback_config() -> ClockConfig {
    let mut config = ClockConfig::new();
    for axis in AxisId::ALL {
        let base = 2 + 3 * axis.index() as u8;
        config.axes[axis.index()] = Some(AxisHwConfig {
            step_pin: PinConfig::new(base),
            dir_pin: PinConfig::new(base + 1),
            enable_pin: Some(PinConfig::inverted(base + 2)),
        });
    }
    // Full steps only; no select pins to drive
    config.geometry.microsteps = 1;
    config
}

/// Drive MS1-MS3 for the configured resolution
fn setup_microsteps(pins: &mut PinBank, config: &ClockConfig) -> Result<(), SetupError> {
    let ms = &config.microstep_pins;
    let mut output = |pin: Option<PinConfig>| -> Result<Option<(Output<'static>, bool)>, PinError> {
        pin.map(|cfg| pins.output(cfg).map(|out| (out, cfg.inverted)))
            .transpose()
    };

    let mut select = MicrostepSelect::new(output(ms.ms1)?, output(ms.ms2)?, output(ms.ms3)?);
    select.apply(config.geometry.microsteps)?;
    Ok(())
}

/// Claim the pins of one axis and wrap them in a controller
fn build_axis(
    pins: &mut PinBank,
    config: &ClockConfig,
    axis: AxisId,
) -> Result<AxisController<ClockStepper>, SetupError> {
    let hw = config.axis(axis).ok_or(ConfigError::MissingAxis(axis))?;

    let step = pins.output(hw.step_pin)?;
    let dir = pins.output(hw.dir_pin)?;
    let enable = hw.enable_pin.map(|pin| pins.output(pin)).transpose()?;

    let driver = StepDirDriver::new(
        step,
        dir,
        enable,
        Delay,
        StepDirConfig {
            pulse_width_ns: config.motion.pulse_width_ns,
            step_inverted: hw.step_pin.inverted,
            dir_inverted: hw.dir_pin.inverted,
            enable_inverted: hw.enable_pin.is_some_and(|pin| pin.inverted),
        },
    );

    Ok(AxisController::new(
        axis,
        driver,
        DigitGeometry::from_config(&config.geometry),
        &config.motion,
        config.geometry.microsteps,
    ))
}

fn log_recovery(outcome: &RecoveryOutcome) {
    match outcome {
        RecoveryOutcome::MissingPersistedState => {
            info!("Recovery: no persisted state, drums stay at rest");
        }
        RecoveryOutcome::StaleRecoveryWindow { gap_s } => {
            info!("Recovery: persisted time is {}s old, waiting for next rollover", gap_s);
        }
        RecoveryOutcome::ClockBehind { persisted } => {
            info!(
                "Recovery: RTC is behind persisted time {}, waiting for next rollover",
                persisted.as_secs()
            );
        }
        RecoveryOutcome::FastForward(target) => {
            info!("Recovery: fast-forward to {}", target.as_secs());
        }
    }
}
