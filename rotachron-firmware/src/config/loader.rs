//! Configuration persistence
//!
//! Loads clock configuration from flash storage.
//! Falls back to embedded defaults if flash is empty.

use core::str;
use defmt::*;

use rotachron_core::config::{parse_config, ClockConfig, CONFIG_VERSION};
use rotachron_core::display::AxisId;
use rotachron_hal_rp2040::flash::{FlashError, FlashStorage, StorageKey};
use rotachron_hal_rp2040::FlashStorageTrait;

/// Maximum serialized config size (binary)
const MAX_CONFIG_SIZE: usize = 512;

/// Maximum TOML config size, bounded by the flash item size
const MAX_TOML_SIZE: usize = 2048;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// TOML parsing failed
    TomlParse,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Config version mismatch
    VersionMismatch,
}

impl From<FlashError> for LoadError {
    fn from(e: FlashError) -> Self {
        LoadError::Flash(e)
    }
}

/// Configuration persistence manager
///
/// Handles loading clock configuration from flash storage.
pub struct ConfigPersistence<'d> {
    storage: FlashStorage<'d>,
}

impl<'d> ConfigPersistence<'d> {
    pub fn new(storage: FlashStorage<'d>) -> Self {
        Self { storage }
    }

    /// Consume this persistence manager and return the underlying storage
    ///
    /// The storage is reused for the persisted timestamp after the
    /// configuration is loaded.
    pub fn into_storage(self) -> FlashStorage<'d> {
        self.storage
    }

    /// Load configuration from flash
    ///
    /// Tries the TOML text first, then the binary postcard format.
    pub async fn load(&mut self) -> Result<ClockConfig, LoadError> {
        info!("Loading configuration from flash...");

        match self.load_toml().await {
            Ok(config) => {
                info!("Loaded configuration from TOML");
                return Ok(config);
            }
            Err(LoadError::Flash(FlashError::NotFound)) => {
                debug!("No TOML config found, trying binary format");
            }
            Err(e) => {
                warn!("Failed to load TOML config: {:?}, trying binary", e);
            }
        }

        self.load_binary().await
    }

    async fn load_toml(&mut self) -> Result<ClockConfig, LoadError> {
        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self
            .storage
            .read(StorageKey::ClockConfigToml, &mut buffer)
            .await?;

        debug!("Read {} bytes of TOML from flash", len);

        let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| LoadError::InvalidUtf8)?;

        let config = parse_config(toml_str).map_err(|e| {
            warn!("TOML parse error: {:?}", e);
            LoadError::TomlParse
        })?;

        log_config_summary(&config);
        Ok(config)
    }

    async fn load_binary(&mut self) -> Result<ClockConfig, LoadError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self
            .storage
            .read(StorageKey::ClockConfig, &mut buffer)
            .await?;

        debug!("Read {} bytes of binary config from flash", len);

        let config: ClockConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| LoadError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            warn!(
                "Config version mismatch: found {}, expected {}",
                config.version, CONFIG_VERSION
            );
            return Err(LoadError::VersionMismatch);
        }

        log_config_summary(&config);
        Ok(config)
    }
}

/// Log a summary of the loaded configuration
pub fn log_config_summary(config: &ClockConfig) {
    let g = &config.geometry;
    let m = &config.motion;
    debug!(
        "  geometry: {} full steps x{}, {} cdeg/digit",
        g.full_steps_per_rev, g.microsteps, g.centidegrees_per_digit
    );
    debug!(
        "  motion: {} steps/s, {} steps/s^2, poll {}/{} us",
        m.max_speed, m.acceleration, m.move_poll_us, m.idle_poll_us
    );
    for axis in AxisId::ALL {
        if let Some(hw) = config.axis(axis) {
            debug!(
                "  {}: step={} dir={}",
                axis.name(),
                hw.step_pin.pin,
                hw.dir_pin.pin
            );
        }
    }
    debug!(
        "  time: offset {} min, {:?}",
        config.time.utc_offset_minutes, config.time.hour_mode
    );
}
