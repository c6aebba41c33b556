use crate::compensation::{is_physical_temperature, DEFAULT_BASELINE_C};
use crate::errors::{ConfigError, ConfigResult};
use crate::registers::{DEFAULT_ADDRESS, MAX_ADDRESS};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Root configuration, one ultrasonic module per file.
///
/// ```toml
/// bus = "/dev/i2c-1"
/// address = 0x34
///
/// [acquisition]
/// timeout_ms = 300
/// settle_ms = 120
///
/// [temperature]
/// offset_c = -2.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Device node of the I2C bus the module sits on.
    pub bus: String,
    pub address: u8,
    pub acquisition: AcquisitionConfig,
    pub temperature: ThermometerConfig,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            bus: "/dev/i2c-1".to_string(),
            address: DEFAULT_ADDRESS,
            acquisition: AcquisitionConfig::default(),
            temperature: ThermometerConfig::default(),
        }
    }
}

impl SensorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        validate_address(self.address)?;
        self.acquisition.validate()?;
        self.temperature.validate()
    }
}

impl FromStr for SensorConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> ConfigResult<Self> {
        let parsed: SensorConfig = toml::from_str(content)?;
        parsed.validate()?;
        Ok(parsed)
    }
}

/// Timing and averaging defaults for the acquisition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcquisitionConfig {
    /// Upper bound for a blocking read before it gives up with 0.0.
    pub timeout_ms: u64,
    /// Wait between trigger and read for single readings.
    pub settle_ms: u64,
    pub average_samples: u32,
    /// Shorter wait used between averaged samples.
    pub average_settle_ms: u64,
    pub baseline_temperature_c: f32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 300,
            settle_ms: 120,
            average_samples: 5,
            average_settle_ms: 80,
            baseline_temperature_c: DEFAULT_BASELINE_C,
        }
    }
}

impl AcquisitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn average_settle(&self) -> Duration {
        Duration::from_millis(self.average_settle_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.settle_ms == 0 {
            return Err(invalid("acquisition.settle_ms", "must be greater than zero"));
        }
        if self.average_settle_ms == 0 {
            return Err(invalid(
                "acquisition.average_settle_ms",
                "must be greater than zero",
            ));
        }
        if self.average_samples == 0 {
            return Err(invalid(
                "acquisition.average_samples",
                "must be greater than zero",
            ));
        }
        let baseline = self.baseline_temperature_c;
        if !is_physical_temperature(baseline) {
            return Err(invalid(
                "acquisition.baseline_temperature_c",
                format!("{baseline} °C is not a physical air temperature"),
            ));
        }
        Ok(())
    }
}

/// Calibration of the analog board thermometer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThermometerConfig {
    /// Added to every converted reading.
    pub offset_c: f32,
    /// Readings above this are logged as suspicious.
    pub overheat_warning_c: f32,
}

impl Default for ThermometerConfig {
    fn default() -> Self {
        Self {
            offset_c: -2.0,
            overheat_warning_c: 60.0,
        }
    }
}

impl ThermometerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.offset_c.is_finite() {
            return Err(invalid("temperature.offset_c", "must be a finite number"));
        }
        if !self.overheat_warning_c.is_finite() {
            return Err(invalid(
                "temperature.overheat_warning_c",
                "must be a finite number",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_address(address: u8) -> ConfigResult<()> {
    if address > MAX_ADDRESS {
        return Err(invalid(
            "address",
            format!("{address:#04x} is not a 7-bit I2C address"),
        ));
    }
    Ok(())
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Loads config from TOML file
pub fn load_sensor_config(path: impl AsRef<Path>) -> ConfigResult<SensorConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.display().to_string(),
        source,
    })?;
    let parsed: SensorConfig = content.parse()?;
    info!(
        "[config] loaded sensor {:#04x} on {} from {}",
        parsed.address,
        parsed.bus,
        path.display()
    );
    Ok(parsed)
}
