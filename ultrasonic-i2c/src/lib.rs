//! Driver for HC-SR04 style ultrasonic distance modules that sit behind an
//! I2C register interface (default address `0x34`).
//!
//! [`UltrasonicSensor`] triggers pings and reads the result registers over
//! any `embedded_hal` I2C bus, and layers three acquisition strategies on
//! top: blocking until a valid echo, averaging valid echoes, and correcting
//! a reading for air temperature.

// Public modules
pub mod clock;
pub mod compensation;
pub mod config;
pub mod errors;
pub mod hal;
pub mod mock_utils;
pub mod registers;
pub mod sensors;
pub mod shared;

// Re-export commonly used types
pub use clock::{Clock, StdClock};
pub use compensation::{speed_of_sound_m_s, CompensationParams};
pub use config::{load_sensor_config, AcquisitionConfig, SensorConfig};
pub use errors::{ConfigError, ConfigResult, SensorError, SensorResult};
pub use registers::RawMeasurement;
pub use sensors::{
    AverageReading, BlockingReading, FixedTemperature, TemperatureSource, UltrasonicSensor,
};
pub use shared::SharedSensor;

use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
///
/// Honors `RUST_LOG`; does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .try_init();
}
