/// Hardware Abstraction Layer (HAL) bindings for running the acquirer on a host.
///
/// The driver itself only needs `embedded_hal` traits; this module wires it to
/// a Linux `/dev/i2c-N` character device.

#[cfg(feature = "linux-hal")]
pub mod linux {
    use crate::config::SensorConfig;
    use crate::errors::{ConfigError, ConfigResult};
    use crate::sensors::ultrasonic::UltrasonicSensor;
    use tracing::info;

    // Re-export linux-embedded-hal types directly
    pub use linux_embedded_hal::{Delay, I2cdev as I2CDevice};

    /// Acquirer on a Linux I2C character device.
    pub type LinuxSensor = UltrasonicSensor<I2CDevice, Delay>;

    /// Open `config.bus` and build an acquirer for the module it describes.
    pub fn open(config: &SensorConfig) -> ConfigResult<LinuxSensor> {
        config.validate()?;
        let i2c = I2CDevice::new(&config.bus).map_err(|e| ConfigError::BusUnavailable {
            bus: config.bus.clone(),
            reason: e.to_string(),
        })?;
        info!(
            "[hal] opened {} for ultrasonic module at {:#04x}",
            config.bus, config.address
        );
        UltrasonicSensor::from_config(i2c, Delay, config)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn missing_bus_is_reported() {
            let config = SensorConfig {
                bus: "/dev/i2c-does-not-exist".to_string(),
                ..SensorConfig::default()
            };
            let err = open(&config).err().unwrap();
            assert!(matches!(
                err,
                ConfigError::BusUnavailable { ref bus, .. } if bus == &config.bus
            ));
        }

        #[test]
        fn invalid_config_is_rejected_before_opening() {
            let config = SensorConfig {
                bus: "/dev/i2c-does-not-exist".to_string(),
                address: 0xFF,
                ..SensorConfig::default()
            };
            let err = open(&config).err().unwrap();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
        }
    }
}

// Re-export the active platform's HAL
#[cfg(feature = "linux-hal")]
pub use linux::*;
