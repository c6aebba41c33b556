//! External air temperature sources used for speed-of-sound compensation.

use crate::config::ThermometerConfig;
use core::convert::Infallible;
use core::fmt::Debug;
use tracing::{trace, warn};

/// Anything that can report the current air temperature in °C.
pub trait TemperatureSource {
    type Error: Debug;

    fn temperature_c(&mut self) -> Result<f32, Self::Error>;
}

/// A temperature known ahead of time, e.g. from a weather feed or a setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTemperature(pub f32);

impl TemperatureSource for FixedTemperature {
    type Error = Infallible;

    fn temperature_c(&mut self) -> Result<f32, Self::Error> {
        Ok(self.0)
    }
}

/// A single-ended ADC channel with a 16-bit full scale.
pub trait AnalogInput {
    type Error: Debug;

    /// Raw conversion result, 0..=65535 spanning 0 V..=reference.
    fn read_raw(&mut self) -> Result<u16, Self::Error>;

    /// Reference voltage of the converter in volts.
    fn reference_voltage(&self) -> f32;
}

/// Full-scale count of a 16-bit conversion.
const ADC_FULL_SCALE: f32 = 65535.0;
/// Sensor output at 0 °C, millivolts.
const ZERO_CELSIUS_MV: f32 = 500.0;
/// Sensor slope, millivolts per °C.
const MV_PER_CELSIUS: f32 = 10.0;

/// Linear analog thermometer (TMP36 style: 500 mV at 0 °C, 10 mV/°C) read
/// through an [`AnalogInput`].
pub struct AnalogThermometer<A> {
    adc: A,
    calibration: ThermometerConfig,
}

impl<A: AnalogInput> AnalogThermometer<A> {
    pub fn new(adc: A) -> Self {
        Self::with_calibration(adc, ThermometerConfig::default())
    }

    pub fn with_calibration(adc: A, calibration: ThermometerConfig) -> Self {
        Self { adc, calibration }
    }

    /// Convert a raw conversion result to calibrated °C.
    pub fn raw_to_celsius(&self, raw: u16) -> f32 {
        let mv_per_count = self.adc.reference_voltage() * 1000.0 / ADC_FULL_SCALE;
        let millivolts = f32::from(raw) * mv_per_count;
        (millivolts - ZERO_CELSIUS_MV) / MV_PER_CELSIUS + self.calibration.offset_c
    }
}

impl<A: AnalogInput> TemperatureSource for AnalogThermometer<A> {
    type Error = A::Error;

    fn temperature_c(&mut self) -> Result<f32, Self::Error> {
        let raw = self.adc.read_raw()?;
        let temperature = self.raw_to_celsius(raw);
        trace!("[thermometer] raw={} temperature={:.2}°C", raw, temperature);
        if temperature > self.calibration.overheat_warning_c {
            warn!(
                "[thermometer] {:.1}°C exceeds {:.1}°C, \
                 check that the sensor selector is in the TEMP position",
                temperature,
                self.calibration.overheat_warning_c
            );
        }
        Ok(temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeAdc {
        raw: Result<u16, &'static str>,
        reference: f32,
    }

    impl AnalogInput for FakeAdc {
        type Error = &'static str;

        fn read_raw(&mut self) -> Result<u16, Self::Error> {
            self.raw
        }

        fn reference_voltage(&self) -> f32 {
            self.reference
        }
    }

    fn uncalibrated() -> ThermometerConfig {
        ThermometerConfig {
            offset_c: 0.0,
            ..ThermometerConfig::default()
        }
    }

    #[test]
    fn converts_millivolts_to_celsius() {
        // 750 mV on a 3.3 V reference.
        let raw = (0.75 / 3.3 * 65535.0f32).round() as u16;
        let mut thermometer = AnalogThermometer::with_calibration(
            FakeAdc {
                raw: Ok(raw),
                reference: 3.3,
            },
            uncalibrated(),
        );
        let t = thermometer.temperature_c().unwrap();
        assert!((t - 25.0).abs() < 0.01, "got {t}");
    }

    #[test]
    fn applies_default_offset() {
        let raw = (0.75 / 3.3 * 65535.0f32).round() as u16;
        let mut thermometer = AnalogThermometer::new(FakeAdc {
            raw: Ok(raw),
            reference: 3.3,
        });
        let t = thermometer.temperature_c().unwrap();
        assert!((t - 23.0).abs() < 0.01, "got {t}");
    }

    #[test]
    fn overheat_reading_is_still_reported() {
        let mut thermometer = AnalogThermometer::with_calibration(
            FakeAdc {
                raw: Ok(u16::MAX),
                reference: 3.3,
            },
            uncalibrated(),
        );
        let t = thermometer.temperature_c().unwrap();
        assert!((t - 280.0).abs() < 0.01, "got {t}");
    }

    #[test]
    fn adc_failure_propagates() {
        let mut thermometer = AnalogThermometer::new(FakeAdc {
            raw: Err("adc busy"),
            reference: 3.3,
        });
        assert_eq!(thermometer.temperature_c(), Err("adc busy"));
    }

    #[test]
    fn fixed_temperature_never_fails() {
        let mut source = FixedTemperature(18.5);
        assert_eq!(source.temperature_c(), Ok(18.5));
    }
}
