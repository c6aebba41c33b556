//! Acquirer for an HC-SR04 style module fronted by an I2C controller.
//!
//! The controller runs the ping itself; the host triggers a conversion,
//! waits for it to settle and reads the result registers back. A distance of
//! zero means the module has not seen an echo (yet), so the acquisition
//! strategies treat it as "no reading" rather than as a real distance.
//!
//! ```
//! use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
//! use ultrasonic_i2c::mock_utils::ManualClock;
//! use ultrasonic_i2c::UltrasonicSensor;
//! use std::time::Duration;
//!
//! let i2c = I2cMock::new(&[
//!     I2cTransaction::write(0x34, vec![0x00]),
//!     I2cTransaction::write_read(0x34, vec![0x01], vec![0x64, 0x00]),
//! ]);
//! let time = ManualClock::new();
//! let mut sensor = UltrasonicSensor::new(i2c, time.clone()).with_clock(time);
//! let d = sensor
//!     .read_blocking_valid(Duration::from_millis(300), Duration::from_millis(120))
//!     .unwrap();
//! assert_eq!(d, 100.0);
//! let (mut i2c, _) = sensor.release();
//! i2c.done();
//! ```

use crate::clock::{Clock, StdClock};
use crate::compensation::{is_physical_temperature, CompensationParams};
use crate::config::sensor_config::validate_address;
use crate::config::{AcquisitionConfig, SensorConfig};
use crate::errors::{ConfigResult, SensorError, SensorResult};
use crate::registers::{decode_u16_le, RawMeasurement, Register, DEFAULT_ADDRESS};
use crate::sensors::temperature::TemperatureSource;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c};
use std::time::Duration;
use tracing::{debug, trace};

/// Transport error of the bus `I2C`.
pub type BusError<I2C> = <I2C as ErrorType>::Error;

/// Outcome of a blocking acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockingReading {
    /// Distance in centimeters, `0.0` if no echo arrived before the deadline.
    pub distance_cm: f32,
    /// Number of trigger/settle/read cycles performed.
    pub attempts: u32,
    /// Set when the deadline passed without a valid echo.
    pub timed_out: bool,
}

impl BlockingReading {
    pub fn is_valid(&self) -> bool {
        self.distance_cm > 0.0
    }
}

/// Outcome of an averaged acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageReading {
    /// Mean of the valid samples, `0.0` when none were valid.
    pub distance_cm: f32,
    pub valid_samples: u32,
    pub samples: u32,
}

/// Ultrasonic distance acquirer.
///
/// Owns the bus handle for its whole life. Every method that triggers a ping
/// also reads its result before returning, so a single owner never sees
/// another ping's echo. Callers that share a module between tasks must wrap
/// it, see [`crate::shared::SharedSensor`].
pub struct UltrasonicSensor<I2C, D, C = StdClock> {
    i2c: I2C,
    delay: D,
    clock: C,
    address: u8,
    config: AcquisitionConfig,
}

impl<I2C, D> UltrasonicSensor<I2C, D, StdClock>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Driver for a module at the default address `0x34`.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            clock: StdClock::new(),
            address: DEFAULT_ADDRESS,
            config: AcquisitionConfig::default(),
        }
    }

    /// Driver for a module strapped to another address.
    pub fn with_address(i2c: I2C, delay: D, address: u8) -> ConfigResult<Self> {
        validate_address(address)?;
        Ok(Self {
            address,
            ..Self::new(i2c, delay)
        })
    }

    /// Driver using the address and acquisition defaults of `config`.
    pub fn from_config(i2c: I2C, delay: D, config: &SensorConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            address: config.address,
            config: config.acquisition,
            ..Self::new(i2c, delay)
        })
    }
}

impl<I2C, D, C> UltrasonicSensor<I2C, D, C>
where
    I2C: I2c,
    D: DelayNs,
    C: Clock,
{
    /// Replace the clock that bounds blocking reads.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> UltrasonicSensor<I2C, D, C2> {
        UltrasonicSensor {
            i2c: self.i2c,
            delay: self.delay,
            clock,
            address: self.address,
            config: self.config,
        }
    }

    /// Replace the acquisition defaults used by the convenience readers.
    pub fn with_acquisition_config(mut self, config: AcquisitionConfig) -> ConfigResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn acquisition_config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Release the bus and delay handles, consuming the driver.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Start a ping. The command register address is the whole message.
    pub fn trigger(&mut self) -> SensorResult<(), BusError<I2C>> {
        trace!("[ultrasonic@{:#04x}] trigger", self.address);
        self.i2c
            .write(self.address, &[Register::Command.into()])
            .map_err(SensorError::Transport)
    }

    /// Last distance held by the module, in centimeters.
    ///
    /// Without a preceding [`trigger`](Self::trigger) this is stale or zero.
    pub fn read_distance_cm(&mut self) -> SensorResult<f32, BusError<I2C>> {
        let raw = self.read_register(Register::Distance)?;
        Ok(f32::from(raw))
    }

    /// Last echo pulse width held by the module, in microseconds.
    pub fn read_duration_us(&mut self) -> SensorResult<u16, BusError<I2C>> {
        self.read_register(Register::Duration)
    }

    /// Trigger, wait `settle` and read both result registers.
    pub fn measure(&mut self, settle: Duration) -> SensorResult<RawMeasurement, BusError<I2C>> {
        self.trigger()?;
        self.settle(settle);
        let distance_cm = self.read_register(Register::Distance)?;
        let duration_us = self.read_register(Register::Duration)?;
        Ok(RawMeasurement {
            distance_cm,
            duration_us,
        })
    }

    /// Ping until the module reports a non-zero distance or `timeout` has
    /// elapsed.
    ///
    /// Running out of time is not an error: the call returns `0.0`, which
    /// callers treat as "nothing in range". Use
    /// [`read_blocking_valid_detailed`](Self::read_blocking_valid_detailed)
    /// to tell a timeout apart explicitly. Bus failures abort immediately.
    pub fn read_blocking_valid(
        &mut self,
        timeout: Duration,
        settle: Duration,
    ) -> SensorResult<f32, BusError<I2C>> {
        self.read_blocking_valid_detailed(timeout, settle)
            .map(|reading| reading.distance_cm)
    }

    /// Like [`read_blocking_valid`](Self::read_blocking_valid), also reporting
    /// how many pings it took and whether the deadline was hit.
    pub fn read_blocking_valid_detailed(
        &mut self,
        timeout: Duration,
        settle: Duration,
    ) -> SensorResult<BlockingReading, BusError<I2C>> {
        let deadline = self.clock.now().saturating_add(timeout);
        let mut attempts = 0u32;
        loop {
            let distance_cm = self.sample(settle)?;
            attempts = attempts.saturating_add(1);
            if distance_cm > 0.0 {
                debug!(
                    "[ultrasonic@{:#04x}] {:.1} cm after {} attempt(s)",
                    self.address, distance_cm, attempts
                );
                return Ok(BlockingReading {
                    distance_cm,
                    attempts,
                    timed_out: false,
                });
            }
            if self.clock.now() >= deadline {
                debug!(
                    "[ultrasonic@{:#04x}] no echo within {:?} ({} attempt(s))",
                    self.address, timeout, attempts
                );
                return Ok(BlockingReading {
                    distance_cm: 0.0,
                    attempts,
                    timed_out: true,
                });
            }
        }
    }

    /// Mean of the non-zero distances among `samples` pings, `0.0` if none.
    pub fn average_valid(
        &mut self,
        samples: u32,
        settle: Duration,
    ) -> SensorResult<f32, BusError<I2C>> {
        self.average_valid_detailed(samples, settle)
            .map(|reading| reading.distance_cm)
    }

    /// Like [`average_valid`](Self::average_valid), also reporting how many
    /// samples were usable.
    pub fn average_valid_detailed(
        &mut self,
        samples: u32,
        settle: Duration,
    ) -> SensorResult<AverageReading, BusError<I2C>> {
        let mut total = 0.0f64;
        let mut valid_samples = 0u32;
        for _ in 0..samples {
            let distance_cm = self.sample(settle)?;
            if distance_cm > 0.0 {
                total += f64::from(distance_cm);
                valid_samples += 1;
            }
        }
        let distance_cm = if valid_samples > 0 {
            (total / f64::from(valid_samples)) as f32
        } else {
            0.0
        };
        debug!(
            "[ultrasonic@{:#04x}] average {:.2} cm from {}/{} sample(s)",
            self.address, distance_cm, valid_samples, samples
        );
        Ok(AverageReading {
            distance_cm,
            valid_samples,
            samples,
        })
    }

    /// One blocking reading (configured timeout) corrected for an air
    /// temperature of `temperature_c` against `baseline_c`.
    ///
    /// A baseline at which the speed of sound would not be positive is
    /// rejected with [`SensorError::InvalidBaseline`] before the module is
    /// pinged.
    pub fn compensated_distance_cm(
        &mut self,
        temperature_c: f32,
        baseline_c: f32,
        settle: Duration,
    ) -> SensorResult<f32, BusError<I2C>> {
        if !is_physical_temperature(baseline_c) {
            return Err(SensorError::InvalidBaseline { baseline_c });
        }
        let params = CompensationParams::new(temperature_c, baseline_c);
        let distance_cm = self.read_blocking_valid(self.config.timeout(), settle)?;
        let corrected = params.apply(distance_cm);
        debug!(
            "[ultrasonic@{:#04x}] {:.2} cm at {:.1}°C -> {:.2} cm",
            self.address, distance_cm, temperature_c, corrected
        );
        Ok(corrected)
    }

    /// Query `source` for the air temperature, then behave like
    /// [`compensated_distance_cm`](Self::compensated_distance_cm).
    pub fn compensated_distance_from<T: TemperatureSource>(
        &mut self,
        source: &mut T,
        baseline_c: f32,
        settle: Duration,
    ) -> SensorResult<f32, BusError<I2C>> {
        let temperature_c =
            source
                .temperature_c()
                .map_err(|e| SensorError::TemperatureSource {
                    reason: format!("{e:?}"),
                })?;
        self.compensated_distance_cm(temperature_c, baseline_c, settle)
    }

    /// Blocking reading with the configured timeout and settle time.
    pub fn distance_cm(&mut self) -> SensorResult<f32, BusError<I2C>> {
        self.read_blocking_valid(self.config.timeout(), self.config.settle())
    }

    /// Averaged reading with the configured sample count and settle time.
    pub fn average_distance_cm(&mut self) -> SensorResult<f32, BusError<I2C>> {
        self.average_valid(self.config.average_samples, self.config.average_settle())
    }

    /// Compensated reading against the configured baseline temperature.
    pub fn temperature_compensated_cm(
        &mut self,
        temperature_c: f32,
    ) -> SensorResult<f32, BusError<I2C>> {
        self.compensated_distance_cm(
            temperature_c,
            self.config.baseline_temperature_c,
            self.config.settle(),
        )
    }

    // One trigger/settle/read cycle.
    fn sample(&mut self, settle: Duration) -> SensorResult<f32, BusError<I2C>> {
        self.trigger()?;
        self.settle(settle);
        self.read_distance_cm()
    }

    fn settle(&mut self, settle: Duration) {
        let micros = u32::try_from(settle.as_micros()).unwrap_or(u32::MAX);
        self.delay.delay_us(micros);
    }

    fn read_register(&mut self, register: Register) -> SensorResult<u16, BusError<I2C>> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register.into()], &mut buffer)
            .map_err(SensorError::Transport)?;
        let value = decode_u16_le(buffer);
        trace!(
            "[ultrasonic@{:#04x}] {:?} = {}",
            self.address,
            register,
            value
        );
        Ok(value)
    }
}
