//! Sharing one module between async tasks.
//!
//! A ping and the read of its echo must not interleave with another caller's
//! ping, so the acquirer sits behind a mutex and each acquisition holds the
//! lock from trigger to final read. Settle delays block, so acquisitions run
//! on tokio's blocking pool instead of stalling the async workers.

use crate::clock::{Clock, StdClock};
use crate::errors::{SensorError, SensorResult};
use crate::sensors::ultrasonic::{BusError, UltrasonicSensor};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// Cloneable handle to an acquirer shared between tasks.
///
/// Dropping the future of an acquisition (e.g. via `tokio::time::timeout`)
/// stops waiting for it, but a ping already in flight still runs to
/// completion before the lock is released.
pub struct SharedSensor<I2C, D, C = StdClock> {
    inner: Arc<Mutex<UltrasonicSensor<I2C, D, C>>>,
}

impl<I2C, D, C> Clone for SharedSensor<I2C, D, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I2C, D, C> SharedSensor<I2C, D, C>
where
    I2C: I2c + Send + 'static,
    BusError<I2C>: Send + 'static,
    D: DelayNs + Send + 'static,
    C: Clock + Send + 'static,
{
    pub fn new(sensor: UltrasonicSensor<I2C, D, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sensor)),
        }
    }

    /// Run `op` with exclusive access to the acquirer.
    pub async fn acquire<T, F>(&self, op: F) -> SensorResult<T, BusError<I2C>>
    where
        T: Send + 'static,
        F: FnOnce(&mut UltrasonicSensor<I2C, D, C>) -> SensorResult<T, BusError<I2C>>
            + Send
            + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task = tokio::task::spawn_blocking(move || {
            let mut sensor = inner.blocking_lock();
            op(&mut sensor)
        });
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                error!("[ultrasonic] acquisition task failed: {}", e);
                Err(SensorError::Cancelled)
            }
        }
    }

    /// Blocking-valid reading with the acquirer's configured defaults.
    pub async fn distance_cm(&self) -> SensorResult<f32, BusError<I2C>> {
        self.acquire(|sensor| sensor.distance_cm()).await
    }

    /// Averaged reading with the acquirer's configured defaults.
    pub async fn average_distance_cm(&self) -> SensorResult<f32, BusError<I2C>> {
        self.acquire(|sensor| sensor.average_distance_cm()).await
    }

    /// Temperature-compensated reading against the configured baseline.
    pub async fn temperature_compensated_cm(
        &self,
        temperature_c: f32,
    ) -> SensorResult<f32, BusError<I2C>> {
        self.acquire(move |sensor| sensor.temperature_compensated_cm(temperature_c))
            .await
    }

    /// Take the acquirer back once no other handle is left.
    pub fn try_unwrap(self) -> Result<UltrasonicSensor<I2C, D, C>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
