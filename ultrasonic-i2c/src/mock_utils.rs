//! Test doubles for the timing collaborators. These are meant for tests and
//! documentation; do not use them in release binaries.

use crate::clock::Clock;
use embedded_hal::delay::DelayNs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Simulated time. Delays return immediately but advance the clock by the
/// requested amount, so deadline logic can be exercised deterministically.
///
/// Clones share the same timeline: hand one clone to the driver as its delay
/// and another as its clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(by, Ordering::SeqCst);
    }

    /// Total simulated time slept so far.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.elapsed()
    }
}

impl DelayNs for ManualClock {
    fn delay_ns(&mut self, ns: u32) {
        self.nanos.fetch_add(u64::from(ns), Ordering::SeqCst);
    }
}
