use std::time::{Duration, Instant};

/// Monotonic time source used to bound blocking acquisitions.
pub trait Clock {
    /// Time elapsed since a fixed, arbitrary origin. Never decreases.
    fn now(&self) -> Duration;
}

/// Clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_clock_is_monotonic() {
        let clock = StdClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
