//! Injectable monotonic time source.
//!
//! Every TTL check, backoff delay, and tie-break ordering in the router and
//! evolution engine reads time through this trait instead of calling
//! `Instant::now()` directly, so tests can advance a fake clock instead of
//! sleeping.

use std::time::{Duration, Instant};

/// A monotonic clock.
pub trait Clock: Send + Sync {
    /// Current instant as seen by this clock.
    fn now(&self) -> Instant;
}

/// Real wall-clock time, backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests: starts at an arbitrary epoch and only
/// moves forward when told to.
pub struct FakeClock {
    inner: parking_lot::Mutex<Instant>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            inner: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Advance the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut guard = self.inner.lock();
        *guard += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.inner.lock()
    }
}
