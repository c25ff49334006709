//! Time source used by the edge timer.
//!
//! Pulse timing needs two things: a monotonic timestamp and a way to wait
//! between polls. Real hardware uses [`SystemClock`]; tests use
//! [`ManualClock`], whose `sleep` moves virtual time forward instantly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Current monotonic timestamp
    fn now(&self) -> Instant;

    /// Wait for `duration` before the next poll
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::time::Instant` and `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock that only advances when someone sleeps on it.
///
/// Clones share the same timeline, so a scripted sensor and the edge timer
/// polling it always agree on what time it is.
///
/// # Example
/// ```
/// use rain_gauge_lib::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.sleep(Duration::from_millis(10));
/// assert_eq!(clock.now() - start, Duration::from_millis(10));
/// ```
#[derive(Clone, Debug)]
pub struct ManualClock {
    base: Instant,
    elapsed_micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed_micros: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move virtual time forward without sleeping
    pub fn advance(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.elapsed_micros.fetch_add(micros, Ordering::SeqCst);
    }

    /// Virtual time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_micros.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
