//! Time abstraction so job/document timestamps are deterministic in tests.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of wall-clock time for everything that needs `now()`.
///
/// Injected rather than called directly (`Utc::now()`) so executors,
/// the scheduler, and storage writers can be driven by a fake clock in
/// tests without sleeping real time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn epoch_ms(&self) -> u64 {
        self.now().timestamp_millis().max(0) as u64
    }
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests. Starts at the Unix epoch and only
/// advances when told to.
pub struct FakeClock {
    millis: AtomicI64,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            millis: AtomicI64::new(0),
        }
    }

    pub fn at(epoch_ms: i64) -> Self {
        Self {
            millis: AtomicI64::new(epoch_ms),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        self.millis
            .fetch_add(duration.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn set(&self, epoch_ms: i64) {
        self.millis.store(epoch_ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
