//! Time source abstraction
//!
//! Block expiry is pure time arithmetic, so the throttle reads the current
//! time through a [`Clock`] rather than calling `Utc::now()` directly.
//! Production code uses [`SystemClock`]; tests drive a [`ManualClock`] to make
//! expiry deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// while the throttle under test holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    epoch_millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            epoch_millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// Move the clock forward (or backward, with a negative duration).
    pub fn advance(&self, delta: Duration) {
        self.epoch_millis
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        self.epoch_millis.store(to.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.epoch_millis.load(Ordering::SeqCst))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
