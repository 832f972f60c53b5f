//! Clock abstraction so rate-limit windows are testable without sleeping.

use std::time::Instant;

use chrono::{DateTime, Utc};

/// Source of time for the resilience layer.
///
/// `now` drives window arithmetic (monotonic); `wall_now` is only needed to
/// interpret HTTP-date `Retry-After` headers.
pub trait Clock: Send + Sync {
    /// Monotonic now.
    fn now(&self) -> Instant;

    /// Wall-clock now.
    fn wall_now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[cfg(test)]
pub mod test_support {
    use super::{Clock, DateTime, Instant, Utc};
    use std::sync::Mutex;
    use std::time::Duration;

    /// A clock that only moves when told to.
    pub struct ManualClock {
        start: Instant,
        wall_start: DateTime<Utc>,
        elapsed: Mutex<Duration>,
    }

    impl ManualClock {
        /// Create a clock pinned to the current instant.
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
                wall_start: Utc::now(),
                elapsed: Mutex::new(Duration::ZERO),
            }
        }

        /// Advance the clock.
        pub fn advance(&self, by: Duration) {
            *self.elapsed.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.elapsed.lock().unwrap()
        }

        fn wall_now(&self) -> DateTime<Utc> {
            self.wall_start
                + chrono::Duration::from_std(*self.elapsed.lock().unwrap())
                    .unwrap_or_else(|_| chrono::Duration::zero())
        }
    }
}
