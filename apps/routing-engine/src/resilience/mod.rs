//! Resilience Layer
//!
//! Rate limiting, broken-connection classification and the guard that
//! composes them around provider calls. Keyed state lives behind injectable
//! store traits so deployments can swap the in-memory defaults for a shared
//! cache.

pub mod clock;
pub mod connection;
pub mod guard;
pub mod rate_limiter;

pub use clock::{Clock, SystemClock};
pub use connection::{
    is_broken_connection, repair_action, ConnectionHealthStore, ConnectionMonitor,
};
pub use guard::ProviderGuard;
pub use rate_limiter::{LimitDecision, RateLimitState, RateLimitStore, RateLimiter};

use std::sync::Arc;
use std::time::Duration;

/// Spawn the periodic rate-limit state sweeper.
///
/// Runs forever; callers hold the `JoinHandle` only to abort on shutdown.
pub fn spawn_sweeper(
    rate_limiter: Arc<RateLimiter>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = rate_limiter.sweep();
            if evicted > 0 {
                tracing::info!(evicted, "Rate-limit sweeper pass complete");
            }
        }
    })
}
