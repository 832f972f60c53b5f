//! Rate Limiter Public API Tests
//!
//! Exercises the limiter through the crate's public surface with the
//! in-memory store and the real clock. Window-expiry timing is covered by
//! unit tests with a manual clock.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use routing_engine::config::{BackoffConfig, RateLimitConfig};
use routing_engine::resilience::clock::SystemClock;
use routing_engine::{EngineError, InMemoryRateLimitStore, ProviderError, RateLimiter};

fn limiter() -> RateLimiter {
    RateLimiter::new(
        Box::new(InMemoryRateLimitStore::new()),
        Box::new(SystemClock),
        &RateLimitConfig::default(),
        BackoffConfig::default(),
    )
}

#[test]
fn call_101_is_limited_within_one_window() {
    let limiter = limiter();

    for call in 1..=100 {
        let decision = limiter.should_limit("user-1:alpaca");
        assert!(!decision.limited, "call {call} should be admitted");
    }

    let decision = limiter.should_limit("user-1:alpaca");
    assert!(decision.limited);
    assert!(decision.retry_after_secs.unwrap() > 0);
}

#[test]
fn explicit_retry_after_header_installs_a_deadline() {
    let limiter = limiter();

    let secs = limiter.handle_429("user-1:alpaca", Some("120"), Some("0"));
    assert_eq!(secs, 120);

    let decision = limiter.should_limit("user-1:alpaca");
    assert!(decision.limited);
    let remaining = decision.retry_after_secs.unwrap();
    assert!((119..=120).contains(&remaining), "remaining={remaining}");
}

#[tokio::test]
async fn non_rate_limit_errors_are_never_retried() {
    let limiter = limiter();

    let result: Result<(), EngineError> = limiter
        .fetch_with_rate_limit("user-1:alpaca", || async {
            Err(ProviderError::http(500, "internal"))
        })
        .await;

    assert!(matches!(result, Err(EngineError::Provider(_))));
}
