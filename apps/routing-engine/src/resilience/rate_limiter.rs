//! Per-key rate limiting with explicit retry-after tracking.
//!
//! Fixed-window admission control (default 60s / 100 requests per key) plus
//! a retry-after deadline installed from provider 429 responses. While a
//! deadline is active every call on that key is rejected, regardless of
//! window state.
//!
//! # Backoff
//!
//! When a 429 arrives without a usable `Retry-After` header the delay is
//! `min(max_delay, base * 2^attempt) + jitter[0, jitter_max)` where `attempt`
//! is the key's current observed request count.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::DateTime;
use rand::Rng;

use crate::config::{BackoffConfig, RateLimitConfig};
use crate::domain::provider::ProviderError;
use crate::error::EngineError;
use crate::resilience::clock::Clock;

/// Exponent cap so `base * 2^attempt` cannot overflow for busy keys.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Per-key admission state.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitState {
    /// When the current window opened.
    pub window_started_at: Instant,
    /// Last admitted or counted request.
    pub last_request_at: Instant,
    /// Requests observed in the current window.
    pub request_count: u32,
    /// Active rejection deadline, if any.
    pub retry_after_until: Option<Instant>,
}

impl RateLimitState {
    /// Fresh state for a key's first observation.
    #[must_use]
    pub const fn new(now: Instant) -> Self {
        Self {
            window_started_at: now,
            last_request_at: now,
            request_count: 1,
            retry_after_until: None,
        }
    }
}

/// Injectable keyed store for rate-limit state.
///
/// The in-memory implementation suits a single instance; a shared cache
/// implementation keeps limits coherent across instances.
pub trait RateLimitStore: Send + Sync {
    /// Current state for a key.
    fn get(&self, key: &str) -> Option<RateLimitState>;
    /// Replace the state for a key.
    fn put(&self, key: &str, state: RateLimitState);
    /// Drop a key.
    fn remove(&self, key: &str);
    /// All tracked keys.
    fn keys(&self) -> Vec<String>;
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitDecision {
    /// Whether the call must not proceed right now.
    pub limited: bool,
    /// Whole seconds until the caller should try again.
    pub retry_after_secs: Option<u64>,
}

impl LimitDecision {
    /// The call may proceed.
    #[must_use]
    pub const fn admitted() -> Self {
        Self {
            limited: false,
            retry_after_secs: None,
        }
    }

    /// The call is rejected for `secs` seconds.
    #[must_use]
    pub const fn rejected(secs: u64) -> Self {
        Self {
            limited: true,
            retry_after_secs: Some(secs),
        }
    }
}

/// Per-key sliding-window rate limiter with 429 handling.
pub struct RateLimiter {
    store: Box<dyn RateLimitStore>,
    clock: Box<dyn Clock>,
    window: Duration,
    max_requests: u32,
    backoff: BackoffConfig,
    // Serializes read-modify-write against the store; each operation must
    // mutate a key's state in one uninterrupted step.
    op_lock: Mutex<()>,
}

impl RateLimiter {
    /// Create a limiter over an injectable store and clock.
    #[must_use]
    pub fn new(
        store: Box<dyn RateLimitStore>,
        clock: Box<dyn Clock>,
        rate_limit: &RateLimitConfig,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            store,
            clock,
            window: rate_limit.window(),
            max_requests: rate_limit.max_requests,
            backoff,
            op_lock: Mutex::new(()),
        }
    }

    /// Check whether a call on `key` is admitted right now.
    ///
    /// First observation of a key initializes its window and admits. An
    /// active retry-after deadline rejects irrespective of window state.
    /// Otherwise the fixed window applies: elapsed windows reset, and the
    /// call is rejected once the count exceeds the cap, installing a
    /// retry-after equal to the window's remaining time.
    pub fn should_limit(&self, key: &str) -> LimitDecision {
        let _guard = self.op_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = self.clock.now();

        let Some(mut state) = self.store.get(key) else {
            self.store.put(key, RateLimitState::new(now));
            return LimitDecision::admitted();
        };

        if let Some(until) = state.retry_after_until {
            if until > now {
                return LimitDecision::rejected(secs_until(now, until));
            }
        }

        if now.duration_since(state.window_started_at) >= self.window {
            // Window elapsed: fresh window, clear any expired deadline.
            self.store.put(key, RateLimitState::new(now));
            return LimitDecision::admitted();
        }

        state.request_count += 1;
        state.last_request_at = now;

        if state.request_count > self.max_requests {
            let until = state.window_started_at + self.window;
            state.retry_after_until = Some(until);
            let secs = secs_until(now, until);
            self.store.put(key, state);
            tracing::warn!(key, request_count = state.request_count, retry_after_secs = secs, "Rate limit cap reached");
            return LimitDecision::rejected(secs);
        }

        self.store.put(key, state);
        LimitDecision::admitted()
    }

    /// React to a provider 429 on `key`.
    ///
    /// The `Retry-After` header is honored when parseable (integer seconds or
    /// an HTTP date); otherwise exponential backoff with jitter applies, with
    /// the key's current observed request count as the attempt number. The
    /// deadline is persisted so subsequent [`Self::should_limit`] calls reject.
    /// Returns the delay in whole seconds.
    pub fn handle_429(
        &self,
        key: &str,
        retry_after_header: Option<&str>,
        remaining_header: Option<&str>,
    ) -> u64 {
        let _guard = self.op_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = self.clock.now();

        if let Some(remaining) = remaining_header {
            tracing::debug!(key, remaining, "Provider rate-limit budget");
        }

        let mut state = self
            .store
            .get(key)
            .unwrap_or_else(|| RateLimitState::new(now));

        let delay = retry_after_header
            .and_then(|value| parse_retry_after(value, self.clock.wall_now()))
            .unwrap_or_else(|| self.backoff_delay(state.request_count));

        state.retry_after_until = Some(now + delay);
        self.store.put(key, state);

        let secs = delay.as_secs();
        tracing::warn!(key, retry_after_secs = secs, "Provider returned 429; deadline installed");
        secs
    }

    /// Exponential backoff with uniform jitter for a given attempt number.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let base = self
            .backoff
            .base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.backoff.max_delay_ms);
        let jitter = rand::rng().random_range(0..self.backoff.jitter_ms.max(1));
        Duration::from_millis(base + jitter)
    }

    /// Evict keys whose state is older than twice the window and past any
    /// retry deadline. Housekeeping only; correctness never depends on it.
    pub fn sweep(&self) -> usize {
        let _guard = self.op_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = self.clock.now();
        let stale_after = self.window * 2;
        let mut evicted = 0;

        for key in self.store.keys() {
            if let Some(state) = self.store.get(&key) {
                let stale = now.duration_since(state.last_request_at) >= stale_after;
                let past_deadline = state.retry_after_until.is_none_or(|until| now >= until);
                if stale && past_deadline {
                    self.store.remove(&key);
                    evicted += 1;
                }
            }
        }

        if evicted > 0 {
            tracing::debug!(evicted, "Swept stale rate-limit state");
        }
        evicted
    }

    /// Run an operation under the limiter, retrying 429s with backoff.
    ///
    /// Before each attempt the call sleeps out any active limit on `key`.
    /// 429-shaped failures install a new deadline and retry up to the
    /// configured cap, after which [`EngineError::RateLimited`] is surfaced
    /// with the latest retry-after hint. Any other failure propagates
    /// immediately, unretried.
    pub async fn fetch_with_rate_limit<T, F, Fut>(&self, key: &str, op: F) -> Result<T, EngineError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let decision = self.should_limit(key);
            if let (true, Some(secs)) = (decision.limited, decision.retry_after_secs) {
                tracing::debug!(key, retry_after_secs = secs, "Sleeping out rate limit");
                tokio::time::sleep(Duration::from_secs(secs)).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_rate_limited() => {
                    let remaining = error.requests_remaining.map(|r| r.to_string());
                    let delay_secs = self.handle_429(
                        key,
                        error.retry_after.as_deref(),
                        remaining.as_deref(),
                    );
                    if attempt >= self.backoff.max_retries {
                        return Err(EngineError::RateLimited {
                            retry_after_secs: delay_secs,
                        });
                    }
                    attempt += 1;
                    tracing::warn!(key, attempt, delay_secs, "Retrying rate-limited call");
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                }
                Err(error) => return Err(EngineError::Provider(error)),
            }
        }
    }
}

/// Whole seconds from `now` until `until`, rounded up.
fn secs_until(now: Instant, until: Instant) -> u64 {
    let remaining = until.saturating_duration_since(now);
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}

/// Parse a `Retry-After` header value: integer seconds or an HTTP date.
fn parse_retry_after(value: &str, wall_now: DateTime<chrono::Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let date = DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()?;
    let delta = date.with_timezone(&chrono::Utc) - wall_now;
    u64::try_from(delta.num_seconds())
        .ok()
        .map(Duration::from_secs)
}
