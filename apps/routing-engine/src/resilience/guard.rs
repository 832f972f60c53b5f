//! Composition of rate limiting and broken-connection handling around
//! provider calls.
//!
//! Call sites wrap each outbound provider operation once and get the full
//! resilience policy: admission control and 429 retries from the limiter,
//! then broken-connection classification on whatever failure remains.

use std::future::Future;
use std::sync::Arc;

use crate::domain::provider::ProviderError;
use crate::domain::shared::AuthorizationId;
use crate::error::EngineError;
use crate::resilience::connection::ConnectionMonitor;
use crate::resilience::rate_limiter::RateLimiter;

/// Wraps provider calls with the resilience policy.
pub struct ProviderGuard {
    rate_limiter: Arc<RateLimiter>,
    monitor: Arc<ConnectionMonitor>,
}

impl ProviderGuard {
    /// Create a guard over the shared limiter and connection monitor.
    pub fn new(rate_limiter: Arc<RateLimiter>, monitor: Arc<ConnectionMonitor>) -> Self {
        Self {
            rate_limiter,
            monitor,
        }
    }

    /// The underlying rate limiter, for sweeper wiring.
    #[must_use]
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Run a provider operation with broken-connection classification only.
    ///
    /// On failure the error is classified; broken-connection signatures are
    /// recorded against `authorization_id` and surfaced as
    /// [`EngineError::BrokenConnection`] with a repair prompt. Everything
    /// else passes through as [`EngineError::Provider`].
    pub async fn call<T, Fut>(
        &self,
        authorization_id: &AuthorizationId,
        context: &str,
        op: Fut,
    ) -> Result<T, EngineError>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        match op.await {
            Ok(value) => Ok(value),
            Err(error) => Err(self.classify(error, authorization_id, context).await),
        }
    }

    /// Run a provider operation under the rate limiter, then classify any
    /// remaining failure.
    ///
    /// Rate limiting applies per `key` (typically `user:brokerage`); 429s are
    /// retried inside the limiter. A failure that survives the limiter is
    /// classified exactly like [`Self::call`].
    pub async fn call_with_rate_limit<T, F, Fut>(
        &self,
        key: &str,
        authorization_id: &AuthorizationId,
        context: &str,
        op: F,
    ) -> Result<T, EngineError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        match self.rate_limiter.fetch_with_rate_limit(key, op).await {
            Ok(value) => Ok(value),
            Err(EngineError::Provider(error)) => {
                Err(self.classify(error, authorization_id, context).await)
            }
            Err(other) => Err(other),
        }
    }

    async fn classify(
        &self,
        error: ProviderError,
        authorization_id: &AuthorizationId,
        context: &str,
    ) -> EngineError {
        match self
            .monitor
            .handle_broken_connection(&error, authorization_id, context)
            .await
        {
            Some(repair) => EngineError::BrokenConnection {
                repair,
                source: error,
            },
            None => {
                tracing::error!(
                    authorization_id = %authorization_id,
                    context,
                    error = %error,
                    "Provider call failed"
                );
                EngineError::Provider(error)
            }
        }
    }
}
