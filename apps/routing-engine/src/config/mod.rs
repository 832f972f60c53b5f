//! Configuration module for the routing engine.
//!
//! Typed configuration with serde defaults for every field, loadable from a
//! YAML file plus `ROUTING_ENGINE_`-prefixed environment overrides.
//!
//! # Usage
//!
//! ```rust,ignore
//! use routing_engine::config::EngineConfig;
//!
//! let config = EngineConfig::load(None)?;
//! println!("window: {:?}", config.rate_limit.window());
//! ```

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse the configuration source.
    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-key rate limiting.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Backoff for 429 responses without a Retry-After header.
    #[serde(default)]
    pub backoff: BackoffConfig,
    /// Stale rate-limit state eviction.
    #[serde(default)]
    pub sweeper: SweeperConfig,
    /// Brokerage routing fee model.
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl EngineConfig {
    /// Load configuration from an optional YAML file and the environment.
    ///
    /// Environment variables use the `ROUTING_ENGINE_` prefix with `__` as
    /// the section separator (e.g. `ROUTING_ENGINE_RATE_LIMIT__MAX_REQUESTS`).
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be parsed, or when a
    /// value fails to deserialize.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("ROUTING_ENGINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Fixed-window rate limit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Maximum admitted requests per key per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

impl RateLimitConfig {
    /// Window length as a `Duration`.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
        }
    }
}

/// Exponential backoff settings for provider 429s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Base delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on the computed delay in milliseconds (jitter may exceed it by at
    /// most one jitter interval).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Upper bound of the uniform jitter in milliseconds.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Retry cap for rate-limited calls.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_retries: default_max_retries(),
        }
    }
}

/// Rate-limit state eviction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// How often the sweeper runs, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub interval_secs: u64,
}

impl SweeperConfig {
    /// Sweep interval as a `Duration`.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Fee model used when scoring brokerages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Flat per-order fee in USD.
    #[serde(default = "default_base_fee")]
    pub base_fee: Decimal,
    /// Fee rate applied to trade value.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            fee_rate: default_fee_rate(),
        }
    }
}

const fn default_window_secs() -> u64 {
    60
}

const fn default_max_requests() -> u32 {
    100
}

const fn default_base_delay_ms() -> u64 {
    1000
}

const fn default_max_delay_ms() -> u64 {
    60_000
}

const fn default_jitter_ms() -> u64 {
    1000
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_base_fee() -> Decimal {
    Decimal::new(99, 2) // $0.99
}

fn default_fee_rate() -> Decimal {
    Decimal::new(5, 3) // 0.5%
}
