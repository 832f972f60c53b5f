//! Tracing subscriber setup.
//!
//! Console-only structured logging. Filtering is controlled through
//! `RUST_LOG` (default `info`).
//!
//! # Usage
//!
//! ```rust,ignore
//! use routing_engine::telemetry::init_tracing;
//!
//! fn main() {
//!     init_tracing();
//!     // ... application code
//! }
//! ```

use tracing_subscriber::EnvFilter;

/// Initialize console tracing.
///
/// Safe to call once per process; subsequent calls are ignored so tests can
/// call it freely.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
