// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Routing Engine - Rust Core Library
//!
//! Multi-brokerage trade routing and resilience engine for the Folio
//! platform: position aggregation across connected accounts, scored
//! brokerage selection, funds-hold orchestration around execution, and a
//! resilience layer for provider rate limits and broken connections.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic with no external collaborators
//!   - `assets`: symbol classification (crypto / stock / ETF)
//!   - `positions`: volume-weighted position aggregation
//!   - `trading`: requests, trades, routing decisions, brokerage metadata
//!   - `provider`: normalized provider errors, connection health, repairs
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: `WalletPort`, `PortfolioStorePort`, `BrokerageCatalogPort`,
//!     `ConnectionRegistryPort`, `ExecutionPort`
//!   - `use_cases`: `AggregatePositions`, `RouteTrade`, `ExecuteTrade`
//!
//! - **Resilience**: provider-call policy, shared by all use cases
//!   - `rate_limiter`: per-key fixed windows, 429 handling, backoff
//!   - `connection`: broken-connection classifier and repair prompts
//!   - `guard`: composition wrapper around provider calls
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: in-memory stores for every port
//!   - `execution`: execution venue adapters
//!   - `container`: dependency injection wiring

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Resilience layer - Rate limiting and broken-connection handling.
pub mod resilience;

/// Infrastructure layer - Adapters and dependency wiring.
pub mod infrastructure;

/// Typed configuration.
pub mod config;

/// Engine error taxonomy.
pub mod error;

/// Tracing initialization.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::assets::AssetClass;
pub use domain::positions::{AccountHolding, AggregatedPosition, PositionSlice};
pub use domain::provider::{
    BrokerageAuthorization, ConnectionHealth, ConnectionState, ProviderError, RepairAction,
    RepairInfo,
};
pub use domain::shared::{
    AccountId, AuthorizationId, BrokerageId, HoldId, Money, Quantity, Symbol, TradeId, UserId,
};
pub use domain::trading::{
    BrokerageInfo, ConnectedAccount, ExecutionSpeed, FundHold, OrderType, RoutingDecision,
    Specialization, Trade, TradeSide, TradeStatus, TradingRequest,
};

// Application re-exports
pub use application::ports::{
    ActivityEntry, BrokerageCatalogPort, ConnectionRegistryPort, ExecutionPort, ExecutionReport,
    PortfolioStorePort, StorageError, WalletError, WalletPort,
};
pub use application::use_cases::{
    AggregatePositionsUseCase, ExecuteTradeUseCase, RouteTradeUseCase,
};

// Top-level surfaces
pub use config::EngineConfig;
pub use error::{EngineError, RoutingError};
pub use resilience::{ConnectionMonitor, ProviderGuard, RateLimiter};

// Infrastructure re-exports
pub use infrastructure::execution::ImmediateFillVenue;
pub use infrastructure::persistence::{
    InMemoryBrokerageCatalog, InMemoryConnectionHealthStore, InMemoryConnectionRegistry,
    InMemoryPortfolioStore, InMemoryRateLimitStore, InMemoryWallet,
};
pub use infrastructure::{Container, InMemoryContainer};
