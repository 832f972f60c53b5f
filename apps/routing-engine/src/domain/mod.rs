//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure
//! dependencies. This layer defines:
//!
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Positions**: Per-account holdings and their cross-account aggregates
//! - **Trading**: Requests, routing decisions and trade records
//! - **Provider**: The normalized provider error shape and connection health

pub mod assets;
pub mod positions;
pub mod provider;
pub mod shared;
pub mod trading;
