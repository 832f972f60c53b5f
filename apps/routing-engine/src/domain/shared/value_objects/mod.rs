//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod money;
mod quantity;
mod symbol;

pub use identifiers::{AccountId, AuthorizationId, BrokerageId, HoldId, TradeId, UserId};
pub use money::Money;
pub use quantity::Quantity;
pub use symbol::Symbol;
