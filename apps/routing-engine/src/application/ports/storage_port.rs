//! Portfolio Store Port (Driven Port)
//!
//! Interface for the persistence collaborator: holdings, connected accounts,
//! trade records and the activity log. Schema and ORM mechanics live behind
//! this boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::domain::positions::AccountHolding;
use crate::domain::shared::{TradeId, UserId};
use crate::domain::trading::{ConnectedAccount, Trade, TradeStatus};

/// Storage port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The backing store is unreachable or the write failed.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type.
        entity: String,
        /// Entity identifier.
        id: String,
    },
}

/// One structured activity-log entry. Every trade attempt, success or
/// failure, produces one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// User the activity belongs to.
    pub user_id: UserId,
    /// Activity kind (e.g. `trade_executed`, `trade_failed`).
    pub kind: String,
    /// Structured metadata: symbol, quantity, side, brokerage, trade id.
    pub metadata: serde_json::Value,
}

/// Port for portfolio persistence.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PortfolioStorePort: Send + Sync {
    /// All holdings across the user's connected accounts.
    async fn holdings(&self, user_id: &UserId) -> Result<Vec<AccountHolding>, StorageError>;

    /// The user's connected brokerage accounts.
    async fn connected_accounts(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConnectedAccount>, StorageError>;

    /// Persist a new trade record.
    async fn create_trade(&self, trade: &Trade) -> Result<(), StorageError>;

    /// Move a trade to a new status, stamping the execution time when given.
    async fn update_trade_status(
        &self,
        trade_id: &TradeId,
        status: TradeStatus,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError>;

    /// Append an activity-log entry.
    async fn log_activity(&self, entry: ActivityEntry) -> Result<(), StorageError>;
}
