//! Wallet Port (Driven Port)
//!
//! Interface for the funds-hold collaborator. Holds reserve cash while a
//! trade is in flight; release is idempotent so rollback paths can never
//! double-free.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::shared::{HoldId, Money, UserId};
use crate::domain::trading::FundHold;

/// Wallet port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    /// The user's balance cannot cover the requested hold.
    #[error("Insufficient funds: {required} required")]
    InsufficientFunds {
        /// Amount the hold asked for.
        required: Money,
    },

    /// The hold does not exist (already released holds are not an error).
    #[error("Hold not found: {hold_id}")]
    HoldNotFound {
        /// The missing hold.
        hold_id: HoldId,
    },

    /// The wallet service is unreachable.
    #[error("Wallet unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for funds holds.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletPort: Send + Sync {
    /// Reserve funds for a purpose, returning the hold.
    async fn hold_funds(
        &self,
        user_id: &UserId,
        amount: Money,
        purpose: &str,
    ) -> Result<FundHold, WalletError>;

    /// Release a previously acquired hold. Idempotent on double release.
    async fn release_funds(&self, user_id: &UserId, hold_id: &HoldId) -> Result<(), WalletError>;
}
