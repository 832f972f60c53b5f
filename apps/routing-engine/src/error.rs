//! Error taxonomy for the routing engine.
//!
//! Five families of failure, with distinct retry policy:
//!
//! | Error | Retried | Funds touched |
//! |-------|---------|---------------|
//! | `Routing` (incompatibility) | never | no |
//! | `FundsUnavailable` | never | no (hold rejected) |
//! | `RateLimited` | bounded backoff | n/a |
//! | `BrokenConnection` | never (repair prompt instead) | n/a |
//! | `Provider` (unclassified) | never | n/a |
//!
//! Fund holds acquired before a failure are released on every path; that is
//! enforced by the execution orchestrator, not by this module.

use thiserror::Error;

use crate::application::ports::{StorageError, WalletError};
use crate::domain::assets::AssetClass;
use crate::domain::provider::{ProviderError, RepairInfo};
use crate::domain::shared::{BrokerageId, DomainError};

/// Routing failures. Surfaced verbatim, never retried, and always before any
/// funds are touched.
#[derive(Debug, Clone, Error)]
pub enum RoutingError {
    /// The user has no connected brokerage accounts at all.
    #[error("No connected brokerage accounts")]
    NoConnectedAccounts,

    /// None of the connected brokerages can trade the asset class.
    #[error("No connected brokerage supports {asset} trading")]
    NoCompatibleBrokerage {
        /// Asset class of the request.
        asset: AssetClass,
    },

    /// A specific brokerage was requested but cannot trade the asset class.
    #[error("Brokerage {brokerage_id} cannot trade {asset} assets")]
    RequestedIncompatible {
        /// The requested brokerage.
        brokerage_id: BrokerageId,
        /// Asset class of the request.
        asset: AssetClass,
    },

    /// The request itself is malformed.
    #[error(transparent)]
    InvalidRequest(#[from] DomainError),
}

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Routing failed; nothing was held or persisted.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// The wallet rejected the funds hold; no trade record was created.
    #[error("Funds unavailable: {source}")]
    FundsUnavailable {
        /// The wallet rejection.
        #[source]
        source: WalletError,
    },

    /// The provider rate limited the call and retries were exhausted.
    #[error("Provider rate limited; retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the limit clears.
        retry_after_secs: u64,
    },

    /// The brokerage connection is broken and needs user repair.
    #[error("Brokerage connection broken: {}", repair.message)]
    BrokenConnection {
        /// Structured repair prompt.
        repair: RepairInfo,
        /// The provider failure that revealed the break.
        #[source]
        source: ProviderError,
    },

    /// Wallet failure outside the hold-rejection path.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Persistence failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Unclassified provider failure, surfaced after logging.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl EngineError {
    /// Returns true for errors the caller may retry after a delay.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The repair prompt, for broken-connection errors.
    #[must_use]
    pub const fn repair_info(&self) -> Option<&RepairInfo> {
        match self {
            Self::BrokenConnection { repair, .. } => Some(repair),
            _ => None,
        }
    }
}
