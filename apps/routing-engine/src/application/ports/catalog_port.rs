//! Brokerage Catalog Port (Driven Port)
//!
//! Compatibility lookup: which of the user's connected brokerages can trade
//! a given asset class.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::application::ports::storage_port::StorageError;
use crate::domain::assets::AssetClass;
use crate::domain::shared::BrokerageId;
use crate::domain::trading::BrokerageInfo;

/// Port for brokerage compatibility lookups.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BrokerageCatalogPort: Send + Sync {
    /// The subset of `connected` brokerages that can trade `asset`, with
    /// their metadata, in the catalog's stable enumeration order.
    async fn compatible_brokerages(
        &self,
        asset: AssetClass,
        connected: &[BrokerageId],
    ) -> Result<Vec<BrokerageInfo>, StorageError>;
}
