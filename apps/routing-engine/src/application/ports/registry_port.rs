//! Connection Registry Port (Driven Port)
//!
//! Lookup of brokerage authorization metadata, used when building repair
//! prompts for broken connections.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::application::ports::storage_port::StorageError;
use crate::domain::provider::BrokerageAuthorization;
use crate::domain::shared::AuthorizationId;

/// Port for authorization metadata lookups.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConnectionRegistryPort: Send + Sync {
    /// Find the authorization record, or `None` when it does not exist.
    async fn find_authorization(
        &self,
        authorization_id: &AuthorizationId,
    ) -> Result<Option<BrokerageAuthorization>, StorageError>;
}
