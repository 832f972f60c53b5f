//! Application Ports (Driven)
//!
//! Ports define interfaces for the external collaborators the engine
//! consumes: the wallet, the portfolio store, the brokerage catalog, the
//! connection registry and the execution venue. Adapters live in
//! `infrastructure`.

mod catalog_port;
mod execution_port;
mod registry_port;
mod storage_port;
mod wallet_port;

pub use catalog_port::BrokerageCatalogPort;
pub use execution_port::{ExecutionPort, ExecutionReport};
pub use registry_port::ConnectionRegistryPort;
pub use storage_port::{ActivityEntry, PortfolioStorePort, StorageError};
pub use wallet_port::{WalletError, WalletPort};

#[cfg(test)]
pub use catalog_port::MockBrokerageCatalogPort;
#[cfg(test)]
pub use execution_port::MockExecutionPort;
#[cfg(test)]
pub use registry_port::MockConnectionRegistryPort;
#[cfg(test)]
pub use storage_port::MockPortfolioStorePort;
#[cfg(test)]
pub use wallet_port::MockWalletPort;
