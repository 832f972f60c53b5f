//! Persistence Adapters

mod in_memory;

pub use in_memory::{
    InMemoryBrokerageCatalog, InMemoryConnectionHealthStore, InMemoryConnectionRegistry,
    InMemoryPortfolioStore, InMemoryRateLimitStore, InMemoryWallet,
};
