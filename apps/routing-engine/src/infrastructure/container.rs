//! Dependency Injection Container
//!
//! Wires ports, resilience components and use cases together.

use std::sync::Arc;

use crate::application::ports::{
    BrokerageCatalogPort, ConnectionRegistryPort, ExecutionPort, PortfolioStorePort, WalletPort,
};
use crate::application::use_cases::{
    AggregatePositionsUseCase, ExecuteTradeUseCase, RouteTradeUseCase,
};
use crate::config::EngineConfig;
use crate::infrastructure::execution::ImmediateFillVenue;
use crate::infrastructure::persistence::{
    InMemoryBrokerageCatalog, InMemoryConnectionHealthStore, InMemoryConnectionRegistry,
    InMemoryPortfolioStore, InMemoryRateLimitStore, InMemoryWallet,
};
use crate::resilience::clock::SystemClock;
use crate::resilience::{ConnectionMonitor, ProviderGuard, RateLimiter};

/// Container backed entirely by in-memory adapters.
pub type InMemoryContainer = Container<
    InMemoryPortfolioStore,
    InMemoryBrokerageCatalog,
    InMemoryWallet,
    ImmediateFillVenue,
>;

/// Dependency injection container.
///
/// Holds the wired ports and the shared resilience components; use cases are
/// created per call.
pub struct Container<S, C, W, X>
where
    S: PortfolioStorePort + 'static,
    C: BrokerageCatalogPort + 'static,
    W: WalletPort + 'static,
    X: ExecutionPort + 'static,
{
    store: Arc<S>,
    catalog: Arc<C>,
    wallet: Arc<W>,
    execution: Arc<X>,
    guard: Arc<ProviderGuard>,
    rate_limiter: Arc<RateLimiter>,
    config: EngineConfig,
}

impl<S, C, W, X> Container<S, C, W, X>
where
    S: PortfolioStorePort + 'static,
    C: BrokerageCatalogPort + 'static,
    W: WalletPort + 'static,
    X: ExecutionPort + 'static,
{
    /// Create a container from concrete adapters.
    ///
    /// The rate limiter and connection monitor are built here so every use
    /// case shares one instance of each.
    pub fn new(
        store: Arc<S>,
        catalog: Arc<C>,
        wallet: Arc<W>,
        execution: Arc<X>,
        registry: Arc<dyn ConnectionRegistryPort>,
        config: EngineConfig,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            Box::new(InMemoryRateLimitStore::new()),
            Box::new(SystemClock),
            &config.rate_limit,
            config.backoff.clone(),
        ));
        let monitor = Arc::new(ConnectionMonitor::new(
            Box::new(InMemoryConnectionHealthStore::new()),
            registry,
        ));
        let guard = Arc::new(ProviderGuard::new(Arc::clone(&rate_limiter), monitor));

        Self {
            store,
            catalog,
            wallet,
            execution,
            guard,
            rate_limiter,
            config,
        }
    }

    /// The portfolio store.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// The wallet.
    pub fn wallet(&self) -> Arc<W> {
        Arc::clone(&self.wallet)
    }

    /// The brokerage catalog.
    pub fn catalog(&self) -> Arc<C> {
        Arc::clone(&self.catalog)
    }

    /// The shared provider guard.
    pub fn guard(&self) -> Arc<ProviderGuard> {
        Arc::clone(&self.guard)
    }

    /// The shared rate limiter, for sweeper wiring.
    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.rate_limiter)
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create an `AggregatePositionsUseCase`.
    pub fn aggregate_positions_use_case(&self) -> AggregatePositionsUseCase<S> {
        AggregatePositionsUseCase::new(Arc::clone(&self.store))
    }

    /// Create a `RouteTradeUseCase`.
    pub fn route_trade_use_case(&self) -> RouteTradeUseCase<S, C> {
        RouteTradeUseCase::new(
            Arc::clone(&self.store),
            Arc::clone(&self.catalog),
            self.config.routing.clone(),
        )
    }

    /// Create an `ExecuteTradeUseCase`.
    pub fn execute_trade_use_case(&self) -> ExecuteTradeUseCase<S, C, W, X> {
        ExecuteTradeUseCase::new(
            Arc::new(self.route_trade_use_case()),
            Arc::clone(&self.store),
            Arc::clone(&self.wallet),
            Arc::clone(&self.execution),
            Arc::clone(&self.guard),
        )
    }
}

impl InMemoryContainer {
    /// Wire a fully in-memory engine: empty stores, immediate-fill venue.
    ///
    /// The returned registry is shared with the connection monitor, so
    /// authorizations registered on it show up in repair prompts.
    #[must_use]
    pub fn in_memory(config: EngineConfig) -> (Self, Arc<InMemoryConnectionRegistry>) {
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let container = Container::new(
            Arc::new(InMemoryPortfolioStore::new()),
            Arc::new(InMemoryBrokerageCatalog::new()),
            Arc::new(InMemoryWallet::new()),
            Arc::new(ImmediateFillVenue::new()),
            Arc::clone(&registry) as Arc<dyn ConnectionRegistryPort>,
            config,
        );
        (container, registry)
    }
}
