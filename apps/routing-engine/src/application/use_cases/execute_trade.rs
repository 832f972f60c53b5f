//! Execute Trade Use Case
//!
//! Orchestrates a full trade attempt:
//! route, hold funds, persist a pending trade, execute, settle.
//!
//! The correctness invariant: once a funds hold is acquired, it is released
//! exactly once on every exit path, success or failure. Release failures on
//! rollback paths are logged and swallowed so the original error is the one
//! that propagates.

use std::sync::Arc;

use serde_json::json;

use crate::application::ports::{
    ActivityEntry, BrokerageCatalogPort, ExecutionPort, PortfolioStorePort, WalletError, WalletPort,
};
use crate::application::use_cases::RouteTradeUseCase;
use crate::domain::shared::{BrokerageId, HoldId, UserId};
use crate::domain::trading::{ConnectedAccount, Trade, TradeStatus, TradingRequest};
use crate::error::EngineError;
use crate::resilience::ProviderGuard;

/// Hold purpose recorded with every trading reservation.
const HOLD_PURPOSE: &str = "trading";

/// Use case for executing a routed trade end to end.
pub struct ExecuteTradeUseCase<S, C, W, X>
where
    S: PortfolioStorePort,
    C: BrokerageCatalogPort,
    W: WalletPort,
    X: ExecutionPort,
{
    router: Arc<RouteTradeUseCase<S, C>>,
    store: Arc<S>,
    wallet: Arc<W>,
    execution: Arc<X>,
    guard: Arc<ProviderGuard>,
}

impl<S, C, W, X> ExecuteTradeUseCase<S, C, W, X>
where
    S: PortfolioStorePort,
    C: BrokerageCatalogPort,
    W: WalletPort,
    X: ExecutionPort,
{
    /// Create a new `ExecuteTradeUseCase`.
    pub fn new(
        router: Arc<RouteTradeUseCase<S, C>>,
        store: Arc<S>,
        wallet: Arc<W>,
        execution: Arc<X>,
        guard: Arc<ProviderGuard>,
    ) -> Self {
        Self {
            router,
            store,
            wallet,
            execution,
            guard,
        }
    }

    /// Execute a trading request.
    ///
    /// # Errors
    ///
    /// Routing failures surface before any funds are touched. A rejected
    /// hold surfaces as [`EngineError::FundsUnavailable`] with no trade
    /// record created. Failures after the hold release it before the error
    /// propagates. Every attempt leaves an activity entry; failures before
    /// a trade record exists log one without a trade id.
    pub async fn execute(&self, request: &TradingRequest) -> Result<Trade, EngineError> {
        // 1. Route. Incompatibility aborts here, nothing held.
        let decision = match self.router.execute(request).await {
            Ok(decision) => decision,
            Err(error) => {
                self.log_rejected_attempt(request, request.brokerage_id.as_ref())
                    .await;
                return Err(error);
            }
        };

        let accounts = match self.store.connected_accounts(&request.user_id).await {
            Ok(accounts) => accounts,
            Err(error) => {
                self.log_rejected_attempt(request, Some(&decision.brokerage_id))
                    .await;
                return Err(error.into());
            }
        };
        let Some(account) = accounts
            .iter()
            .find(|a| a.brokerage_id == decision.brokerage_id)
            .cloned()
        else {
            self.log_rejected_attempt(request, Some(&decision.brokerage_id))
                .await;
            return Err(crate::application::ports::StorageError::NotFound {
                entity: "account".to_string(),
                id: decision.brokerage_id.to_string(),
            }
            .into());
        };

        // 2. Hold funds for notional plus fees.
        let total = request.trade_value() + decision.estimated_fee;
        let hold = match self
            .wallet
            .hold_funds(&request.user_id, total, HOLD_PURPOSE)
            .await
        {
            Ok(hold) => hold,
            Err(source) => {
                self.log_rejected_attempt(request, Some(&decision.brokerage_id))
                    .await;
                return Err(match source {
                    WalletError::InsufficientFunds { .. } => {
                        EngineError::FundsUnavailable { source }
                    }
                    other => EngineError::Wallet(other),
                });
            }
        };
        tracing::info!(
            user_id = %request.user_id,
            hold_id = %hold.hold_id,
            amount = %total,
            "Funds held"
        );

        // 3. Persist a pending trade. From here on, every failure releases
        //    the hold before propagating.
        let trade = Trade::pending(
            request,
            account.account_id.clone(),
            decision.brokerage_id.clone(),
            request.sizing_price(),
            total,
        );
        if let Err(e) = self.store.create_trade(&trade).await {
            self.release_hold(&request.user_id, &hold.hold_id).await;
            self.log_attempt(&trade, "trade_failed").await;
            return Err(e.into());
        }

        // 4. Execute at the brokerage, rate limited and classified.
        let key = format!("{}:{}", request.user_id, decision.brokerage_id);
        let result = self.execute_at_venue(&key, &account, &trade).await;

        match result {
            Ok(report) => {
                if let Err(e) = self
                    .store
                    .update_trade_status(&trade.id, TradeStatus::Filled, Some(report.executed_at))
                    .await
                {
                    tracing::error!(trade_id = %trade.id, error = %e, "Failed to mark trade filled");
                }
                self.release_hold(&request.user_id, &hold.hold_id).await;
                self.log_attempt(&trade, "trade_executed").await;

                let mut filled = trade;
                filled.status = TradeStatus::Filled;
                filled.price = report.fill_price;
                filled.executed_at = Some(report.executed_at);
                tracing::info!(
                    trade_id = %filled.id,
                    brokerage_id = %filled.brokerage_id,
                    fill_price = %report.fill_price,
                    "Trade filled"
                );
                Ok(filled)
            }
            Err(error) => {
                if let Err(e) = self
                    .store
                    .update_trade_status(&trade.id, TradeStatus::Rejected, None)
                    .await
                {
                    tracing::error!(trade_id = %trade.id, error = %e, "Failed to mark trade rejected");
                }
                self.release_hold(&request.user_id, &hold.hold_id).await;
                self.log_attempt(&trade, "trade_failed").await;
                Err(error)
            }
        }
    }

    async fn execute_at_venue(
        &self,
        key: &str,
        account: &ConnectedAccount,
        trade: &Trade,
    ) -> Result<crate::application::ports::ExecutionReport, EngineError> {
        let execution = Arc::clone(&self.execution);
        self.guard
            .call_with_rate_limit(key, &account.authorization_id, "trade execution", move || {
                let execution = Arc::clone(&execution);
                let trade = trade.clone();
                async move { execution.execute(&trade).await }
            })
            .await
    }

    /// Best-effort release; failures are logged, never propagated, so the
    /// caller's error (if any) survives.
    async fn release_hold(&self, user_id: &UserId, hold_id: &HoldId) {
        if let Err(e) = self.wallet.release_funds(user_id, hold_id).await {
            tracing::error!(user_id = %user_id, hold_id = %hold_id, error = %e, "Failed to release hold");
        }
    }

    /// Append a structured activity entry. Best-effort.
    async fn log_attempt(&self, trade: &Trade, kind: &str) {
        let entry = ActivityEntry {
            user_id: trade.user_id.clone(),
            kind: kind.to_string(),
            metadata: json!({
                "symbol": trade.symbol,
                "quantity": trade.quantity,
                "side": trade.side,
                "brokerage_id": trade.brokerage_id,
                "trade_id": trade.id,
            }),
        };
        if let Err(e) = self.store.log_activity(entry).await {
            tracing::error!(trade_id = %trade.id, error = %e, "Failed to log activity");
        }
    }

    /// Activity entry for attempts rejected before any trade record exists
    /// (routing failure, missing account, rejected hold). The trade id is
    /// null; the brokerage is whichever one was decided, if any. Best-effort.
    async fn log_rejected_attempt(
        &self,
        request: &TradingRequest,
        brokerage_id: Option<&BrokerageId>,
    ) {
        let entry = ActivityEntry {
            user_id: request.user_id.clone(),
            kind: "trade_failed".to_string(),
            metadata: json!({
                "symbol": request.symbol,
                "quantity": request.quantity,
                "side": request.side,
                "brokerage_id": brokerage_id,
                "trade_id": serde_json::Value::Null,
            }),
        };
        if let Err(e) = self.store.log_activity(entry).await {
            tracing::error!(user_id = %request.user_id, error = %e, "Failed to log activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        ExecutionReport, MockBrokerageCatalogPort, MockConnectionRegistryPort, MockExecutionPort,
        MockPortfolioStorePort, MockWalletPort, StorageError,
    };
    use crate::config::{BackoffConfig, RateLimitConfig, RoutingConfig};
    use crate::domain::assets::AssetClass;
    use crate::domain::provider::ProviderError;
    use crate::domain::shared::{AccountId, AuthorizationId, BrokerageId, Money, Quantity, Symbol};
    use crate::domain::trading::{
        BrokerageInfo, ExecutionSpeed, FundHold, OrderType, TradeSide,
    };
    use crate::infrastructure::persistence::{
        InMemoryConnectionHealthStore, InMemoryRateLimitStore,
    };
    use crate::resilience::clock::SystemClock;
    use crate::resilience::{ConnectionMonitor, RateLimiter};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn request() -> TradingRequest {
        TradingRequest {
            user_id: UserId::new("user-1"),
            symbol: Symbol::new("AAPL"),
            quantity: Quantity::from_i64(10),
            side: TradeSide::Buy,
            order_type: OrderType::Market,
            limit_price: None,
            brokerage_id: None,
        }
    }

    fn account() -> ConnectedAccount {
        ConnectedAccount {
            account_id: AccountId::new("acct-1"),
            brokerage_id: BrokerageId::new("alpaca"),
            authorization_id: AuthorizationId::new("auth-1"),
            balance: Money::new(dec!(10000)),
        }
    }

    fn brokerage() -> BrokerageInfo {
        BrokerageInfo {
            id: BrokerageId::new("alpaca"),
            name: "Alpaca".to_string(),
            supported_assets: vec![AssetClass::Stock, AssetClass::Etf],
            specialization: None,
            execution_speed: ExecutionSpeed::Instant,
        }
    }

    fn hold() -> FundHold {
        FundHold {
            hold_id: HoldId::new("hold-1"),
            amount: Money::new(dec!(1005.99)),
            purpose: HOLD_PURPOSE.to_string(),
        }
    }

    fn guard() -> Arc<ProviderGuard> {
        let mut registry = MockConnectionRegistryPort::new();
        registry.expect_find_authorization().returning(|_| Ok(None));
        let limiter = RateLimiter::new(
            Box::new(InMemoryRateLimitStore::new()),
            Box::new(SystemClock),
            &RateLimitConfig::default(),
            BackoffConfig::default(),
        );
        let monitor = ConnectionMonitor::new(
            Box::new(InMemoryConnectionHealthStore::new()),
            Arc::new(registry),
        );
        Arc::new(ProviderGuard::new(Arc::new(limiter), Arc::new(monitor)))
    }

    struct Fixture {
        store: MockPortfolioStorePort,
        wallet: MockWalletPort,
        execution: MockExecutionPort,
    }

    impl Fixture {
        fn new() -> Self {
            let mut store = MockPortfolioStorePort::new();
            store
                .expect_connected_accounts()
                .returning(|_| Ok(vec![account()]));
            store.expect_log_activity().returning(|_| Ok(()));
            Self {
                store,
                wallet: MockWalletPort::new(),
                execution: MockExecutionPort::new(),
            }
        }

        fn build(
            self,
        ) -> ExecuteTradeUseCase<
            MockPortfolioStorePort,
            MockBrokerageCatalogPort,
            MockWalletPort,
            MockExecutionPort,
        > {
            let mut catalog = MockBrokerageCatalogPort::new();
            catalog
                .expect_compatible_brokerages()
                .returning(|_, _| Ok(vec![brokerage()]));
            let store = Arc::new(self.store);
            let router = Arc::new(RouteTradeUseCase::new(
                Arc::clone(&store),
                Arc::new(catalog),
                RoutingConfig::default(),
            ));
            ExecuteTradeUseCase::new(
                router,
                store,
                Arc::new(self.wallet),
                Arc::new(self.execution),
                guard(),
            )
        }
    }

    #[tokio::test]
    async fn create_trade_failure_releases_the_hold_exactly_once() {
        let mut fixture = Fixture::new();
        fixture
            .wallet
            .expect_hold_funds()
            .times(1)
            .returning(|_, _, _| Ok(hold()));
        fixture
            .wallet
            .expect_release_funds()
            .times(1)
            .returning(|_, _| Ok(()));
        fixture.store.expect_create_trade().returning(|_| {
            Err(StorageError::Unavailable {
                message: "db down".to_string(),
            })
        });
        fixture.execution.expect_execute().times(0);

        let result = fixture.build().execute(&request()).await;
        assert!(matches!(result, Err(EngineError::Storage(_))));
    }

    #[tokio::test]
    async fn filled_trade_releases_hold_and_carries_fill_price() {
        let mut fixture = Fixture::new();
        fixture
            .wallet
            .expect_hold_funds()
            .times(1)
            .returning(|_, _, _| Ok(hold()));
        fixture
            .wallet
            .expect_release_funds()
            .times(1)
            .returning(|_, _| Ok(()));
        fixture.store.expect_create_trade().returning(|_| Ok(()));
        fixture
            .store
            .expect_update_trade_status()
            .withf(|_, status, executed_at| {
                *status == TradeStatus::Filled && executed_at.is_some()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        fixture.execution.expect_execute().returning(|_| {
            Ok(ExecutionReport {
                fill_price: Money::new(dec!(101.50)),
                executed_at: Utc::now(),
            })
        });

        let trade = fixture.build().execute(&request()).await.unwrap();
        assert_eq!(trade.status, TradeStatus::Filled);
        assert_eq!(trade.price, Money::new(dec!(101.50)));
        assert!(trade.executed_at.is_some());
    }

    #[tokio::test]
    async fn execution_failure_marks_rejected_and_releases() {
        let mut fixture = Fixture::new();
        fixture
            .wallet
            .expect_hold_funds()
            .times(1)
            .returning(|_, _, _| Ok(hold()));
        fixture
            .wallet
            .expect_release_funds()
            .times(1)
            .returning(|_, _| Ok(()));
        fixture.store.expect_create_trade().returning(|_| Ok(()));
        fixture
            .store
            .expect_update_trade_status()
            .withf(|_, status, _| *status == TradeStatus::Rejected)
            .times(1)
            .returning(|_, _, _| Ok(()));
        fixture
            .execution
            .expect_execute()
            .returning(|_| Err(ProviderError::http(500, "venue rejected the order")));

        let result = fixture.build().execute(&request()).await;
        assert!(matches!(result, Err(EngineError::Provider(_))));
    }

    #[tokio::test]
    async fn rejected_hold_creates_no_trade_record() {
        let mut fixture = Fixture::new();
        fixture.wallet.expect_hold_funds().times(1).returning(|_, amount, _| {
            Err(WalletError::InsufficientFunds { required: amount })
        });
        fixture.wallet.expect_release_funds().times(0);
        fixture.store.expect_create_trade().times(0);
        fixture.execution.expect_execute().times(0);

        let result = fixture.build().execute(&request()).await;
        assert!(matches!(result, Err(EngineError::FundsUnavailable { .. })));
    }

    #[tokio::test]
    async fn rejected_hold_logs_a_failed_attempt_without_a_trade_id() {
        let mut store = MockPortfolioStorePort::new();
        store
            .expect_connected_accounts()
            .returning(|_| Ok(vec![account()]));
        store
            .expect_log_activity()
            .withf(|entry| {
                entry.kind == "trade_failed"
                    && entry.metadata["trade_id"].is_null()
                    && entry.metadata["brokerage_id"] == "alpaca"
            })
            .times(1)
            .returning(|_| Ok(()));
        store.expect_create_trade().times(0);
        let mut wallet = MockWalletPort::new();
        wallet.expect_hold_funds().times(1).returning(|_, amount, _| {
            Err(WalletError::InsufficientFunds { required: amount })
        });

        let mut catalog = MockBrokerageCatalogPort::new();
        catalog
            .expect_compatible_brokerages()
            .returning(|_, _| Ok(vec![brokerage()]));
        let store = Arc::new(store);
        let router = Arc::new(RouteTradeUseCase::new(
            Arc::clone(&store),
            Arc::new(catalog),
            RoutingConfig::default(),
        ));
        let use_case = ExecuteTradeUseCase::new(
            router,
            store,
            Arc::new(wallet),
            Arc::new(MockExecutionPort::new()),
            guard(),
        );

        let result = use_case.execute(&request()).await;
        assert!(matches!(result, Err(EngineError::FundsUnavailable { .. })));
    }

    #[tokio::test]
    async fn routing_failure_touches_no_funds() {
        let mut store = MockPortfolioStorePort::new();
        store.expect_connected_accounts().returning(|_| Ok(vec![]));
        // The rejected attempt still leaves a trade_failed entry, with no
        // trade id since no record was ever created.
        store
            .expect_log_activity()
            .withf(|entry| entry.kind == "trade_failed" && entry.metadata["trade_id"].is_null())
            .times(1)
            .returning(|_| Ok(()));
        let mut wallet = MockWalletPort::new();
        wallet.expect_hold_funds().times(0);

        let mut catalog = MockBrokerageCatalogPort::new();
        catalog
            .expect_compatible_brokerages()
            .returning(|_, _| Ok(vec![]));
        let store = Arc::new(store);
        let router = Arc::new(RouteTradeUseCase::new(
            Arc::clone(&store),
            Arc::new(catalog),
            RoutingConfig::default(),
        ));
        let use_case = ExecuteTradeUseCase::new(
            router,
            store,
            Arc::new(wallet),
            Arc::new(MockExecutionPort::new()),
            guard(),
        );

        let result = use_case.execute(&request()).await;
        assert!(matches!(result, Err(EngineError::Routing(_))));
    }
}
