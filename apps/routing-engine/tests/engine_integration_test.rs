//! Engine Integration Tests
//!
//! End-to-end flows through the in-memory container: aggregation, routing,
//! trade execution with funds holds, and broken-connection repair prompts.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use routing_engine::infrastructure::InMemoryContainer;
use routing_engine::{
    AccountHolding, AccountId, AssetClass, AuthorizationId, BrokerageAuthorization, BrokerageId,
    BrokerageInfo, ConnectedAccount, Container, EngineConfig, EngineError, ExecutionPort,
    ExecutionSpeed, InMemoryBrokerageCatalog, InMemoryConnectionRegistry, InMemoryPortfolioStore,
    InMemoryWallet, Money, OrderType, ProviderError, Quantity, RepairAction, RoutingError,
    Specialization, Symbol, Trade, TradeSide, TradeStatus, TradingRequest, UserId,
};

fn user() -> UserId {
    UserId::new("user-1")
}

fn seed(container: &InMemoryContainer, registry: &InMemoryConnectionRegistry, balance_cents: i64) {
    let store = container.store();
    let catalog = container.catalog();

    catalog.register(BrokerageInfo {
        id: BrokerageId::new("alpaca"),
        name: "Alpaca".to_string(),
        supported_assets: vec![AssetClass::Stock, AssetClass::Etf, AssetClass::Crypto],
        specialization: Some(Specialization::TraditionalEquities),
        execution_speed: ExecutionSpeed::Instant,
    });
    catalog.register(BrokerageInfo {
        id: BrokerageId::new("coinbase"),
        name: "Coinbase".to_string(),
        supported_assets: vec![AssetClass::Crypto],
        specialization: Some(Specialization::Crypto),
        execution_speed: ExecutionSpeed::Fast,
    });

    for brokerage in ["alpaca", "coinbase"] {
        store.add_account(
            &user(),
            ConnectedAccount {
                account_id: AccountId::new(format!("acct-{brokerage}")),
                brokerage_id: BrokerageId::new(brokerage),
                authorization_id: AuthorizationId::new(format!("auth-{brokerage}")),
                balance: Money::from_cents(10_000_00),
            },
        );
        registry.insert(BrokerageAuthorization {
            id: AuthorizationId::new(format!("auth-{brokerage}")),
            user_id: user(),
            brokerage_id: BrokerageId::new(brokerage),
            brokerage_slug: brokerage.to_string(),
        });
    }

    container.wallet().credit(&user(), Money::from_cents(balance_cents));
}

fn stock_request(qty: i64) -> TradingRequest {
    TradingRequest {
        user_id: user(),
        symbol: Symbol::new("AAPL"),
        quantity: Quantity::from_i64(qty),
        side: TradeSide::Buy,
        order_type: OrderType::Limit,
        limit_price: Some(Money::from_cents(15_000)),
        brokerage_id: None,
    }
}

#[tokio::test]
async fn trade_executes_end_to_end_and_releases_the_hold() {
    let (container, registry) = InMemoryContainer::in_memory(EngineConfig::default());
    seed(&container, &registry, 5_000_00);

    let trade = container
        .execute_trade_use_case()
        .execute(&stock_request(10))
        .await
        .unwrap();

    assert_eq!(trade.status, TradeStatus::Filled);
    assert_eq!(trade.brokerage_id, BrokerageId::new("alpaca"));
    // 10 * 150 = 1500 notional, fee 0.99 + 1500*0.005 = 8.49
    assert_eq!(trade.total_amount, Money::new(dec!(1508.49)));

    let store = container.store();
    let stored = store.trade(&trade.id).unwrap();
    assert_eq!(stored.status, TradeStatus::Filled);
    assert!(stored.executed_at.is_some());

    // Hold released: balance is back to its seeded value, nothing outstanding
    let wallet = container.wallet();
    assert_eq!(wallet.balance(&user()), Money::from_cents(5_000_00));
    assert_eq!(wallet.outstanding_holds(), 0);

    let activity = store.activity_log();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].kind, "trade_executed");
    assert_eq!(activity[0].metadata["symbol"], "AAPL");
    assert_eq!(activity[0].metadata["side"], "buy");
    assert_eq!(
        activity[0].metadata["trade_id"],
        serde_json::json!(trade.id)
    );
}

#[tokio::test]
async fn crypto_order_routes_to_the_specialist() {
    let (container, registry) = InMemoryContainer::in_memory(EngineConfig::default());
    seed(&container, &registry, 100_000_00);

    let request = TradingRequest {
        user_id: user(),
        symbol: Symbol::new("BTC-USD"),
        quantity: Quantity::new(Decimal::new(1, 1)),
        side: TradeSide::Buy,
        order_type: OrderType::Limit,
        limit_price: Some(Money::from_cents(1_000_00)),
        brokerage_id: None,
    };
    let decision = container
        .route_trade_use_case()
        .execute(&request)
        .await
        .unwrap();

    // Equal balances and fees; Coinbase's +25 specialization beats Alpaca's
    // +10 speed edge (instant 20 vs fast 10).
    assert_eq!(decision.brokerage_id, BrokerageId::new("coinbase"));
    assert_eq!(decision.execution_time, ExecutionSpeed::Fast);
}

#[tokio::test]
async fn insufficient_funds_aborts_without_a_trade_record() {
    let (container, registry) = InMemoryContainer::in_memory(EngineConfig::default());
    seed(&container, &registry, 10_00);

    let result = container
        .execute_trade_use_case()
        .execute(&stock_request(10))
        .await;

    assert!(matches!(result, Err(EngineError::FundsUnavailable { .. })));
    // The rejected attempt is still recorded, with no trade id since no
    // trade record was created.
    let activity = container.store().activity_log();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].kind, "trade_failed");
    assert!(activity[0].metadata["trade_id"].is_null());
    assert_eq!(activity[0].metadata["brokerage_id"], "alpaca");
    assert_eq!(container.wallet().balance(&user()), Money::from_cents(10_00));
    assert_eq!(container.wallet().outstanding_holds(), 0);
}

#[tokio::test]
async fn requested_incompatible_brokerage_fails_before_funds() {
    let (container, registry) = InMemoryContainer::in_memory(EngineConfig::default());
    seed(&container, &registry, 5_000_00);

    let request = TradingRequest {
        symbol: Symbol::new("AAPL"),
        brokerage_id: Some(BrokerageId::new("coinbase")),
        ..stock_request(1)
    };
    let result = container.execute_trade_use_case().execute(&request).await;

    assert!(matches!(
        result,
        Err(EngineError::Routing(
            RoutingError::RequestedIncompatible { .. }
        ))
    ));
    assert_eq!(
        container.wallet().balance(&user()),
        Money::from_cents(5_000_00)
    );
    // Routing rejections are recorded against the requested brokerage.
    let activity = container.store().activity_log();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].kind, "trade_failed");
    assert!(activity[0].metadata["trade_id"].is_null());
    assert_eq!(activity[0].metadata["brokerage_id"], "coinbase");
}

#[tokio::test]
async fn positions_aggregate_across_brokerages() {
    let (container, registry) = InMemoryContainer::in_memory(EngineConfig::default());
    seed(&container, &registry, 0);

    let store = container.store();
    for (brokerage, qty, avg) in [("alpaca", 10, 100_00), ("coinbase", 30, 120_00)] {
        store.add_holding(
            &user(),
            AccountHolding {
                account_id: AccountId::new(format!("acct-{brokerage}")),
                brokerage_id: BrokerageId::new(brokerage),
                symbol: Symbol::new("AAPL"),
                quantity: Quantity::from_i64(qty),
                average_price: Money::from_cents(avg),
                current_price: Money::from_cents(110_00),
                gain_loss: Money::ZERO,
            },
        );
    }

    let positions = container
        .aggregate_positions_use_case()
        .execute(&user())
        .await
        .unwrap();

    assert_eq!(positions.len(), 1);
    let position = &positions[0];
    assert_eq!(position.total_quantity.amount(), dec!(40));
    // (10*100 + 30*120) / 40 = 115
    assert_eq!(position.average_price.amount(), dec!(115));
    assert_eq!(position.current_value.amount(), dec!(4400));
    assert_eq!(position.breakdown.len(), 2);
    // basis 4600, value 4400 -> about -4.35%
    assert!(position.gain_loss_percentage < Decimal::ZERO);
}

/// Venue whose provider has revoked the connection.
struct RevokedVenue;

#[async_trait]
impl ExecutionPort for RevokedVenue {
    async fn execute(&self, _trade: &Trade) -> Result<routing_engine::ExecutionReport, ProviderError> {
        Err(ProviderError::http(401, "token expired").with_code("TOKEN_EXPIRED"))
    }
}

#[tokio::test]
async fn broken_connection_yields_repair_prompt_and_releases_hold() {
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let container = Container::new(
        Arc::new(InMemoryPortfolioStore::new()),
        Arc::new(InMemoryBrokerageCatalog::new()),
        Arc::new(InMemoryWallet::new()),
        Arc::new(RevokedVenue),
        Arc::clone(&registry) as Arc<dyn routing_engine::ConnectionRegistryPort>,
        EngineConfig::default(),
    );

    let store = container.store();
    store.add_account(
        &user(),
        ConnectedAccount {
            account_id: AccountId::new("acct-alpaca"),
            brokerage_id: BrokerageId::new("alpaca"),
            authorization_id: AuthorizationId::new("auth-alpaca"),
            balance: Money::from_cents(10_000_00),
        },
    );
    registry.insert(BrokerageAuthorization {
        id: AuthorizationId::new("auth-alpaca"),
        user_id: user(),
        brokerage_id: BrokerageId::new("alpaca"),
        brokerage_slug: "alpaca".to_string(),
    });
    container.wallet().credit(&user(), Money::from_cents(5_000_00));

    container.catalog().register(BrokerageInfo {
        id: BrokerageId::new("alpaca"),
        name: "Alpaca".to_string(),
        supported_assets: vec![AssetClass::Stock, AssetClass::Etf],
        specialization: None,
        execution_speed: ExecutionSpeed::Instant,
    });

    let result = container
        .execute_trade_use_case()
        .execute(&stock_request(1))
        .await;

    let error = result.unwrap_err();
    let repair = error.repair_info().expect("repair prompt");
    assert_eq!(repair.action, RepairAction::Reauth);
    assert!(repair.url.contains("auth-alpaca"));

    // The rollback ran: hold released, trade marked rejected, failure logged
    assert_eq!(
        container.wallet().balance(&user()),
        Money::from_cents(5_000_00)
    );
    assert_eq!(container.wallet().outstanding_holds(), 0);
    let activity = store.activity_log();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].kind, "trade_failed");
}
