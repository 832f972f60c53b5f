//! Routing Engine Binary
//!
//! Starts a fully in-memory routing engine, seeds a demo user with two
//! connected brokerages, then aggregates positions and executes one trade.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p routing-engine
//! ```
//!
//! # Environment Variables
//!
//! - `ROUTING_ENGINE_CONFIG`: optional path to a YAML config file
//! - `ROUTING_ENGINE_*`: per-field overrides (e.g.
//!   `ROUTING_ENGINE_RATE_LIMIT__MAX_REQUESTS`)
//! - `RUST_LOG`: log level (default: info)

use anyhow::Context;
use rust_decimal::Decimal;

use routing_engine::infrastructure::InMemoryContainer;
use routing_engine::resilience::spawn_sweeper;
use routing_engine::{
    AccountHolding, AccountId, AssetClass, AuthorizationId, BrokerageAuthorization, BrokerageId,
    BrokerageInfo, ConnectedAccount, EngineConfig, ExecutionSpeed, Money, OrderType, Quantity,
    Specialization, Symbol, TradeSide, TradingRequest, UserId,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    routing_engine::telemetry::init_tracing();

    let config_path = std::env::var("ROUTING_ENGINE_CONFIG").ok();
    let config = EngineConfig::load(config_path.as_deref()).context("loading configuration")?;
    tracing::info!(
        window_secs = config.rate_limit.window_secs,
        max_requests = config.rate_limit.max_requests,
        "Routing engine starting"
    );

    let sweep_interval = config.sweeper.interval();
    let (container, registry) = InMemoryContainer::in_memory(config);
    let sweeper = spawn_sweeper(container.rate_limiter(), sweep_interval);

    let user_id = UserId::new("demo-user");
    seed_demo_data(&container, &registry, &user_id);

    let positions = container
        .aggregate_positions_use_case()
        .execute(&user_id)
        .await?;
    for position in &positions {
        tracing::info!(
            symbol = %position.symbol,
            quantity = %position.total_quantity.amount(),
            average_price = %position.average_price,
            gain_loss_pct = %position.gain_loss_percentage,
            "Aggregated position"
        );
    }

    let request = TradingRequest {
        user_id: user_id.clone(),
        symbol: Symbol::new("BTC-USD"),
        quantity: Quantity::new(Decimal::new(5, 2)),
        side: TradeSide::Buy,
        order_type: OrderType::Limit,
        limit_price: Some(Money::from_cents(4_500_000)),
        brokerage_id: None,
    };
    match container.execute_trade_use_case().execute(&request).await {
        Ok(trade) => tracing::info!(
            trade_id = %trade.id,
            brokerage_id = %trade.brokerage_id,
            status = %trade.status,
            total = %trade.total_amount,
            "Trade settled"
        ),
        Err(error) => tracing::error!(%error, "Trade failed"),
    }

    sweeper.abort();
    Ok(())
}

/// Seed a demo user: two connected brokerages, a crypto-specialized venue,
/// some holdings and a funded wallet.
fn seed_demo_data(
    container: &InMemoryContainer,
    registry: &routing_engine::InMemoryConnectionRegistry,
    user_id: &UserId,
) {
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

    for (brokerage, balance) in [("alpaca", 12_000_00), ("coinbase", 8_000_00)] {
        store.add_account(
            user_id,
            ConnectedAccount {
                account_id: AccountId::new(format!("acct-{brokerage}")),
                brokerage_id: BrokerageId::new(brokerage),
                authorization_id: AuthorizationId::new(format!("auth-{brokerage}")),
                balance: Money::from_cents(balance),
            },
        );
        registry.insert(BrokerageAuthorization {
            id: AuthorizationId::new(format!("auth-{brokerage}")),
            user_id: user_id.clone(),
            brokerage_id: BrokerageId::new(brokerage),
            brokerage_slug: brokerage.to_string(),
        });
    }

    store.add_holding(
        user_id,
        AccountHolding {
            account_id: AccountId::new("acct-alpaca"),
            brokerage_id: BrokerageId::new("alpaca"),
            symbol: Symbol::new("AAPL"),
            quantity: Quantity::from_i64(10),
            average_price: Money::from_cents(18_000),
            current_price: Money::from_cents(19_500),
            gain_loss: Money::from_cents(15_000),
        },
    );
    store.add_holding(
        user_id,
        AccountHolding {
            account_id: AccountId::new("acct-coinbase"),
            brokerage_id: BrokerageId::new("coinbase"),
            symbol: Symbol::new("BTC-USD"),
            quantity: Quantity::new(Decimal::new(25, 2)),
            average_price: Money::from_cents(4_000_000),
            current_price: Money::from_cents(4_500_000),
            gain_loss: Money::from_cents(125_000),
        },
    );

    container.wallet().credit(user_id, Money::from_cents(5_000_00));
}
