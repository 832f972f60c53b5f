//! Trading domain types: requests, trades, routing decisions and brokerage
//! metadata.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::assets::AssetClass;
use crate::domain::shared::{
    AccountId, AuthorizationId, BrokerageId, DomainError, HoldId, Money, Quantity, Symbol, TradeId,
    UserId,
};

/// Fallback per-share price used to size market orders before a fill price
/// is known. Limit orders use their limit price instead.
pub const DEFAULT_MARKET_PRICE: Money = Money::new(Decimal::from_parts(100, 0, 0, false, 0));

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    /// Buy shares.
    Buy,
    /// Sell shares.
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute at the market price.
    Market,
    /// Execute at the limit price or better.
    Limit,
}

/// Lifecycle status of a trade record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Persisted, awaiting execution.
    Pending,
    /// Executed and settled.
    Filled,
    /// Cancelled before execution.
    Cancelled,
    /// Rejected by the brokerage or the engine.
    Rejected,
}

impl TradeStatus {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Relative execution latency class of a brokerage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionSpeed {
    /// Sub-second fills.
    Instant,
    /// Typically fills within seconds.
    Fast,
    /// No latency guarantee.
    Standard,
}

/// What a brokerage is best at, used as a routing bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    /// Crypto-native venue.
    Crypto,
    /// Traditional equities and ETFs.
    TraditionalEquities,
}

/// A prospective order, before routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingRequest {
    /// User placing the order.
    pub user_id: UserId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Quantity to trade.
    pub quantity: Quantity,
    /// Buy or sell.
    pub side: TradeSide,
    /// Market or limit.
    pub order_type: OrderType,
    /// Limit price (required for limit orders).
    pub limit_price: Option<Money>,
    /// Pin the order to a specific brokerage instead of letting the router
    /// choose.
    pub brokerage_id: Option<BrokerageId>,
}

impl TradingRequest {
    /// Validate the request fields.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive quantities or limit orders without a
    /// limit price.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.quantity.validate_for_order()?;
        if self.order_type == OrderType::Limit && self.limit_price.is_none() {
            return Err(DomainError::InvalidValue {
                field: "limit_price".to_string(),
                message: "Limit orders require a limit price".to_string(),
            });
        }
        Ok(())
    }

    /// Per-share price used for sizing: the limit price when present,
    /// otherwise the placeholder market price.
    #[must_use]
    pub fn sizing_price(&self) -> Money {
        self.limit_price.unwrap_or(DEFAULT_MARKET_PRICE)
    }

    /// Notional value of the request at the sizing price.
    #[must_use]
    pub fn trade_value(&self) -> Money {
        self.sizing_price() * self.quantity.amount()
    }
}

/// The router's choice of brokerage for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Chosen brokerage.
    pub brokerage_id: BrokerageId,
    /// Fee estimate for the order at that brokerage.
    pub estimated_fee: Money,
    /// Latency class of the chosen brokerage.
    pub execution_time: ExecutionSpeed,
}

/// Static metadata about a brokerage, from the compatibility catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerageInfo {
    /// Brokerage identifier.
    pub id: BrokerageId,
    /// Display name.
    pub name: String,
    /// Asset classes the brokerage can trade.
    pub supported_assets: Vec<AssetClass>,
    /// Specialization bonus category, if any.
    pub specialization: Option<Specialization>,
    /// Latency class.
    pub execution_speed: ExecutionSpeed,
}

/// A user's connected account at one brokerage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    /// Account identifier.
    pub account_id: AccountId,
    /// Brokerage the account lives at.
    pub brokerage_id: BrokerageId,
    /// Authorization that links the account.
    pub authorization_id: AuthorizationId,
    /// Cash balance available for trading.
    pub balance: Money,
}

/// A temporary funds reservation preventing double-spending while a trade is
/// in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundHold {
    /// Wallet-issued hold identifier.
    pub hold_id: HoldId,
    /// Amount reserved.
    pub amount: Money,
    /// Reservation purpose (always "trading" for this engine).
    pub purpose: String,
}

/// A persisted trade record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Trade identifier.
    pub id: TradeId,
    /// Owning user.
    pub user_id: UserId,
    /// Account the trade executes against.
    pub account_id: AccountId,
    /// Brokerage executing the trade.
    pub brokerage_id: BrokerageId,
    /// Symbol traded.
    pub symbol: Symbol,
    /// Buy or sell.
    pub side: TradeSide,
    /// Quantity traded.
    pub quantity: Quantity,
    /// Per-share price used for sizing (fill price after execution).
    pub price: Money,
    /// Notional plus fees.
    pub total_amount: Money,
    /// Market or limit.
    pub order_type: OrderType,
    /// Lifecycle status.
    pub status: TradeStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Execution timestamp, set when filled.
    pub executed_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Create a new pending trade from a routed request.
    #[must_use]
    pub fn pending(
        request: &TradingRequest,
        account_id: AccountId,
        brokerage_id: BrokerageId,
        price: Money,
        total_amount: Money,
    ) -> Self {
        Self {
            id: TradeId::generate(),
            user_id: request.user_id.clone(),
            account_id,
            brokerage_id,
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            price,
            total_amount,
            order_type: request.order_type,
            status: TradeStatus::Pending,
            created_at: Utc::now(),
            executed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn market_request() -> TradingRequest {
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

    #[test]
    fn market_request_uses_placeholder_price() {
        let request = market_request();
        assert_eq!(request.sizing_price(), DEFAULT_MARKET_PRICE);
        assert_eq!(request.trade_value().amount(), dec!(1000));
    }

    #[test]
    fn limit_request_uses_limit_price() {
        let request = TradingRequest {
            order_type: OrderType::Limit,
            limit_price: Some(Money::new(dec!(150))),
            ..market_request()
        };
        assert_eq!(request.trade_value().amount(), dec!(1500));
    }

    #[test]
    fn limit_without_price_is_invalid() {
        let request = TradingRequest {
            order_type: OrderType::Limit,
            ..market_request()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let request = TradingRequest {
            quantity: Quantity::ZERO,
            ..market_request()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn trade_status_terminal() {
        assert!(!TradeStatus::Pending.is_terminal());
        assert!(TradeStatus::Filled.is_terminal());
        assert!(TradeStatus::Cancelled.is_terminal());
        assert!(TradeStatus::Rejected.is_terminal());
    }

    #[test]
    fn pending_trade_from_request() {
        let request = market_request();
        let trade = Trade::pending(
            &request,
            AccountId::new("acct-1"),
            BrokerageId::new("alpaca"),
            Money::new(dec!(100)),
            Money::new(dec!(1005.99)),
        );

        assert_eq!(trade.status, TradeStatus::Pending);
        assert!(trade.executed_at.is_none());
        assert_eq!(trade.symbol, Symbol::new("AAPL"));
    }
}
