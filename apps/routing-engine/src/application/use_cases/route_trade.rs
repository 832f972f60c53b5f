//! Route Trade Use Case
//!
//! Scores the user's compatible brokerages for a prospective order and picks
//! the best one. Four factors, summed:
//!
//! 1. Fee: `max(0, 100 - estimated_fee)` where
//!    `estimated_fee = base_fee + trade_value * fee_rate`.
//! 2. Balance: `min(50, account_balance / 1000)`, 0 with no account there.
//! 3. Specialization: +25 when the venue specializes in the asset class.
//! 4. Speed: +20 instant, +10 fast, 0 otherwise.
//!
//! Equal scores go to the first brokerage in the catalog's enumeration
//! order. That is a documented policy, and tests rely on it.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::application::ports::{BrokerageCatalogPort, PortfolioStorePort};
use crate::config::RoutingConfig;
use crate::domain::assets::AssetClass;
use crate::domain::shared::{BrokerageId, Money};
use crate::domain::trading::{
    BrokerageInfo, ConnectedAccount, ExecutionSpeed, RoutingDecision, Specialization,
    TradingRequest,
};
use crate::error::{EngineError, RoutingError};

const SPECIALIZATION_BONUS: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
const SPEED_INSTANT_BONUS: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
const SPEED_FAST_BONUS: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
const FEE_SCORE_CEILING: Decimal = Decimal::ONE_HUNDRED;
const BALANCE_SCORE_CAP: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
const BALANCE_SCORE_DIVISOR: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Use case for choosing the brokerage a trade executes at.
pub struct RouteTradeUseCase<S, C>
where
    S: PortfolioStorePort,
    C: BrokerageCatalogPort,
{
    store: Arc<S>,
    catalog: Arc<C>,
    routing: RoutingConfig,
}

impl<S, C> RouteTradeUseCase<S, C>
where
    S: PortfolioStorePort,
    C: BrokerageCatalogPort,
{
    /// Create a new `RouteTradeUseCase`.
    pub fn new(store: Arc<S>, catalog: Arc<C>, routing: RoutingConfig) -> Self {
        Self {
            store,
            catalog,
            routing,
        }
    }

    /// Route a trading request to a brokerage.
    ///
    /// # Errors
    ///
    /// Returns a [`RoutingError`] (wrapped) for an invalid request, a user
    /// with no connected accounts, an asset no connected brokerage can trade,
    /// or an explicitly requested brokerage that cannot trade it. No funds
    /// are touched on any of these paths.
    pub async fn execute(&self, request: &TradingRequest) -> Result<RoutingDecision, EngineError> {
        request.validate().map_err(RoutingError::InvalidRequest)?;

        let accounts = self.store.connected_accounts(&request.user_id).await?;
        if accounts.is_empty() {
            return Err(RoutingError::NoConnectedAccounts.into());
        }

        let asset = AssetClass::classify(&request.symbol);
        let connected_ids: Vec<BrokerageId> =
            accounts.iter().map(|a| a.brokerage_id.clone()).collect();
        let compatible = self
            .catalog
            .compatible_brokerages(asset, &connected_ids)
            .await?;
        if compatible.is_empty() {
            return Err(RoutingError::NoCompatibleBrokerage { asset }.into());
        }

        let estimated_fee = self.estimate_fee(request.trade_value());

        if let Some(requested) = &request.brokerage_id {
            let info = compatible
                .iter()
                .find(|info| &info.id == requested)
                .ok_or_else(|| RoutingError::RequestedIncompatible {
                    brokerage_id: requested.clone(),
                    asset,
                })?;
            tracing::info!(
                user_id = %request.user_id,
                brokerage_id = %info.id,
                %asset,
                "Routed to requested brokerage"
            );
            return Ok(RoutingDecision {
                brokerage_id: info.id.clone(),
                estimated_fee,
                execution_time: info.execution_speed,
            });
        }

        // First-wins on ties: strict comparison preserves enumeration order.
        let mut best: Option<(&BrokerageInfo, Decimal)> = None;
        for info in &compatible {
            let balance = balance_at(&accounts, &info.id);
            let score = score_brokerage(info, asset, estimated_fee, balance);
            tracing::debug!(brokerage_id = %info.id, %score, "Scored brokerage");
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((info, score));
            }
        }

        // compatible is non-empty, so best is always set
        let (info, score) = best.ok_or(RoutingError::NoCompatibleBrokerage { asset })?;
        tracing::info!(
            user_id = %request.user_id,
            brokerage_id = %info.id,
            %asset,
            %score,
            "Routed by score"
        );
        Ok(RoutingDecision {
            brokerage_id: info.id.clone(),
            estimated_fee,
            execution_time: info.execution_speed,
        })
    }

    /// Fee estimate for a trade value under the configured fee model.
    #[must_use]
    pub fn estimate_fee(&self, trade_value: Money) -> Money {
        Money::new(self.routing.base_fee + trade_value.amount() * self.routing.fee_rate).round()
    }
}

/// Balance of the user's account at a brokerage, zero when none exists.
fn balance_at(accounts: &[ConnectedAccount], brokerage_id: &BrokerageId) -> Money {
    accounts
        .iter()
        .find(|a| &a.brokerage_id == brokerage_id)
        .map_or(Money::ZERO, |a| a.balance)
}

/// Sum of the four routing factors for one brokerage.
fn score_brokerage(
    info: &BrokerageInfo,
    asset: AssetClass,
    estimated_fee: Money,
    balance: Money,
) -> Decimal {
    let fee_score = (FEE_SCORE_CEILING - estimated_fee.amount()).max(Decimal::ZERO);
    let balance_score = (balance.amount() / BALANCE_SCORE_DIVISOR).min(BALANCE_SCORE_CAP);
    let specialization_score = match (asset, info.specialization) {
        (AssetClass::Crypto, Some(Specialization::Crypto)) => SPECIALIZATION_BONUS,
        (AssetClass::Stock | AssetClass::Etf, Some(Specialization::TraditionalEquities)) => {
            SPECIALIZATION_BONUS
        }
        _ => Decimal::ZERO,
    };
    let speed_score = match info.execution_speed {
        ExecutionSpeed::Instant => SPEED_INSTANT_BONUS,
        ExecutionSpeed::Fast => SPEED_FAST_BONUS,
        ExecutionSpeed::Standard => Decimal::ZERO,
    };
    fee_score + balance_score + specialization_score + speed_score
}
