//! Position aggregation across connected accounts.
//!
//! Holdings of the same symbol at different brokerages fold into one
//! [`AggregatedPosition`] carrying a volume-weighted average price and a
//! per-brokerage breakdown.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, BrokerageId, Money, Quantity, Symbol};

/// One per-account lot of a symbol, as reported by the portfolio store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHolding {
    /// Account the lot belongs to.
    pub account_id: AccountId,
    /// Brokerage that holds the lot.
    pub brokerage_id: BrokerageId,
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Number of shares/coins held.
    pub quantity: Quantity,
    /// Cost basis per share for this lot.
    pub average_price: Money,
    /// Latest market price per share.
    pub current_price: Money,
    /// Unrealized gain/loss reported by the provider for this lot.
    pub gain_loss: Money,
}

/// Per-brokerage slice of an aggregated position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSlice {
    /// Brokerage holding this slice.
    pub brokerage_id: BrokerageId,
    /// Quantity held at this brokerage.
    pub quantity: Quantity,
    /// Cost basis per share at this brokerage.
    pub average_price: Money,
}

/// A symbol's holdings folded across every connected account.
///
/// Invariant: `total_quantity` equals the sum of the breakdown quantities,
/// and `average_price` is the quantity-weighted mean cost basis, independent
/// of fold order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedPosition {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Total quantity across all accounts.
    pub total_quantity: Quantity,
    /// Volume-weighted average cost basis per share.
    pub average_price: Money,
    /// Market value at current prices.
    pub current_value: Money,
    /// Accumulated unrealized gain/loss.
    pub gain_loss: Money,
    /// Gain/loss as a percentage of cost basis (zero when basis is zero).
    pub gain_loss_percentage: Decimal,
    /// Per-brokerage slices.
    pub breakdown: Vec<PositionSlice>,
}

impl AggregatedPosition {
    /// Create an empty aggregate for a symbol.
    #[must_use]
    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            total_quantity: Quantity::ZERO,
            average_price: Money::ZERO,
            current_value: Money::ZERO,
            gain_loss: Money::ZERO,
            gain_loss_percentage: Decimal::ZERO,
            breakdown: Vec::new(),
        }
    }

    /// Fold one holding into the running aggregate.
    ///
    /// Uses the incremental volume-weighted mean
    /// `avg' = (avg * total + price * qty) / (total + qty)`,
    /// which is independent of the order holdings arrive in.
    /// Zero-quantity holdings are skipped. A short lot that brings the
    /// running total to exactly zero resets the average instead of dividing
    /// by it.
    pub fn fold(&mut self, holding: &AccountHolding) {
        if holding.quantity.is_zero() {
            return;
        }

        let running_total = self.total_quantity.amount();
        let qty = holding.quantity.amount();
        let new_total = running_total + qty;

        if new_total == Decimal::ZERO {
            self.average_price = Money::ZERO;
        } else {
            let weighted = self.average_price.amount() * running_total
                + holding.average_price.amount() * qty;
            self.average_price = Money::new(weighted / new_total);
        }
        self.total_quantity = Quantity::new(new_total);

        self.current_value += holding.current_price * qty;
        self.gain_loss += holding.gain_loss;

        self.breakdown.push(PositionSlice {
            brokerage_id: holding.brokerage_id.clone(),
            quantity: holding.quantity,
            average_price: holding.average_price,
        });
    }

    /// Finalize the aggregate by computing the gain/loss percentage.
    ///
    /// The percentage is relative to total cost basis
    /// (`total_quantity * average_price`). A zero basis reports zero rather
    /// than dividing by zero.
    pub fn finalize(&mut self) {
        let cost_basis = self.total_quantity.amount() * self.average_price.amount();
        if cost_basis == Decimal::ZERO {
            self.gain_loss_percentage = Decimal::ZERO;
            return;
        }
        self.gain_loss_percentage =
            (self.current_value.amount() - cost_basis) / cost_basis * Decimal::ONE_HUNDRED;
    }
}
