//! Aggregate Positions Use Case

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::ports::PortfolioStorePort;
use crate::domain::positions::AggregatedPosition;
use crate::domain::shared::{Symbol, UserId};
use crate::error::EngineError;

/// Use case for folding per-account holdings into per-symbol aggregates.
pub struct AggregatePositionsUseCase<S>
where
    S: PortfolioStorePort,
{
    store: Arc<S>,
}

impl<S> AggregatePositionsUseCase<S>
where
    S: PortfolioStorePort,
{
    /// Create a new `AggregatePositionsUseCase`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Aggregate every holding across the user's connected accounts,
    /// grouped by symbol in lexical order.
    ///
    /// # Errors
    ///
    /// Returns an error when the portfolio store is unavailable.
    pub async fn execute(&self, user_id: &UserId) -> Result<Vec<AggregatedPosition>, EngineError> {
        let holdings = self.store.holdings(user_id).await?;

        let mut by_symbol: BTreeMap<Symbol, AggregatedPosition> = BTreeMap::new();
        for holding in &holdings {
            by_symbol
                .entry(holding.symbol.clone())
                .or_insert_with(|| AggregatedPosition::empty(holding.symbol.clone()))
                .fold(holding);
        }

        let mut positions: Vec<AggregatedPosition> = by_symbol.into_values().collect();
        for position in &mut positions {
            position.finalize();
        }

        tracing::debug!(
            user_id = %user_id,
            holdings = holdings.len(),
            positions = positions.len(),
            "Aggregated positions"
        );
        Ok(positions)
    }
}
