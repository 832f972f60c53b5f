//! Execution venue adapters.

use async_trait::async_trait;
use chrono::Utc;

use crate::application::ports::{ExecutionPort, ExecutionReport};
use crate::domain::provider::ProviderError;
use crate::domain::trading::Trade;

/// Venue that fills every order immediately at its sizing price.
///
/// Stands in for a real brokerage adapter in demos and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateFillVenue;

impl ImmediateFillVenue {
    /// Create the venue.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionPort for ImmediateFillVenue {
    async fn execute(&self, trade: &Trade) -> Result<ExecutionReport, ProviderError> {
        tracing::debug!(trade_id = %trade.id, brokerage_id = %trade.brokerage_id, "Filling order");
        Ok(ExecutionReport {
            fill_price: trade.price,
            executed_at: Utc::now(),
        })
    }
}
