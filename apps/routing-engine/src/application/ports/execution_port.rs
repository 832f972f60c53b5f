//! Execution Port (Driven Port)
//!
//! Boundary to the real execution collaborator. The engine persists a
//! pending trade, hands it to this port, and settles on the returned report.
//! There is no simulated fill timer in the engine; settlement timing belongs
//! to the collaborator behind this port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::domain::provider::ProviderError;
use crate::domain::shared::Money;
use crate::domain::trading::Trade;

/// Settlement report for an executed trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Price the order filled at.
    pub fill_price: Money,
    /// When the fill happened.
    pub executed_at: DateTime<Utc>,
}

/// Port for order execution.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Execute a pending trade at its brokerage.
    async fn execute(&self, trade: &Trade) -> Result<ExecutionReport, ProviderError>;
}
