//! In-memory adapters for the engine's ports and resilience stores.
//!
//! Suitable for a single instance, demos and tests. Each adapter keeps its
//! state behind an `RwLock` and recovers from poisoning with
//! `PoisonError::into_inner`; none of the guarded sections can leave state
//! torn.

use std::collections::{HashMap, HashSet};
use std::sync::PoisonError;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::ports::{
    ActivityEntry, BrokerageCatalogPort, ConnectionRegistryPort, PortfolioStorePort, StorageError,
    WalletError, WalletPort,
};
use crate::domain::assets::AssetClass;
use crate::domain::positions::AccountHolding;
use crate::domain::provider::{BrokerageAuthorization, ConnectionHealth};
use crate::domain::shared::{AuthorizationId, BrokerageId, HoldId, Money, TradeId, UserId};
use crate::domain::trading::{BrokerageInfo, ConnectedAccount, FundHold, Trade, TradeStatus};
use crate::resilience::{ConnectionHealthStore, RateLimitState, RateLimitStore};

/// In-memory keyed rate-limit state.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    entries: RwLock<HashMap<String, RateLimitState>>,
}

impl InMemoryRateLimitStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitState> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).copied()
    }

    fn put(&self, key: &str, state: RateLimitState) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), state);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.keys().cloned().collect()
    }
}

/// In-memory connection health records.
#[derive(Default)]
pub struct InMemoryConnectionHealthStore {
    records: RwLock<HashMap<AuthorizationId, ConnectionHealth>>,
}

impl InMemoryConnectionHealthStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectionHealthStore for InMemoryConnectionHealthStore {
    fn get(&self, authorization_id: &AuthorizationId) -> Option<ConnectionHealth> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(authorization_id).cloned()
    }

    fn put(&self, health: ConnectionHealth) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(health.authorization_id.clone(), health);
    }
}

/// In-memory wallet with per-user balances and funds holds.
///
/// Releasing a hold twice is not an error; the second release is a no-op.
#[derive(Default)]
pub struct InMemoryWallet {
    balances: RwLock<HashMap<UserId, Money>>,
    holds: RwLock<HashMap<HoldId, (UserId, Money)>>,
    released: RwLock<HashSet<HoldId>>,
}

impl InMemoryWallet {
    /// Create an empty wallet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's balance.
    pub fn credit(&self, user_id: &UserId, amount: Money) {
        let mut balances = self.balances.write().unwrap_or_else(PoisonError::into_inner);
        let balance = balances.entry(user_id.clone()).or_insert(Money::ZERO);
        *balance += amount;
    }

    /// Current free balance (held funds excluded).
    #[must_use]
    pub fn balance(&self, user_id: &UserId) -> Money {
        let balances = self.balances.read().unwrap_or_else(PoisonError::into_inner);
        balances.get(user_id).copied().unwrap_or(Money::ZERO)
    }

    /// Number of holds still outstanding.
    #[must_use]
    pub fn outstanding_holds(&self) -> usize {
        let holds = self.holds.read().unwrap_or_else(PoisonError::into_inner);
        holds.len()
    }
}

#[async_trait]
impl WalletPort for InMemoryWallet {
    async fn hold_funds(
        &self,
        user_id: &UserId,
        amount: Money,
        purpose: &str,
    ) -> Result<FundHold, WalletError> {
        let mut balances = self.balances.write().unwrap_or_else(PoisonError::into_inner);
        let balance = balances.entry(user_id.clone()).or_insert(Money::ZERO);
        if *balance < amount {
            return Err(WalletError::InsufficientFunds { required: amount });
        }
        *balance = *balance - amount;

        let hold_id = HoldId::generate();
        let mut holds = self.holds.write().unwrap_or_else(PoisonError::into_inner);
        holds.insert(hold_id.clone(), (user_id.clone(), amount));

        Ok(FundHold {
            hold_id,
            amount,
            purpose: purpose.to_string(),
        })
    }

    async fn release_funds(&self, _user_id: &UserId, hold_id: &HoldId) -> Result<(), WalletError> {
        let mut holds = self.holds.write().unwrap_or_else(PoisonError::into_inner);
        if let Some((owner, amount)) = holds.remove(hold_id) {
            drop(holds);
            let mut balances = self.balances.write().unwrap_or_else(PoisonError::into_inner);
            let balance = balances.entry(owner).or_insert(Money::ZERO);
            *balance += amount;

            let mut released = self.released.write().unwrap_or_else(PoisonError::into_inner);
            released.insert(hold_id.clone());
            return Ok(());
        }
        drop(holds);

        let released = self.released.read().unwrap_or_else(PoisonError::into_inner);
        if released.contains(hold_id) {
            // Double release is a no-op
            return Ok(());
        }
        Err(WalletError::HoldNotFound {
            hold_id: hold_id.clone(),
        })
    }
}

/// In-memory portfolio store: holdings, connected accounts, trades and the
/// activity log.
#[derive(Default)]
pub struct InMemoryPortfolioStore {
    holdings: RwLock<HashMap<UserId, Vec<AccountHolding>>>,
    accounts: RwLock<HashMap<UserId, Vec<ConnectedAccount>>>,
    trades: RwLock<HashMap<TradeId, Trade>>,
    activity: RwLock<Vec<ActivityEntry>>,
}

impl InMemoryPortfolioStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed holdings for a user.
    pub fn add_holding(&self, user_id: &UserId, holding: AccountHolding) {
        let mut holdings = self.holdings.write().unwrap_or_else(PoisonError::into_inner);
        holdings.entry(user_id.clone()).or_default().push(holding);
    }

    /// Seed a connected account for a user.
    pub fn add_account(&self, user_id: &UserId, account: ConnectedAccount) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.entry(user_id.clone()).or_default().push(account);
    }

    /// Look up a trade record.
    #[must_use]
    pub fn trade(&self, trade_id: &TradeId) -> Option<Trade> {
        let trades = self.trades.read().unwrap_or_else(PoisonError::into_inner);
        trades.get(trade_id).cloned()
    }

    /// Snapshot of the activity log.
    #[must_use]
    pub fn activity_log(&self) -> Vec<ActivityEntry> {
        let activity = self.activity.read().unwrap_or_else(PoisonError::into_inner);
        activity.clone()
    }
}

#[async_trait]
impl PortfolioStorePort for InMemoryPortfolioStore {
    async fn holdings(&self, user_id: &UserId) -> Result<Vec<AccountHolding>, StorageError> {
        let holdings = self.holdings.read().unwrap_or_else(PoisonError::into_inner);
        Ok(holdings.get(user_id).cloned().unwrap_or_default())
    }

    async fn connected_accounts(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ConnectedAccount>, StorageError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.get(user_id).cloned().unwrap_or_default())
    }

    async fn create_trade(&self, trade: &Trade) -> Result<(), StorageError> {
        let mut trades = self.trades.write().unwrap_or_else(PoisonError::into_inner);
        trades.insert(trade.id.clone(), trade.clone());
        Ok(())
    }

    async fn update_trade_status(
        &self,
        trade_id: &TradeId,
        status: TradeStatus,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let mut trades = self.trades.write().unwrap_or_else(PoisonError::into_inner);
        let trade = trades.get_mut(trade_id).ok_or_else(|| StorageError::NotFound {
            entity: "trade".to_string(),
            id: trade_id.to_string(),
        })?;
        trade.status = status;
        if executed_at.is_some() {
            trade.executed_at = executed_at;
        }
        Ok(())
    }

    async fn log_activity(&self, entry: ActivityEntry) -> Result<(), StorageError> {
        let mut activity = self.activity.write().unwrap_or_else(PoisonError::into_inner);
        activity.push(entry);
        Ok(())
    }
}

/// In-memory authorization registry.
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    authorizations: RwLock<HashMap<AuthorizationId, BrokerageAuthorization>>,
}

impl InMemoryConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authorization record.
    pub fn insert(&self, authorization: BrokerageAuthorization) {
        let mut authorizations = self
            .authorizations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        authorizations.insert(authorization.id.clone(), authorization);
    }
}

#[async_trait]
impl ConnectionRegistryPort for InMemoryConnectionRegistry {
    async fn find_authorization(
        &self,
        authorization_id: &AuthorizationId,
    ) -> Result<Option<BrokerageAuthorization>, StorageError> {
        let authorizations = self
            .authorizations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(authorizations.get(authorization_id).cloned())
    }
}

/// In-memory brokerage catalog with a stable enumeration order.
///
/// Compatibility results come back in registration order, which makes the
/// router's first-wins tie-break deterministic.
#[derive(Default)]
pub struct InMemoryBrokerageCatalog {
    brokerages: RwLock<Vec<BrokerageInfo>>,
}

impl InMemoryBrokerageCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a brokerage. Order of registration is the enumeration order.
    pub fn register(&self, info: BrokerageInfo) {
        let mut brokerages = self.brokerages.write().unwrap_or_else(PoisonError::into_inner);
        brokerages.push(info);
    }
}

#[async_trait]
impl BrokerageCatalogPort for InMemoryBrokerageCatalog {
    async fn compatible_brokerages(
        &self,
        asset: AssetClass,
        connected: &[BrokerageId],
    ) -> Result<Vec<BrokerageInfo>, StorageError> {
        let brokerages = self.brokerages.read().unwrap_or_else(PoisonError::into_inner);
        Ok(brokerages
            .iter()
            .filter(|info| connected.contains(&info.id) && info.supported_assets.contains(&asset))
            .cloned()
            .collect())
    }
}
