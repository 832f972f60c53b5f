//! Broken-connection detection and repair classification.
//!
//! Providers surface the same underlying failure through different channels:
//! an HTTP status, a provider error code, or only a message. Any one signal
//! is enough to classify a connection as broken; the repair action then
//! tells the user how to fix it.
//!
//! # Signals
//!
//! | Channel | Broken when |
//! |---------|-------------|
//! | HTTP status | 401, 403, 410, 423 |
//! | Provider code | credential/expiry, deleted, disabled codes |
//! | Message | contains a known substring (case-insensitive) |

use std::sync::Arc;

use chrono::Utc;

use crate::application::ports::ConnectionRegistryPort;
use crate::domain::provider::{
    ConnectionHealth, ConnectionState, ProviderError, RepairAction, RepairInfo,
};
use crate::domain::shared::AuthorizationId;

/// HTTP statuses that always mean the connection is broken.
const BROKEN_STATUSES: &[u16] = &[401, 403, 410, 423];

/// Provider codes meaning credentials expired or were revoked.
const REAUTH_CODES: &[&str] = &["TOKEN_EXPIRED", "CREDENTIALS_INVALID", "AUTHORIZATION_REVOKED"];

/// Provider codes meaning the connection record no longer exists.
const RECONNECT_CODES: &[&str] = &["CONNECTION_DELETED", "ACCOUNT_REMOVED"];

/// Provider codes meaning the account is administratively blocked.
const SUPPORT_CODES: &[&str] = &["CONNECTION_DISABLED", "ACCOUNT_SUSPENDED", "ACCOUNT_LOCKED"];

/// Message substrings that mark a connection broken, matched
/// case-insensitively.
const BROKEN_MESSAGE_FRAGMENTS: &[&str] = &[
    "authorization disabled",
    "authorization revoked",
    "token expired",
    "connection deleted",
    "account locked",
];

/// Returns true when the provider failure means the brokerage connection
/// itself is broken (as opposed to a transient or request-level error).
#[must_use]
pub fn is_broken_connection(error: &ProviderError) -> bool {
    if let Some(status) = error.status {
        if BROKEN_STATUSES.contains(&status) {
            return true;
        }
    }

    if let Some(code) = error.code.as_deref() {
        if REAUTH_CODES.contains(&code)
            || RECONNECT_CODES.contains(&code)
            || SUPPORT_CODES.contains(&code)
        {
            return true;
        }
    }

    let message = error.message.to_lowercase();
    BROKEN_MESSAGE_FRAGMENTS
        .iter()
        .any(|fragment| message.contains(fragment))
}

/// Compute the repair action for a broken connection.
///
/// The provider error code takes precedence over the HTTP status; unknown
/// combinations default to re-authentication, the cheapest repair.
#[must_use]
pub fn repair_action(code: Option<&str>, status: Option<u16>) -> RepairAction {
    if let Some(code) = code {
        if REAUTH_CODES.contains(&code) {
            return RepairAction::Reauth;
        }
        if RECONNECT_CODES.contains(&code) {
            return RepairAction::Reconnect;
        }
        if SUPPORT_CODES.contains(&code) {
            return RepairAction::ContactSupport;
        }
    }

    match status {
        Some(401 | 403) => RepairAction::Reauth,
        Some(410) => RepairAction::Reconnect,
        Some(423) => RepairAction::ContactSupport,
        _ => RepairAction::Reauth,
    }
}

/// Injectable keyed store for connection health records.
pub trait ConnectionHealthStore: Send + Sync {
    /// Health record for an authorization, if one exists.
    fn get(&self, authorization_id: &AuthorizationId) -> Option<ConnectionHealth>;
    /// Replace the health record.
    fn put(&self, health: ConnectionHealth);
}

/// Tracks connection health and builds repair prompts for broken
/// connections.
pub struct ConnectionMonitor {
    health_store: Box<dyn ConnectionHealthStore>,
    registry: Arc<dyn ConnectionRegistryPort>,
}

impl ConnectionMonitor {
    /// Create a monitor over a health store and the authorization registry.
    pub fn new(
        health_store: Box<dyn ConnectionHealthStore>,
        registry: Arc<dyn ConnectionRegistryPort>,
    ) -> Self {
        Self {
            health_store,
            registry,
        }
    }

    /// Idempotently mark a connection broken.
    ///
    /// Repeated signals only refresh the timestamp and last-error fields.
    /// Store failures are logged and swallowed: a missed mark only delays a
    /// later repair prompt.
    pub fn mark_broken(
        &self,
        authorization_id: &AuthorizationId,
        error_code: Option<&str>,
        error_message: Option<&str>,
    ) {
        let action = repair_action(error_code, None);
        let mut health = self
            .health_store
            .get(authorization_id)
            .unwrap_or_else(|| ConnectionHealth::healthy(authorization_id.clone()));

        let first_mark = health.state != ConnectionState::Broken;
        health.state = ConnectionState::Broken;
        health.last_error_code = error_code.map(str::to_string);
        health.last_error_message = error_message.map(str::to_string);
        health.last_failed_at = Some(Utc::now());
        health.repair_action = Some(action);
        self.health_store.put(health);

        if first_mark {
            tracing::warn!(
                authorization_id = %authorization_id,
                error_code,
                "Connection marked broken"
            );
        }
    }

    /// Current health for an authorization, if tracked.
    #[must_use]
    pub fn health(&self, authorization_id: &AuthorizationId) -> Option<ConnectionHealth> {
        self.health_store.get(authorization_id)
    }

    /// Classify a provider failure and, when it breaks the connection, mark
    /// it and build a repair prompt.
    ///
    /// Returns `None` when the error is not a broken-connection signature or
    /// when the authorization record cannot be found.
    pub async fn handle_broken_connection(
        &self,
        error: &ProviderError,
        authorization_id: &AuthorizationId,
        context: &str,
    ) -> Option<RepairInfo> {
        if !is_broken_connection(error) {
            return None;
        }

        self.mark_broken(authorization_id, error.code.as_deref(), Some(&error.message));

        let authorization = match self.registry.find_authorization(authorization_id).await {
            Ok(Some(authorization)) => authorization,
            Ok(None) => {
                tracing::warn!(
                    authorization_id = %authorization_id,
                    context,
                    "Broken connection has no authorization record"
                );
                return None;
            }
            Err(e) => {
                tracing::error!(
                    authorization_id = %authorization_id,
                    context,
                    error = %e,
                    "Authorization lookup failed while handling broken connection"
                );
                return None;
            }
        };

        let action = repair_action(error.code.as_deref(), error.status);
        let url = repair_url(action, authorization_id, &authorization.brokerage_slug);
        let message = match action {
            RepairAction::Reauth => format!(
                "Reconnect your {} account to continue trading",
                authorization.brokerage_slug
            ),
            RepairAction::Reconnect => format!(
                "Your {} connection was removed; connect it again",
                authorization.brokerage_slug
            ),
            RepairAction::ContactSupport => format!(
                "Your {} connection is disabled; contact support",
                authorization.brokerage_slug
            ),
        };

        Some(RepairInfo {
            action,
            url,
            brokerage_id: authorization.brokerage_id,
            authorization_id: authorization_id.clone(),
            message,
        })
    }
}

/// Repair URL for an action, parameterized by the broken authorization.
fn repair_url(action: RepairAction, authorization_id: &AuthorizationId, slug: &str) -> String {
    match action {
        RepairAction::Reauth => format!(
            "/accounts/reconnect?authorizationId={authorization_id}&brokerage={slug}"
        ),
        RepairAction::Reconnect => format!("/accounts/connect?brokerage={slug}"),
        RepairAction::ContactSupport => format!(
            "/support?topic=connection&authorizationId={authorization_id}"
        ),
    }
}
