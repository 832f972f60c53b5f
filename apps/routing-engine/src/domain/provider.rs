//! Normalized provider errors and connection health records.
//!
//! Every provider HTTP client normalizes its failures into [`ProviderError`]
//! at the client boundary. The resilience layer classifies only this one
//! shape, never raw responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{AuthorizationId, BrokerageId, UserId};

/// A normalized provider failure: optional HTTP status, optional provider
/// error code, and a message. Rate-limit metadata rides along when the
/// provider supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// HTTP status code, when the failure came from an HTTP response.
    pub status: Option<u16>,
    /// Provider-specific error code.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Raw `Retry-After` header value, if present.
    pub retry_after: Option<String>,
    /// Raw `X-RateLimit-Remaining` header value, if present.
    pub requests_remaining: Option<u32>,
}

impl ProviderError {
    /// Create an error carrying only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
            retry_after: None,
            requests_remaining: None,
        }
    }

    /// Create an error from an HTTP status and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            code: None,
            message: message.into(),
            retry_after: None,
            requests_remaining: None,
        }
    }

    /// Attach a provider error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach a `Retry-After` header value.
    #[must_use]
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    /// Returns true for 429-shaped failures.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.code.as_deref()) {
            (Some(status), Some(code)) => {
                write!(f, "provider error [{status}/{code}]: {}", self.message)
            }
            (Some(status), None) => write!(f, "provider error [{status}]: {}", self.message),
            (None, Some(code)) => write!(f, "provider error [{code}]: {}", self.message),
            (None, None) => write!(f, "provider error: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Health state of a brokerage connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Calls are expected to succeed.
    Healthy,
    /// The connection needs user repair before calls can succeed.
    Broken,
}

/// The remediation a user must perform to restore a broken connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    /// Re-authenticate the existing connection.
    Reauth,
    /// Create a fresh connection (the old one is gone).
    Reconnect,
    /// The account is disabled or locked; support has to intervene.
    ContactSupport,
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reauth => write!(f, "reauth"),
            Self::Reconnect => write!(f, "reconnect"),
            Self::ContactSupport => write!(f, "contact_support"),
        }
    }
}

/// Health record for one brokerage authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionHealth {
    /// Authorization this record tracks.
    pub authorization_id: AuthorizationId,
    /// Current state.
    pub state: ConnectionState,
    /// Provider error code from the last failure.
    pub last_error_code: Option<String>,
    /// Message from the last failure.
    pub last_error_message: Option<String>,
    /// When the last failure was observed.
    pub last_failed_at: Option<DateTime<Utc>>,
    /// Remediation computed from the last failure.
    pub repair_action: Option<RepairAction>,
}

impl ConnectionHealth {
    /// A fresh healthy record.
    #[must_use]
    pub const fn healthy(authorization_id: AuthorizationId) -> Self {
        Self {
            authorization_id,
            state: ConnectionState::Healthy,
            last_error_code: None,
            last_error_message: None,
            last_failed_at: None,
            repair_action: None,
        }
    }
}

/// A structured repair prompt surfaced alongside a broken-connection error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairInfo {
    /// What the user must do.
    pub action: RepairAction,
    /// Where to send them to do it.
    pub url: String,
    /// Brokerage the broken connection belongs to.
    pub brokerage_id: BrokerageId,
    /// The broken authorization.
    pub authorization_id: AuthorizationId,
    /// Actionable message for display.
    pub message: String,
}

/// Connection metadata: the provider-side grant linking a user's external
/// brokerage account to the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerageAuthorization {
    /// Authorization identifier.
    pub id: AuthorizationId,
    /// Owning user.
    pub user_id: UserId,
    /// Brokerage granted access.
    pub brokerage_id: BrokerageId,
    /// URL-safe brokerage slug for repair links.
    pub brokerage_slug: String,
}
