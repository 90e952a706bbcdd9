//! History entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::relay::RelayState;

/// What produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    RateLimited,
    AuthFailed,
    ApiError,
    TransportError,
    ManualOverride,
}

impl OutcomeKind {
    /// Stable label used in metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::RateLimited => "rate_limited",
            OutcomeKind::AuthFailed => "auth_failed",
            OutcomeKind::ApiError => "api_error",
            OutcomeKind::TransportError => "transport_error",
            OutcomeKind::ManualOverride => "manual_override",
        }
    }
}

/// One poll or manual action. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: OutcomeKind,
    /// State the relay was driven to, absent when nothing was actuated.
    pub relay_state: Option<RelayState>,
    pub detail: String,
    /// HTTP status returned by the alert API, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl PollRecord {
    pub fn new(kind: OutcomeKind, relay_state: Option<RelayState>, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            relay_state,
            detail: detail.into(),
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    /// Whether the alert API answered with a usable payload.
    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}
