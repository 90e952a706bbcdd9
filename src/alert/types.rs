//! Alert API payload and poll outcome types.

use serde::{Deserialize, Serialize};

use crate::history::OutcomeKind;

/// A monitored target currently over its failure threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingTarget {
    pub name: String,
    pub failures: u32,
    pub threshold: u32,
}

/// Decoded body of a successful alert-status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSnapshot {
    /// Whether the monitoring side is currently alerting.
    pub alert: bool,
    pub failing_count: u32,
    /// Omitted by the API when nothing is failing.
    #[serde(default)]
    pub failing_targets: Vec<FailingTarget>,
}

impl AlertSnapshot {
    /// One-line description used for history entries and logs.
    pub fn summary(&self) -> String {
        if !self.alert {
            return "All systems operational".to_string();
        }

        let targets = self
            .failing_targets
            .iter()
            .map(|t| format!("{} ({}/{})", t.name, t.failures, t.threshold))
            .collect::<Vec<_>>()
            .join(", ");

        format!("{} target(s) down: {}", self.failing_count, targets)
    }
}

/// Classified result of one alert API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// 2xx with a well-formed body.
    Success(AlertSnapshot),
    /// 429, with the raw `Retry-After` value if present.
    RateLimited { retry_after: Option<String> },
    /// 401: the API key was rejected.
    AuthFailed,
    /// Any other non-2xx status.
    ApiError { status: u16 },
    /// Network failure, timeout or malformed body.
    TransportError(String),
}

impl PollOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            PollOutcome::Success(_) => OutcomeKind::Success,
            PollOutcome::RateLimited { .. } => OutcomeKind::RateLimited,
            PollOutcome::AuthFailed => OutcomeKind::AuthFailed,
            PollOutcome::ApiError { .. } => OutcomeKind::ApiError,
            PollOutcome::TransportError(_) => OutcomeKind::TransportError,
        }
    }
}
