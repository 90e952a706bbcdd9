//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval, timeout, capacity > 0)
//! - Check the request timeout fits inside one poll interval
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("alert API key is required (set ALERT_API_KEY)")]
    MissingApiKey,

    #[error("alert API URL {0:?} is not a valid http(s) URL")]
    InvalidApiUrl(String),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("request timeout ({timeout_ms}ms) must be shorter than the poll interval ({interval_ms}ms)")]
    TimeoutExceedsInterval { timeout_ms: u64, interval_ms: u64 },

    #[error("history capacity must be greater than zero")]
    ZeroHistoryCapacity,

    #[error("bind address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("metrics address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config
        .alert_api
        .api_key
        .as_deref()
        .map_or(true, |k| k.trim().is_empty())
    {
        errors.push(ValidationError::MissingApiKey);
    }

    match Url::parse(&config.alert_api.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidApiUrl(config.alert_api.url.clone())),
    }

    let interval_ms = config.poll.interval_ms;
    let timeout_ms = config.alert_api.timeout_ms;
    if interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }
    if timeout_ms == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if interval_ms > 0 && timeout_ms >= interval_ms {
        errors.push(ValidationError::TimeoutExceedsInterval { timeout_ms, interval_ms });
    }

    if config.poll.history_capacity == 0 {
        errors.push(ValidationError::ZeroHistoryCapacity);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
