//! Configuration schema definitions.
//!
//! All types derive Serde traits so a TOML file can supply any subset of
//! fields; everything else falls back to the defaults below.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the relay bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Remote alert API to poll.
    pub alert_api: AlertApiConfig,

    /// Poll scheduling and history retention.
    pub poll: PollConfig,

    /// Output device selection.
    pub relay: RelayConfig,

    /// Control surface listener.
    pub listener: ListenerConfig,

    /// Control surface access.
    pub control: ControlConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Alert API settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertApiConfig {
    /// Full URL of the alert-status endpoint.
    pub url: String,

    /// Credential sent as `x-api-key`. Required.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl AlertApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for AlertApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/api/v1/alert-status".to_string(),
            api_key: None,
            timeout_ms: 5_000,
        }
    }
}

impl std::fmt::Debug for AlertApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertApiConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval between ticks in milliseconds.
    pub interval_ms: u64,

    /// Number of history entries kept in memory.
    pub history_capacity: usize,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            history_capacity: crate::history::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Which output device implementation to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayDriver {
    /// Linux sysfs GPIO.
    #[default]
    Sysfs,
    /// In-memory output, for running without hardware.
    Simulated,
}

/// Output device settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    pub driver: RelayDriver,

    /// GPIO line number (BCM numbering).
    pub pin: u32,

    /// Root of the sysfs GPIO class.
    pub sysfs_root: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            driver: RelayDriver::Sysfs,
            pin: 26,
            sysfs_root: "/sys/class/gpio".to_string(),
        }
    }
}

/// Control surface listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,

    /// Directory served for the dashboard.
    pub static_dir: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            static_dir: "public".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Control surface access.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControlConfig {
    /// Bearer token required on write endpoints. Open when unset.
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
}

impl std::fmt::Debug for ControlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
