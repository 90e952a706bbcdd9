//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::{BridgeConfig, LogFormat, RelayDriver};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "RELAY_BRIDGE_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn load_from_file(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

fn parse_var<T: FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError> {
    let parsed = raw.trim().parse::<T>();
    parsed.map_err(|_| ConfigError::InvalidEnv { var, value: raw })
}

/// Pre-rename variable names still honoured. The first name wins when both
/// are set.
const ALIASES: &[(&str, &str)] = &[
    ("ALERT_API_URL", "PIALERT_API_URL"),
    ("ALERT_API_KEY", "PIALERT_API_KEY"),
    ("POLL_INTERVAL_MS", "POLL_INTERVAL"),
];

fn lookup_aliased<F>(lookup: &F, var: &'static str) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(var) {
        return Some((var, v));
    }
    ALIASES
        .iter()
        .find(|(name, _)| *name == var)
        .and_then(|&(_, legacy)| lookup(legacy).map(|v| (legacy, v)))
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests don't touch the process
/// environment.
pub fn apply_env_overrides<F>(config: &mut BridgeConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some((_, v)) = lookup_aliased(&lookup, "ALERT_API_URL") {
        config.alert_api.url = v;
    }
    if let Some((_, v)) = lookup_aliased(&lookup, "ALERT_API_KEY") {
        config.alert_api.api_key = Some(v);
    }
    if let Some(v) = lookup("REQUEST_TIMEOUT_MS") {
        config.alert_api.timeout_ms = parse_var("REQUEST_TIMEOUT_MS", v)?;
    }
    if let Some((var, v)) = lookup_aliased(&lookup, "POLL_INTERVAL_MS") {
        config.poll.interval_ms = parse_var(var, v)?;
    }
    if let Some(v) = lookup("HISTORY_CAPACITY") {
        config.poll.history_capacity = parse_var("HISTORY_CAPACITY", v)?;
    }
    if let Some(v) = lookup("RELAY_PIN") {
        config.relay.pin = parse_var("RELAY_PIN", v)?;
    }
    if let Some(v) = lookup("RELAY_DRIVER") {
        config.relay.driver = match v.trim().to_ascii_lowercase().as_str() {
            "sysfs" => RelayDriver::Sysfs,
            "simulated" => RelayDriver::Simulated,
            _ => return Err(ConfigError::InvalidEnv { var: "RELAY_DRIVER", value: v }),
        };
    }
    if let Some(v) = lookup("GPIO_SYSFS_ROOT") {
        config.relay.sysfs_root = v;
    }
    if let Some(v) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("STATIC_DIR") {
        config.listener.static_dir = v;
    }
    if let Some(v) = lookup("CONTROL_API_TOKEN") {
        config.control.api_token = Some(v);
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = lookup("LOG_FORMAT") {
        config.observability.log_format = match v.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::InvalidEnv { var: "LOG_FORMAT", value: v }),
        };
    }
    if let Some(v) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = v;
        config.observability.metrics_enabled = true;
    }
    Ok(())
}

/// Build the full configuration: defaults, optional file, environment,
/// then validation.
pub fn load<F>(lookup: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_ENV) {
        Some(path) => load_from_file(Path::new(&path))?,
        None => BridgeConfig::default(),
    };

    apply_env_overrides(&mut config, &lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// [`load`] against the process environment.
pub fn load_from_env() -> Result<BridgeConfig, ConfigError> {
    load(|key| std::env::var(key).ok())
}
