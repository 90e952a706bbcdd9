//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file named by RELAY_BRIDGE_CONFIG (loader.rs)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks, all errors collected)
//!     → BridgeConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults except the API key, which is mandatory
//! - Secrets are never serialized or printed

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_from_env, ConfigError, CONFIG_PATH_ENV};
pub use schema::{
    AlertApiConfig, BridgeConfig, ControlConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    PollConfig, RelayConfig, RelayDriver,
};
pub use validation::{validate_config, ValidationError};
