//! Top-level error type.

use thiserror::Error;

use crate::alert::AlertClientError;
use crate::config::ConfigError;
use crate::relay::DeviceError;

/// Errors that stop the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Missing credential or otherwise invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("alert client error: {0}")]
    Client(#[from] AlertClientError),

    /// The relay may be in an unknown physical state.
    #[error("relay device error: {0}")]
    Device(#[from] DeviceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
