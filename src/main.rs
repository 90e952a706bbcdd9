use std::process::ExitCode;

use relay_bridge::config::{self, ObservabilityConfig};
use relay_bridge::lifecycle;
use relay_bridge::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Refusing to start");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "relay-bridge starting");

    match lifecycle::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "relay-bridge stopped with an error");
            ExitCode::FAILURE
        }
    }
}
