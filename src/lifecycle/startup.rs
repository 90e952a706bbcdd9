//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the control surface listener
//! - Build history, controller, poll loop and HTTP server in order
//! - Tie both background tasks to one shutdown coordinator
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, and releases the device first
//! - The poll loop owns the final OFF write; the server never touches
//!   the device on exit
//! - Either task ending (server error, fatal device error) stops the other

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::alert::{AlertClient, HttpAlertClient};
use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::history::PollHistory;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::poller::PollLoop;
use crate::relay::{open_device, DeviceError, OutputDevice, RelayController};

/// Handle to a started bridge.
pub struct RunningBridge {
    local_addr: SocketAddr,
    controller: Arc<RelayController>,
    shutdown: Arc<Shutdown>,
    server: JoinHandle<std::io::Result<()>>,
    poller: JoinHandle<Result<(), DeviceError>>,
}

impl RunningBridge {
    /// Address the control surface is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn controller(&self) -> &Arc<RelayController> {
        &self.controller
    }

    pub fn shutdown_handle(&self) -> Arc<Shutdown> {
        self.shutdown.clone()
    }

    /// Wait for both tasks. The poll loop's device error takes precedence.
    pub async fn wait(self) -> BridgeResult<()> {
        let polled = self.poller.await?;
        let served = self.server.await?;
        polled?;
        served?;
        Ok(())
    }
}

/// Wire up and start every component around an already-opened device.
pub async fn start<C>(
    config: &BridgeConfig,
    client: C,
    device: Box<dyn OutputDevice>,
) -> BridgeResult<RunningBridge>
where
    C: AlertClient + 'static,
{
    let history = Arc::new(PollHistory::new(config.poll.history_capacity));
    let controller = Arc::new(RelayController::new(
        device,
        history,
        config.alert_api.url.clone(),
        config.poll.interval(),
    ));

    // The controller owns the device from here on; a bind failure must
    // still drive it OFF and release it.
    let bound = async {
        let listener = TcpListener::bind(&config.listener.bind_address).await?;
        let addr = listener.local_addr()?;
        Ok::<_, std::io::Error>((listener, addr))
    }
    .await;
    let (listener, local_addr) = match bound {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!(
                address = %config.listener.bind_address,
                error = %e,
                "Failed to bind control surface"
            );
            if let Err(release) = controller.shutdown() {
                tracing::error!(error = %release, "Relay release after bind failure failed");
            }
            return Err(e.into());
        }
    };
    let shutdown = Arc::new(Shutdown::new());

    let http = HttpServer::new(controller.clone(), &config.listener, &config.control);
    let server = {
        let shutdown = shutdown.clone();
        let signal = shutdown.subscribe();
        tokio::spawn(async move {
            let result = http.run(listener, signal).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "Control surface failed");
            }
            shutdown.trigger();
            result
        })
    };

    let poll_loop = PollLoop::new(client, controller.clone(), config.poll.interval());
    let poller = {
        let shutdown = shutdown.clone();
        let signal = shutdown.subscribe();
        tokio::spawn(async move {
            let result = poll_loop.run(signal).await;
            if result.is_err() {
                shutdown.trigger();
            }
            result
        })
    };

    Ok(RunningBridge {
        local_addr,
        controller,
        shutdown,
        server,
        poller,
    })
}

/// Run the bridge from configuration until a termination signal.
pub async fn run(config: BridgeConfig) -> BridgeResult<()> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = HttpAlertClient::new(&config.alert_api)?;
    let device = open_device(&config.relay)?;

    tracing::info!(
        api_url = %config.alert_api.url,
        poll_interval_ms = config.poll.interval_ms,
        timeout_ms = config.alert_api.timeout_ms,
        device = %device.describe(),
        "Starting relay bridge"
    );

    let bridge = start(&config, client, device).await?;
    tracing::info!(address = %bridge.local_addr(), "Dashboard available");

    let _signals = signals::spawn_signal_listener(bridge.shutdown_handle());
    bridge.wait().await
}
