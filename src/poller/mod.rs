//! Scheduled poll loop.
//!
//! # Data Flow
//! ```text
//! interval tick
//!     → AlertClient::poll (bounded by the client timeout)
//!     → RelayController::evaluate (device write + history append)
//!
//! shutdown signal
//!     → stop scheduling
//!     → RelayController::shutdown (final OFF, release once)
//! ```
//!
//! # Design Decisions
//! - Ticks run sequentially; a slow poll delays the next tick instead of
//!   overlapping it
//! - The first tick fires immediately at startup
//! - A shutdown arriving mid-tick waits for that tick to finish
//! - A device write failure is fatal and ends the loop

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};

use crate::alert::AlertClient;
use crate::history::PollRecord;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::relay::{DeviceError, RelayController};

/// Periodic driver feeding alert outcomes into the controller.
pub struct PollLoop<C> {
    client: C,
    controller: Arc<RelayController>,
    interval: Duration,
}

impl<C: AlertClient> PollLoop<C> {
    pub fn new(client: C, controller: Arc<RelayController>, interval: Duration) -> Self {
        Self {
            client,
            controller,
            interval,
        }
    }

    /// Run a single poll-evaluate-actuate cycle.
    pub async fn tick(&self) -> Result<PollRecord, DeviceError> {
        let start = Instant::now();
        let outcome = self.client.poll().await;
        metrics::record_poll_duration(start);

        let record = self.controller.evaluate(outcome)?;
        tracing::debug!(
            outcome = record.kind.as_str(),
            relay = ?record.relay_state,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Poll tick complete"
        );
        Ok(record)
    }

    /// Tick until shutdown, then drive the relay OFF and release it.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<(), DeviceError> {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "Poll loop starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Poll loop received shutdown signal, exiting loop");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "Relay write failed, stopping poll loop");
                        break Err(e);
                    }
                }
            }
        };

        let released = self.controller.shutdown();
        result.and(released)
    }
}
