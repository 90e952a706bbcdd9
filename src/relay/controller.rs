//! Relay decision state machine.
//!
//! # Decisions
//! ```text
//! Success(alert=true)   → ON
//! Success(alert=false)  → OFF
//! RateLimited           → unchanged (no information)
//! AuthFailed            → unchanged
//! ApiError              → unchanged
//! TransportError        → OFF (fail-safe)
//! set_manual / toggle   → requested state, last writer wins
//! ```
//!
//! A successful poll updates `last_alert` and `last_poll_time` only once
//! the device write has succeeded.
//!
//! Every call runs "decide, write device, commit state, append history"
//! under one lock, so concurrent polls and overrides never interleave and
//! history order equals commit order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::alert::{AlertSnapshot, PollOutcome};
use crate::history::{OutcomeKind, PollHistory, PollRecord};
use crate::observability::metrics;
use crate::relay::{DeviceError, OutputDevice, RelayState};

/// Read model served to the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub relay_state: RelayState,
    pub last_poll_time: Option<DateTime<Utc>>,
    pub last_alert: Option<AlertSnapshot>,
    pub api_url: String,
    pub poll_interval_ms: u64,
}

struct ControllerState {
    relay_state: RelayState,
    last_alert: Option<AlertSnapshot>,
    last_poll_time: Option<DateTime<Utc>>,
    device: Box<dyn OutputDevice>,
    released: bool,
}

impl ControllerState {
    /// Write the device, then commit. A failed write leaves `relay_state`
    /// at the last value that actually reached the hardware.
    fn actuate(&mut self, target: RelayState) -> Result<(), DeviceError> {
        if self.released {
            return Err(DeviceError::Released);
        }
        self.device.write(target)?;
        self.relay_state = target;
        Ok(())
    }
}

/// Owner of the relay output and of the last known alert context.
pub struct RelayController {
    state: Mutex<ControllerState>,
    history: Arc<PollHistory>,
    api_url: String,
    poll_interval: Duration,
}

impl RelayController {
    /// Create a controller with the relay OFF, no last poll and the given
    /// (normally empty) history.
    pub fn new(
        device: Box<dyn OutputDevice>,
        history: Arc<PollHistory>,
        api_url: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(ControllerState {
                relay_state: RelayState::Off,
                last_alert: None,
                last_poll_time: None,
                device,
                released: false,
            }),
            history,
            api_url: api_url.into(),
            poll_interval,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one poll outcome.
    pub fn evaluate(&self, outcome: PollOutcome) -> Result<PollRecord, DeviceError> {
        let kind = outcome.kind();
        let mut state = self.lock();

        match outcome {
            PollOutcome::Success(snapshot) => {
                let target = RelayState::from_bool(snapshot.alert);
                let detail = snapshot.summary();

                if target.is_on() {
                    tracing::info!(relay = %target, detail = %detail, "Alert active");
                } else {
                    tracing::info!(relay = %target, "All systems operational");
                }
                // Alert context moves only together with the relay.
                let record = self.commit(&mut state, kind, Some(target), detail, None)?;
                state.last_alert = Some(snapshot);
                state.last_poll_time = Some(record.timestamp);
                Ok(record)
            }
            PollOutcome::RateLimited { retry_after } => {
                let retry = match retry_after.as_deref() {
                    Some(v) if v.parse::<u64>().is_ok() => format!("{v}s"),
                    Some(v) => v.to_string(),
                    None => "unknown".to_string(),
                };
                tracing::warn!(retry_after = %retry, "Alert API rate limited; relay unchanged");
                let detail = format!("Rate limited (retry after {retry})");
                self.commit(&mut state, kind, None, detail, Some(429))
            }
            PollOutcome::AuthFailed => {
                tracing::error!("Alert API rejected the API key (401); check ALERT_API_KEY");
                let detail = "Auth failed (invalid API key)".to_string();
                self.commit(&mut state, kind, None, detail, Some(401))
            }
            PollOutcome::ApiError { status } => {
                tracing::warn!(status, "Alert API error; relay unchanged");
                let detail = format!("API error: {status}");
                self.commit(&mut state, kind, None, detail, Some(status))
            }
            PollOutcome::TransportError(message) => {
                tracing::warn!(error = %message, "Alert API unreachable; forcing relay OFF");
                self.commit(&mut state, kind, Some(RelayState::Off), message, None)
            }
        }
    }

    /// Force the relay to the requested state, bypassing evaluation.
    pub fn set_manual(&self, on: bool) -> Result<PollRecord, DeviceError> {
        let mut state = self.lock();
        self.manual(&mut state, RelayState::from_bool(on))
    }

    /// Flip the relay. Reading and writing happen under the same lock.
    pub fn toggle(&self) -> Result<PollRecord, DeviceError> {
        let mut state = self.lock();
        let target = state.relay_state.toggled();
        self.manual(&mut state, target)
    }

    fn manual(&self, state: &mut ControllerState, target: RelayState) -> Result<PollRecord, DeviceError> {
        tracing::info!(relay = %target, "Manual override");
        let detail = format!("Manual override: relay {target}");
        self.commit(state, OutcomeKind::ManualOverride, Some(target), detail, None)
    }

    fn commit(
        &self,
        state: &mut ControllerState,
        kind: OutcomeKind,
        target: Option<RelayState>,
        detail: String,
        status_code: Option<u16>,
    ) -> Result<PollRecord, DeviceError> {
        let written = match target {
            Some(t) => state.actuate(t).map(|()| Some(t)),
            None => Ok(None),
        };

        let record = match &written {
            Ok(resulting) => PollRecord::new(kind, *resulting, detail),
            Err(e) => PollRecord::new(kind, None, format!("{detail}; device write failed: {e}")),
        }
        .with_status(status_code);

        self.history.append(record.clone());
        metrics::record_poll_outcome(kind);
        metrics::record_relay_state(state.relay_state);

        match written {
            Ok(_) => Ok(record),
            Err(e) => {
                metrics::record_device_error();
                tracing::error!(
                    error = %e,
                    device = %state.device.describe(),
                    outcome = kind.as_str(),
                    "Relay write failed; physical state unknown"
                );
                Err(e)
            }
        }
    }

    /// Final OFF write and device release. Only the first call does
    /// anything.
    pub fn shutdown(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if state.released {
            return Ok(());
        }

        let off = state.actuate(RelayState::Off);
        state.released = true;
        let release = state.device.release();
        metrics::record_relay_state(state.relay_state);

        match (&off, &release) {
            (Ok(()), Ok(())) => {
                tracing::info!(device = %state.device.describe(), "Relay OFF, output released");
            }
            _ => {
                tracing::error!(
                    device = %state.device.describe(),
                    off_error = ?off.as_ref().err(),
                    release_error = ?release.as_ref().err(),
                    "Relay shutdown incomplete"
                );
            }
        }
        off.and(release)
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.lock();
        ControllerSnapshot {
            relay_state: state.relay_state,
            last_poll_time: state.last_poll_time,
            last_alert: state.last_alert.clone(),
            api_url: self.api_url.clone(),
            poll_interval_ms: self.poll_interval.as_millis() as u64,
        }
    }

    pub fn relay_state(&self) -> RelayState {
        self.lock().relay_state
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    pub fn history(&self) -> &Arc<PollHistory> {
        &self.history
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl std::fmt::Debug for RelayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayController")
            .field("relay_state", &self.relay_state())
            .field("api_url", &self.api_url)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::FailingTarget;
    use crate::relay::{SimulatedOutput, SimulatedProbe};

    fn controller(capacity: usize) -> (RelayController, SimulatedProbe) {
        let device = SimulatedOutput::new();
        let probe = device.probe();
        let controller = RelayController::new(
            Box::new(device),
            Arc::new(PollHistory::new(capacity)),
            "http://localhost:8000/api/v1/alert-status",
            Duration::from_secs(30),
        );
        (controller, probe)
    }

    fn success(alert: bool) -> PollOutcome {
        let failing_targets = if alert {
            vec![FailingTarget { name: "db".into(), failures: 3, threshold: 3 }]
        } else {
            Vec::new()
        };
        PollOutcome::Success(AlertSnapshot {
            alert,
            failing_count: failing_targets.len() as u32,
            failing_targets,
        })
    }

    #[test]
    fn test_initial_state() {
        let (controller, probe) = controller(50);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.relay_state, RelayState::Off);
        assert!(snapshot.last_poll_time.is_none());
        assert!(snapshot.last_alert.is_none());
        assert_eq!(snapshot.poll_interval_ms, 30_000);
        assert!(controller.history().is_empty());
        assert!(probe.writes().is_empty());
    }

    #[test]
    fn test_alert_turns_relay_on() {
        let (controller, probe) = controller(50);
        let record = controller.evaluate(success(true)).unwrap();

        assert_eq!(controller.relay_state(), RelayState::On);
        assert_eq!(record.kind, OutcomeKind::Success);
        assert_eq!(record.relay_state, Some(RelayState::On));
        assert!(record.detail.contains("db (3/3)"));
        assert_eq!(probe.last_write(), Some(RelayState::On));
        assert_eq!(controller.snapshot().last_poll_time, Some(record.timestamp));
    }

    #[test]
    fn test_clear_turns_relay_off() {
        let (controller, probe) = controller(50);
        controller.evaluate(success(true)).unwrap();
        let record = controller.evaluate(success(false)).unwrap();

        assert_eq!(controller.relay_state(), RelayState::Off);
        assert_eq!(record.detail, "All systems operational");
        assert_eq!(probe.writes(), vec![RelayState::On, RelayState::Off]);
    }

    #[test]
    fn test_repeated_success_rewrites_device() {
        let (controller, probe) = controller(50);
        controller.evaluate(success(true)).unwrap();
        controller.evaluate(success(true)).unwrap();
        assert_eq!(probe.writes(), vec![RelayState::On, RelayState::On]);
    }

    #[test]
    fn test_rate_limit_freezes_state() {
        let (controller, probe) = controller(50);
        controller.evaluate(success(true)).unwrap();
        let alert_before = controller.snapshot().last_alert;

        let record = controller
            .evaluate(PollOutcome::RateLimited { retry_after: Some("30".into()) })
            .unwrap();

        assert_eq!(controller.relay_state(), RelayState::On);
        assert_eq!(controller.snapshot().last_alert, alert_before);
        assert_eq!(record.kind, OutcomeKind::RateLimited);
        assert_eq!(record.relay_state, None);
        assert_eq!(record.detail, "Rate limited (retry after 30s)");
        assert_eq!(record.status_code, Some(429));
        assert_eq!(probe.writes().len(), 1);
    }

    #[test]
    fn test_rate_limit_without_retry_after() {
        let (controller, _) = controller(50);
        let record = controller
            .evaluate(PollOutcome::RateLimited { retry_after: None })
            .unwrap();
        assert_eq!(record.detail, "Rate limited (retry after unknown)");
    }

    #[test]
    fn test_auth_and_api_errors_freeze_state() {
        let (controller, probe) = controller(50);
        controller.evaluate(success(true)).unwrap();

        let auth = controller.evaluate(PollOutcome::AuthFailed).unwrap();
        assert_eq!(auth.kind, OutcomeKind::AuthFailed);
        assert!(auth.detail.contains("invalid API key"));
        assert_eq!(controller.relay_state(), RelayState::On);

        let api = controller.evaluate(PollOutcome::ApiError { status: 503 }).unwrap();
        assert_eq!(api.kind, OutcomeKind::ApiError);
        assert!(api.detail.contains("503"));
        assert_eq!(controller.relay_state(), RelayState::On);
        assert_eq!(probe.writes().len(), 1);
    }

    #[test]
    fn test_transport_error_fails_safe() {
        let (controller, probe) = controller(50);
        controller.evaluate(success(true)).unwrap();
        let alert_before = controller.snapshot().last_alert;
        let poll_before = controller.snapshot().last_poll_time;

        let record = controller
            .evaluate(PollOutcome::TransportError("connection refused".into()))
            .unwrap();

        assert_eq!(controller.relay_state(), RelayState::Off);
        assert_eq!(controller.snapshot().last_alert, alert_before);
        assert_eq!(controller.snapshot().last_poll_time, poll_before);
        assert_eq!(record.kind, OutcomeKind::TransportError);
        assert_eq!(record.relay_state, Some(RelayState::Off));
        assert_eq!(record.detail, "connection refused");
        assert_eq!(probe.last_write(), Some(RelayState::Off));
    }

    #[test]
    fn test_state_follows_outcome_sequence() {
        let (controller, _) = controller(50);
        let steps = vec![
            (success(true), RelayState::On),
            (PollOutcome::AuthFailed, RelayState::On),
            (PollOutcome::TransportError("timeout".into()), RelayState::Off),
            (PollOutcome::ApiError { status: 500 }, RelayState::Off),
            (success(true), RelayState::On),
            (PollOutcome::RateLimited { retry_after: None }, RelayState::On),
            (success(false), RelayState::Off),
        ];

        for (i, (outcome, expected)) in steps.into_iter().enumerate() {
            controller.evaluate(outcome).unwrap();
            assert_eq!(controller.relay_state(), expected, "step {i}");
        }
        assert_eq!(controller.history().len(), 7);
    }

    #[test]
    fn test_manual_on_then_off() {
        let (controller, probe) = controller(50);
        controller.evaluate(success(false)).unwrap();
        let poll_before = controller.snapshot().last_poll_time;

        controller.set_manual(true).unwrap();
        controller.set_manual(false).unwrap();

        assert_eq!(controller.relay_state(), RelayState::Off);
        let history = controller.history().snapshot();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].kind, OutcomeKind::ManualOverride);
        assert_eq!(history[0].relay_state, Some(RelayState::Off));
        assert_eq!(history[1].kind, OutcomeKind::ManualOverride);
        assert_eq!(history[1].relay_state, Some(RelayState::On));
        assert_eq!(controller.snapshot().last_poll_time, poll_before);
        assert_eq!(probe.writes(), vec![RelayState::Off, RelayState::On, RelayState::Off]);
    }

    #[test]
    fn test_manual_overrides_alert_until_next_poll() {
        let (controller, _) = controller(50);
        controller.evaluate(success(true)).unwrap();
        controller.set_manual(false).unwrap();
        assert_eq!(controller.relay_state(), RelayState::Off);

        controller.evaluate(success(true)).unwrap();
        assert_eq!(controller.relay_state(), RelayState::On);
    }

    #[test]
    fn test_toggle_flips_state() {
        let (controller, _) = controller(50);
        assert_eq!(controller.toggle().unwrap().relay_state, Some(RelayState::On));
        assert_eq!(controller.toggle().unwrap().relay_state, Some(RelayState::Off));
        assert_eq!(controller.relay_state(), RelayState::Off);
    }

    #[test]
    fn test_device_failure_keeps_committed_state() {
        let (controller, probe) = controller(50);
        controller.evaluate(success(true)).unwrap();

        probe.set_fault(Some("relay driver not responding"));
        let err = controller.evaluate(success(false)).unwrap_err();
        assert!(matches!(err, DeviceError::Fault(_)));

        assert_eq!(controller.relay_state(), RelayState::On);
        let snapshot = controller.snapshot();
        assert!(snapshot.last_alert.as_ref().is_some_and(|a| a.alert));
        assert_eq!(snapshot.last_poll_time, Some(controller.history().snapshot()[1].timestamp));
        let newest = &controller.history().snapshot()[0];
        assert_eq!(newest.kind, OutcomeKind::Success);
        assert_eq!(newest.relay_state, None);
        assert!(newest.detail.contains("device write failed"));

        assert!(controller.set_manual(false).is_err());
        assert_eq!(controller.history().len(), 3);
    }

    #[test]
    fn test_shutdown_writes_off_and_releases_once() {
        let (controller, probe) = controller(50);
        controller.set_manual(true).unwrap();

        controller.shutdown().unwrap();
        controller.shutdown().unwrap();

        assert_eq!(probe.last_write(), Some(RelayState::Off));
        assert_eq!(probe.release_count(), 1);
        assert!(controller.is_released());
        assert!(matches!(controller.set_manual(true), Err(DeviceError::Released)));
        assert_eq!(probe.release_count(), 1);
    }

    #[test]
    fn test_concurrent_calls_do_not_lose_updates() {
        let (controller, probe) = controller(1_000);

        std::thread::scope(|s| {
            for worker in 0..8usize {
                let controller = &controller;
                s.spawn(move || {
                    for step in 0..50usize {
                        if (worker + step) % 3 == 0 {
                            controller.set_manual(step % 2 == 0).unwrap();
                        } else if step % 7 == 0 {
                            controller.toggle().unwrap();
                        } else {
                            controller.evaluate(success((worker + step) % 2 == 1)).unwrap();
                        }
                    }
                });
            }
        });

        let history = controller.history().snapshot();
        assert_eq!(history.len(), 400);
        assert_eq!(probe.writes().len(), 400);

        // The newest entry is the last commit, and it matches both the
        // controller and the hardware.
        assert_eq!(history[0].relay_state, Some(controller.relay_state()));
        assert_eq!(probe.last_write(), Some(controller.relay_state()));

        // History order is commit order, which is device write order.
        let recorded: Vec<_> = history.iter().rev().filter_map(|r| r.relay_state).collect();
        assert_eq!(recorded, probe.writes());
    }
}
