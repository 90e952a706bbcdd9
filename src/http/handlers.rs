//! Control surface handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::PollRecord;
use crate::http::server::AppState;
use crate::relay::{ControllerSnapshot, DeviceError, RelayState};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub api_url: String,
    pub poll_interval_ms: u64,
    pub relay_state: RelayState,
}

/// Body returned by every manual override endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct OverrideResponse {
    pub relay_state: RelayState,
    pub manual_override: bool,
    pub timestamp: DateTime<Utc>,
}

impl OverrideResponse {
    fn from_record(record: PollRecord, fallback: RelayState) -> Self {
        Self {
            relay_state: record.relay_state.unwrap_or(fallback),
            manual_override: true,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Return at most this many of the newest entries.
    pub limit: Option<usize>,
}

/// A failed relay write surfaced to the caller.
#[derive(Debug)]
pub struct ControlError(DeviceError);

impl From<DeviceError> for ControlError {
    fn from(e: DeviceError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "manual_override": false,
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<ControllerSnapshot> {
    Json(state.controller.snapshot())
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<PollRecord>> {
    let mut records = state.controller.history().snapshot();
    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    Json(records)
}

pub async fn post_toggle(
    State(state): State<AppState>,
) -> Result<Json<OverrideResponse>, ControlError> {
    let record = state.controller.toggle()?;
    Ok(Json(OverrideResponse::from_record(record, state.controller.relay_state())))
}

pub async fn post_on(State(state): State<AppState>) -> Result<Json<OverrideResponse>, ControlError> {
    let record = state.controller.set_manual(true)?;
    Ok(Json(OverrideResponse::from_record(record, RelayState::On)))
}

pub async fn post_off(State(state): State<AppState>) -> Result<Json<OverrideResponse>, ControlError> {
    let record = state.controller.set_manual(false)?;
    Ok(Json(OverrideResponse::from_record(record, RelayState::Off)))
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    let controller = &state.controller;
    Json(HealthStatus {
        status: "relay controller running".to_string(),
        api_url: controller.api_url().to_string(),
        poll_interval_ms: controller.poll_interval().as_millis() as u64,
        relay_state: controller.relay_state(),
    })
}
