//! System status API
//!
//! Aggregate connectivity endpoints used by the app's settings screen and
//! by deploy probes. These report the sidecar's state as observed; they
//! never trigger a launch.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: String,
    ai_service: &'static str,
    sidecar_process: &'static str,
}

/// GET /status
///
/// Legacy component map: `ai_service` is "connected" when a single probe
/// succeeds right now, "disconnected" otherwise.
pub async fn get_status(State(state): State<AppState>) -> Response {
    let ai_service = if state.supervisor.probe_once().await.is_healthy() {
        "connected"
    } else {
        "disconnected"
    };

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        ai_service,
        sidecar_process: state.supervisor.process_state().as_str(),
    })
    .into_response()
}

#[derive(Debug, Serialize)]
struct HealthComponents {
    ai_service: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: String,
    pid: u32,
    components: HealthComponents,
    sidecar_process: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sidecar_started_at: Option<DateTime<Utc>>,
    /// The sidecar's own health document, relayed verbatim when reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_details: Option<serde_json::Value>,
}

/// GET /api/health
pub async fn get_health(State(state): State<AppState>) -> Response {
    let ai_details = state.supervisor.fetch_health_details().await;

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        pid: std::process::id(),
        components: HealthComponents {
            ai_service: ai_details.is_some(),
        },
        sidecar_process: state.supervisor.process_state().as_str(),
        sidecar_started_at: state.supervisor.process_started_at(),
        ai_details,
    })
    .into_response()
}
