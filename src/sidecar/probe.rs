//! Sidecar health probing
//!
//! A probe is a single bounded-timeout `GET /health` against the target.
//! The sidecar being down is an expected transient state, not a bug, so a
//! probe never fails: every error path collapses into
//! [`HealthStatus::Unhealthy`]. Retry policy lives in the supervisor.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::target::SidecarTarget;

/// Ephemeral health verdict. Each probe produces a fresh one; nothing is
/// cached between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The service answered `2xx` with a truthy `status` field.
    Healthy,
    /// Everything else: connection failure, timeout, non-2xx, malformed or
    /// negative body.
    Unhealthy,
}

impl HealthStatus {
    /// Returns true for [`HealthStatus::Healthy`].
    pub fn is_healthy(self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Issue one health probe against `target` with the given timeout.
///
/// The health contract: `2xx` plus a JSON body whose `status` field is
/// truthy (non-empty string, `true`, or nonzero number). The sidecar
/// reports `{"status": "healthy", ...}` once its model runtime is loaded.
pub async fn probe_health(client: &Client, target: &SidecarTarget, timeout: Duration) -> HealthStatus {
    let url = format!("{}/health", target.base_url());

    let response = match client.get(&url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(err) => {
            debug!(url = %url, error = %err, "Sidecar health probe failed to connect");
            return HealthStatus::Unhealthy;
        }
    };

    if !response.status().is_success() {
        debug!(url = %url, status = %response.status(), "Sidecar health probe returned non-success status");
        return HealthStatus::Unhealthy;
    }

    let body: serde_json::Value = match response.json().await {
        Ok(body) => body,
        Err(err) => {
            debug!(url = %url, error = %err, "Sidecar health probe returned a malformed body");
            return HealthStatus::Unhealthy;
        }
    };

    if status_field_is_truthy(&body) {
        HealthStatus::Healthy
    } else {
        debug!(url = %url, body = %body, "Sidecar health body did not assert a positive status");
        HealthStatus::Unhealthy
    }
}

/// Fetch the sidecar's raw health document, if reachable.
///
/// Used by the aggregate status endpoints to relay the sidecar's own
/// diagnostics; readiness decisions go through [`probe_health`].
pub async fn fetch_health_details(
    client: &Client,
    target: &SidecarTarget,
    timeout: Duration,
) -> Option<serde_json::Value> {
    let url = format!("{}/health", target.base_url());
    let response = client.get(&url).timeout(timeout).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.json().await.ok()
}

fn status_field_is_truthy(body: &serde_json::Value) -> bool {
    match body.get("status") {
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}
