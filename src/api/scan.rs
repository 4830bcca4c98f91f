//! Scan analysis proxy
//!
//! Forwards uploaded fruit images to the AI sidecar's `/detect` endpoint.
//! The handler gates every request on the sidecar supervisor: when the
//! service cannot be made ready before the configured deadline, the client
//! receives a 503 instead of a connection error, and no request reaches a
//! half-started process.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use crate::common::error::AppError;
use crate::AppState;

use super::error::ApiError;

/// Multipart fields relayed to the sidecar besides the image itself.
const PASSTHROUGH_FIELDS: &[&str] = &["batch_id", "lat", "lon"];

/// POST /api/scan/detect
///
/// Multipart upload: `file` (required image), optional `batch_id`, `lat`,
/// `lon`. The sidecar's JSON verdict is relayed verbatim with its status
/// code.
pub async fn detect(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    if !state.supervisor.ensure_ready_default().await {
        warn!("Rejecting scan request: AI sidecar is not ready");
        return Err(AppError::ServiceUnavailable(
            "AI analysis sidecar did not become ready".to_string(),
        )
        .into());
    }

    let mut form = reqwest::multipart::Form::new();
    let mut has_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let file_name = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| "upload.jpg".to_string());
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|err| AppError::Validation(format!("failed to read upload: {err}")))?;

            let mut part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name);
            if let Some(content_type) = content_type {
                part = part
                    .mime_str(&content_type)
                    .map_err(|err| AppError::Validation(format!("bad content type: {err}")))?;
            }
            form = form.part("file", part);
            has_file = true;
        } else if PASSTHROUGH_FIELDS.contains(&name.as_str()) {
            let value = field
                .text()
                .await
                .map_err(|err| AppError::Validation(format!("failed to read field: {err}")))?;
            form = form.text(name, value);
        }
        // Unknown fields are dropped rather than rejected; mobile clients
        // have shipped extra metadata fields before.
    }

    if !has_file {
        return Err(AppError::Validation("an image file is required".to_string()).into());
    }

    let url = format!("{}/detect", state.supervisor.target().base_url());
    let response = state
        .http_client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|err| {
            warn!(error = %err, "Scan forwarding to sidecar failed");
            AppError::Upstream(err.to_string())
        })?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.map_err(|err| {
        warn!(error = %err, "Sidecar returned a malformed detect response");
        AppError::Upstream(err.to_string())
    })?;

    Ok((status, Json(body)).into_response())
}
