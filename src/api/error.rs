//! API error response type
//!
//! Shared error handling for axum handlers.

use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::common::error::AppError;

/// Error response wrapper for axum
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // external_message() avoids exposing internal details (addresses,
        // ports, upstream payloads); full errors go to the server logs at
        // the point of detection.
        let status = self.0.status_code();
        let payload = json!({
            "error": self.0.external_message()
        });

        (status, Json(payload)).into_response()
    }
}
