//! Unified error types (thiserror-based).
//!
//! `AppError` is the application-level taxonomy surfaced by the HTTP API;
//! `SidecarError` covers the sidecar supervisor's internal failure cases,
//! which are absorbed into a boolean at the coordinator boundary and never
//! reach callers as errors.

use axum::http::StatusCode;
use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Request validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream HTTP service error (weather, language model, sidecar relay)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Upstream request timed out
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// A dependent service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns a safe error message for external clients.
    ///
    /// Full error details (addresses, ports, upstream payloads) stay in the
    /// server logs; clients only ever see these generic messages.
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid request",
            Self::Upstream(_) => "Upstream service unavailable",
            Self::Timeout(_) => "Request timeout",
            Self::ServiceUnavailable(_) => "Service temporarily unavailable",
            Self::Internal(_) => "Internal server error",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Sidecar supervisor error type
///
/// These never cross the coordinator boundary: `ensure_ready` logs the
/// sub-case where it is detected and reports plain `false` upward.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// No usable local execution environment was found
    #[error("No usable Python runtime found: {0}")]
    RuntimeUnavailable(String),

    /// The spawn syscall itself failed
    #[error("Failed to spawn sidecar process: {0}")]
    Spawn(String),

    /// The process exited before becoming healthy
    #[error("Sidecar exited before becoming healthy (exit code: {0:?})")]
    LaunchFailure(Option<i32>),

    /// The readiness deadline elapsed
    #[error("Sidecar did not become healthy within {0} ms")]
    DeadlineExceeded(u128),
}

/// Result type alias (application)
pub type AppResult<T> = Result<T, AppError>;
