//! REST API handlers and router assembly.

pub mod chatbot;
pub mod error;
pub mod scan;
pub mod system;
pub mod weather;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Maximum accepted upload size for scan images (25 MB).
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Assemble the application router.
///
/// CORS is permissive: the API serves browser and mobile clients from
/// arbitrary origins.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/status", get(system::get_status))
        .route("/api/health", get(system::get_health))
        .route("/api/scan/detect", post(scan::detect))
        .route("/api/chatbot", post(chatbot::chat))
        .route("/api/weather", get(weather::get_forecast))
        .route("/api/weather/provinces", get(weather::list_provinces))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
