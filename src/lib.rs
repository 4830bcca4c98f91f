//! Tropiscan Backend Server
//!
//! Web API for the Tropiscan fruit-quality scanning app. Proxies scan
//! analysis to a supervised local AI sidecar and fronts the chatbot and
//! weather upstreams.

#![warn(missing_docs)]

/// Shared types (errors)
pub mod common;

/// REST API handlers
pub mod api;

/// Sidecar process supervision (launch + health gating)
pub mod sidecar;

/// Logging initialization utilities
pub mod logging;

/// Configuration management (environment variable helpers)
pub mod config;

/// CLI interface
pub mod cli;

/// Server startup / shutdown handling
pub mod server;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Shared HTTP client (connection pooling enabled)
    pub http_client: reqwest::Client,
    /// AI sidecar readiness coordinator
    pub supervisor: sidecar::SidecarSupervisor,
    /// Chatbot upstream configuration
    pub chatbot: config::ChatbotConfig,
    /// Weather upstream base URL
    pub weather_api_url: String,
}
