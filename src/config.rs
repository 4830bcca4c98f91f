//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to deprecated variable names with warning logs, plus typed config structs
//! for the server, the sidecar supervisor, and the chatbot upstream.
//!
//! The deprecated names (`PORT`, `PYTHON_SERVICE_URL`, `GEMINI_API_KEY`)
//! are still honored so older deployments keep working; the preferred names
//! all carry the `TROPISCAN_` prefix.

use std::time::Duration;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        if old_name != new_name {
            tracing::warn!(
                "Environment variable '{}' is deprecated, use '{}' instead",
                old_name,
                new_name
            );
        }
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns the default when neither variable is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Base URL of the AI inference sidecar
///
/// From `TROPISCAN_AI_SERVICE_URL` (deprecated: `PYTHON_SERVICE_URL`),
/// defaulting to the loopback address the sidecar binds in development.
pub fn ai_service_url() -> String {
    get_env_with_fallback_or(
        "TROPISCAN_AI_SERVICE_URL",
        "PYTHON_SERVICE_URL",
        "http://127.0.0.1:8000",
    )
}

/// Base URL of the weather forecast upstream (overridable for tests)
pub fn weather_api_url() -> String {
    get_env_with_fallback_or(
        "TROPISCAN_WEATHER_API_URL",
        "TROPISCAN_WEATHER_API_URL",
        "https://api.open-meteo.com",
    )
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
}

impl ServerConfig {
    /// Load server configuration from environment variables.
    pub fn from_env() -> Self {
        let host = get_env_with_fallback_or("TROPISCAN_HOST", "TROPISCAN_HOST", "0.0.0.0");
        let port = get_env_with_fallback_parse("TROPISCAN_PORT", "PORT", 5000u16);
        Self { host, port }
    }

    /// Build a configuration from explicit CLI arguments.
    pub fn from_args(host: String, port: u16) -> Self {
        Self { host, port }
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sidecar supervisor timing configuration
///
/// Interval and deadline are explicit parameters rather than hard-coded
/// constants so tests can run the readiness loop with near-zero intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Timeout for a single health probe request.
    pub probe_timeout: Duration,
    /// Pause between health probes while waiting for the sidecar to come up.
    pub poll_interval: Duration,
    /// Default overall deadline for `ensure_ready` callers that do not
    /// provide their own.
    pub startup_deadline: Duration,
}

impl SupervisorConfig {
    /// Load supervisor timings from environment variables.
    pub fn from_env() -> Self {
        let probe_timeout_ms = get_env_with_fallback_parse(
            "TROPISCAN_SIDECAR_PROBE_TIMEOUT_MS",
            "TROPISCAN_SIDECAR_PROBE_TIMEOUT_MS",
            1_500u64,
        );
        let poll_interval_ms = get_env_with_fallback_parse(
            "TROPISCAN_SIDECAR_POLL_INTERVAL_MS",
            "TROPISCAN_SIDECAR_POLL_INTERVAL_MS",
            1_000u64,
        );
        let startup_timeout_ms = get_env_with_fallback_parse(
            "TROPISCAN_SIDECAR_STARTUP_TIMEOUT_MS",
            "TROPISCAN_SIDECAR_STARTUP_TIMEOUT_MS",
            30_000u64,
        );

        Self {
            probe_timeout: Duration::from_millis(probe_timeout_ms),
            poll_interval: Duration::from_millis(poll_interval_ms),
            startup_deadline: Duration::from_millis(startup_timeout_ms),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(1_500),
            poll_interval: Duration::from_millis(1_000),
            startup_deadline: Duration::from_millis(30_000),
        }
    }
}

/// Chatbot upstream configuration
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    /// API key for the language-model upstream. `None` disables upstream
    /// calls and the handler degrades to a canned answer.
    pub api_key: Option<String>,
    /// Model identifier sent to the upstream.
    pub model: String,
    /// Upstream base URL (overridable for tests).
    pub api_url: String,
}

impl ChatbotConfig {
    /// Load chatbot configuration from environment variables.
    pub fn from_env() -> Self {
        let api_key = get_env_with_fallback("TROPISCAN_GEMINI_API_KEY", "GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty());
        let model = get_env_with_fallback_or(
            "TROPISCAN_GEMINI_MODEL",
            "GEMINI_MODEL",
            "gemini-1.5-flash",
        );
        let api_url = get_env_with_fallback_or(
            "TROPISCAN_GEMINI_API_URL",
            "TROPISCAN_GEMINI_API_URL",
            "https://generativelanguage.googleapis.com",
        );
        Self {
            api_key,
            model,
            api_url,
        }
    }
}
