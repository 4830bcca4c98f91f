//! Logging initialization
//!
//! Structured stderr logging via `tracing`. The filter comes from
//! `TROPISCAN_LOG_LEVEL` (full `EnvFilter` directives accepted), defaulting
//! to `info`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Errors if a subscriber is already installed (double initialization).
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("TROPISCAN_LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to set tracing subscriber: {err}"))
}
