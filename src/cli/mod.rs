//! CLI module for the Tropiscan backend.

pub mod serve;

use clap::{Parser, Subcommand};

/// Tropiscan backend - scan API with a supervised local AI sidecar
#[derive(Parser, Debug)]
#[command(name = "tropiscan")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    TROPISCAN_HOST                        Bind address (default: 0.0.0.0)
    TROPISCAN_PORT                        Listen port (default: 5000)
    TROPISCAN_LOG_LEVEL                   Log level (default: info)
    TROPISCAN_AI_SERVICE_URL              AI sidecar base URL (default: http://127.0.0.1:8000)
    TROPISCAN_SIDECAR_DIR                 Working directory for the spawned sidecar
    TROPISCAN_SIDECAR_COMMAND             Override the sidecar launch command line
    TROPISCAN_SIDECAR_STARTUP_TIMEOUT_MS  Readiness deadline (default: 30000)
    TROPISCAN_GEMINI_API_KEY              Chatbot upstream API key (optional)
    TROPISCAN_GEMINI_MODEL                Chatbot model (default: gemini-1.5-flash)
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the backend server
    Serve(serve::ServeArgs),
}
