//! serve subcommand
//!
//! Starts the backend server.

use clap::Args;

/// Arguments for the serve subcommand
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long, default_value = "5000", env = "TROPISCAN_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "TROPISCAN_HOST")]
    pub host: String,
}
