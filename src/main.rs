//! Tropiscan Backend Server Entry Point

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tropiscan::cli::{Cli, Commands};
use tropiscan::config::{self, ServerConfig, SupervisorConfig};
use tropiscan::sidecar::{SidecarSupervisor, SidecarTarget, UvicornLauncher};
use tropiscan::{logging, server, AppState};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => {
            logging::init().expect("failed to initialize logging");
            let config = ServerConfig::from_args(args.host, args.port);
            run_server(config).await;
        }
        None => {
            // No subcommand - default to serve
            logging::init().expect("failed to initialize logging");
            let config = ServerConfig::from_env();
            run_server(config).await;
        }
    }
}

async fn run_server(config: ServerConfig) {
    info!("Tropiscan backend v{}", env!("CARGO_PKG_VERSION"));

    // Shared HTTP client (connection pooling enabled); created early because
    // the supervisor and every proxy handler use it.
    let http_client = reqwest::Client::builder()
        .pool_max_idle_per_host(32)
        .pool_idle_timeout(std::time::Duration::from_secs(60))
        .tcp_keepalive(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client");

    let target = SidecarTarget::resolve(&config::ai_service_url());
    info!(
        target = %target.base_url(),
        is_local = target.is_local,
        "AI sidecar target resolved"
    );

    let launcher = Arc::new(UvicornLauncher::from_env());
    let supervisor = SidecarSupervisor::new(
        target,
        http_client.clone(),
        launcher,
        SupervisorConfig::from_env(),
    );

    // Startup probe: log whether the sidecar is already warm. Launching
    // stays lazy; the first scan request triggers it when needed.
    if supervisor.probe_once().await.is_healthy() {
        info!("AI sidecar is already healthy");
    } else {
        info!("AI sidecar is not responding yet; it will be launched on demand");
    }

    let state = AppState {
        http_client,
        supervisor,
        chatbot: config::ChatbotConfig::from_env(),
        weather_api_url: config::weather_api_url(),
    };

    server::run(state, &config.bind_addr()).await;
}
