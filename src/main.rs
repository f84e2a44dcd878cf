use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber;

use tollgate::admission::AdmissionRegistry;
use tollgate::config::TollgateConfig;
use tollgate::http::{AppState, HttpServer};
use tollgate::overview::NoPersistence;
use tollgate::usage::UsageLedger;

#[derive(Parser, Debug)]
#[command(version, about = "API gateway admission and usage core")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Tollgate");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match args.config {
        Some(path) => TollgateConfig::from_file(&path)?,
        None => TollgateConfig::default(),
    };
    info!(http_addr = %config.server.http_addr, "Configuration loaded");

    let registry = Arc::new(AdmissionRegistry::new());
    let ledger = Arc::new(UsageLedger::new());
    info!("Admission registry and usage ledger initialized");

    let state = AppState {
        ledger,
        registry,
        // The persistent database layer is an external collaborator; without
        // one the overview serves in-memory data only.
        stats: Arc::new(NoPersistence),
        admission: Arc::new(config.admission.clone()),
    };

    let server = HttpServer::new(config.server.http_addr, state);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Tollgate stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
