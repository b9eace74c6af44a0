use anyhow::Result;
use chrono::Utc;
use hydromon_alert::AlertEngine;
use hydromon_storage::sqlite::SqliteLogStore;
use hydromon_storage::LogSink;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

use hydromon_server::app;
use hydromon_server::config::ServerConfig;
use hydromon_server::ingest::{self, ReadingIngest};
use hydromon_server::state::AppState;

const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  hydromon-server [config.toml]    Start the server (default: config/server.toml)");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hydromon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        other => run_server(other.unwrap_or("config/server.toml")).await,
    }
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = if Path::new(config_path).exists() {
        ServerConfig::load(config_path)?
    } else {
        tracing::warn!(path = %config_path, "Config file not found, using defaults");
        ServerConfig::default()
    };

    hydromon_common::id::init(config.id.machine_id, config.id.node_id);

    let thresholds = Arc::new(config.threshold_table()?);
    tracing::info!(
        http_port = config.http_port,
        data_dir = %config.data_dir,
        thresholds = thresholds.len(),
        "hydromon-server starting"
    );

    let store = Arc::new(SqliteLogStore::new(Path::new(&config.data_dir))?);

    let mut engine = AlertEngine::new(thresholds.clone(), store.clone())
        .with_history_capacity(config.history_capacity);
    // Active alerts start empty; only the recent history is restored
    match store.list(config.history_capacity) {
        Ok(entries) => {
            tracing::info!(entries = entries.len(), "Restored alert history");
            engine.preload_history(entries);
        }
        Err(e) => tracing::error!(error = %e, "Failed to restore alert history"),
    }
    let engine = Arc::new(Mutex::new(engine));

    let (reading_ingest, rx) = ReadingIngest::new();
    let worker = ingest::spawn_worker(engine.clone(), rx);

    let state = AppState {
        engine,
        store,
        thresholds,
        ingest: Arc::new(reading_ingest),
        start_time: Utc::now(),
        config: Arc::new(config.clone()),
    };

    let http_addr: SocketAddr = config.http_addr().parse()?;
    let app = app::build_http_app(state.clone());
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    tracing::info!(http = %http_addr, "Server started");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await;
    if let Err(e) = result {
        tracing::error!(error = %e, "HTTP server error");
    }

    // Dropping the last ingest handle lets the worker finish its current reading
    drop(state);
    match tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Ingest worker failed"),
        Err(_) => tracing::warn!("Ingest worker did not stop in time"),
    }
    tracing::info!("Server stopped");

    Ok(())
}
