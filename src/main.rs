//! Agora Server: real-time room broadcasting for the Agora posting backend
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use agora_api::AppState;
use agora_core::config::AppConfig;
use agora_core::error::AppError;
use agora_realtime::RealtimeEngine;
use agora_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("AGORA_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Agora v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: Real-time engine ─────────────────────────────────
    let engine = Arc::new(RealtimeEngine::new(&config.realtime));

    // ── Step 2: Scheduled jobs ───────────────────────────────────
    let mut scheduler = CronScheduler::new().await?;
    scheduler
        .register_default_tasks(&config.prompts, engine.bridge.clone())
        .await?;
    scheduler.start().await?;

    // ── Step 3: HTTP server ──────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let state = AppState::new(Arc::clone(&config), Arc::clone(&engine));
    let mut server = tokio::spawn(agora_api::run_server(state, async move {
        let _ = shutdown_rx.changed().await;
    }));

    tokio::select! {
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        }
        result = &mut server => {
            // The server stopped on its own, most likely a bind failure.
            scheduler.shutdown().await?;
            return result
                .map_err(|e| AppError::internal(format!("Server task failed: {e}")))?;
        }
    }

    // ── Step 4: Graceful shutdown ────────────────────────────────
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not stop cleanly");
    }
    engine.shutdown().await;
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => return Err(AppError::internal(format!("Server task failed: {e}"))),
        Err(_) => tracing::warn!(
            grace_seconds = grace.as_secs(),
            "Server did not drain within the grace period"
        ),
    }

    tracing::info!("Agora server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
