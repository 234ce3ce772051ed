//! AuthCenter Server
//!
//! Connects to the database, applies migrations, then runs the background
//! session cleanup until shutdown. Rate limiters are per-process state, so
//! their sweep belongs to whichever process embeds `AuthService`.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use authcenter_auth::{SessionCleanup, SessionStore};
use authcenter_core::config::AppConfig;
use authcenter_core::error::AppError;
use authcenter_database::DatabasePool;
use authcenter_database::repositories::PgSessionRepository;

#[tokio::main]
async fn main() {
    let env = std::env::var("AUTHCENTER_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
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

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AuthCenter v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    let before = db.schema_state().await?;
    if before.dirty {
        tracing::warn!(latest = ?before.latest_version, "Schema has a failed migration");
    }
    authcenter_database::migration::run_migrations(db.pool()).await?;
    let after = db.schema_state().await?;
    tracing::info!(
        applied = after.applied,
        newly_applied = after.applied - before.applied,
        latest = ?after.latest_version,
        "Schema ready"
    );

    // ── Step 2: Session store ────────────────────────────────────
    let session_repo = Arc::new(PgSessionRepository::new(db.pool().clone()));
    let session_store = Arc::new(SessionStore::new(session_repo, &config.session));

    // ── Step 3: Background cleanup ───────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = SessionCleanup::new(session_store, config.session.cleanup_interval());
    let cleanup_handle = tokio::spawn(async move { cleanup.run(shutdown_rx).await });
    tracing::info!(
        interval_minutes = config.session.cleanup_interval_minutes,
        "Session cleanup started"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    if let Err(e) = cleanup_handle.await {
        tracing::error!(error = %e, "Cleanup task did not stop cleanly");
    }

    db.close().await;
    tracing::info!("AuthCenter stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
