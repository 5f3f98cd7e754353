//! # Tierline Storefront Proxy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Theme block ───► App proxy ───► storefront-proxy (8080) ───► SQLite   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tierline_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use storefront_proxy::{build_router, AppState, ProxyConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Tierline storefront proxy...");

    // Load configuration
    let config = ProxyConfig::load()?;
    info!(
        addr = %config.bind_address(),
        path = %config.proxy_path,
        db = %config.database_path,
        "Configuration loaded"
    );
    if !config.signature_required {
        warn!("App proxy signature checks are disabled");
    }

    // Open database (runs migrations)
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready");

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    let state = Arc::new(AppState { db, config });
    let app = build_router(state.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tierline=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
