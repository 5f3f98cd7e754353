//! # Tierline Storefront Proxy
//!
//! HTTP endpoint behind the shop's app proxy. Product pages ask it which
//! quantity breakpoints apply to the variant on screen.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET|POST  {PROXY_PATH}   preview entries for one variant               │
//! │  GET       /health        "OK" while the database answers               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables, see [`config`]:
//! - `DATABASE_PATH` - SQLite file written by the admin side
//! - `SHOPIFY_API_SECRET` - Secret that signs app proxy requests
//! - `PROXY_PORT` - HTTP port (default: 8080)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tierline_db::Database;

// Re-exports
pub use config::ProxyConfig;
pub use error::{ProxyError, ProxyResult};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ProxyConfig,
}

/// Builds the proxy router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let proxy_path = state.config.proxy_path.clone();

    Router::new()
        .route(&proxy_path, get(routes::preview_get).post(routes::preview_post))
        .route("/health", get(routes::health_handler))
        .with_state(state)
}
