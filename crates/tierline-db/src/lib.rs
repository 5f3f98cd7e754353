//! # tierline-db: Database Layer for Tierline
//!
//! This crate is the configuration store behind the storefront proxy.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tierline Data Flow                               │
//! │                                                                         │
//! │  Storefront preview request                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tierline-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ShopRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ DiscountRepo  │    │ 001_initial  │  │   │
//! │  │   │               │    │ CustomerRepo  │    │  _schema.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (DATABASE_PATH)                                       │
//! │       ▲                                                                 │
//! │       │ status updates, customer ingestion (external services)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tierline_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tierline.db")).await?;
//! let configs = db.discounts().list_active_for_shop("demo.myshopify.com").await?;
//! let settings = db.shops().settings("demo.myshopify.com").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::discount::DiscountRepository;
pub use repository::shop::ShopRepository;
