//! # Shop Repository
//!
//! Installed shops and their storefront display settings.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use tierline_core::StorefrontSettings;

/// Repository for shop database operations.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    /// Creates a new ShopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Registers a shop, or replaces its settings if it already exists.
    ///
    /// `settings = None` keeps the defaults.
    pub async fn upsert(&self, domain: &str, settings: Option<&StorefrontSettings>) -> DbResult<()> {
        let settings_json = settings.map(serde_json::to_string).transpose()?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO shops (domain, settings_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(domain) DO UPDATE SET
                settings_json = excluded.settings_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(domain)
        .bind(settings_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(shop = %domain, "Shop saved");
        Ok(())
    }

    /// Checks whether the shop is installed.
    pub async fn exists(&self, domain: &str) -> DbResult<bool> {
        let found: Option<String> = sqlx::query_scalar("SELECT domain FROM shops WHERE domain = ?1")
            .bind(domain)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Returns the storefront settings of a shop.
    ///
    /// ## Returns
    /// The stored settings, or [`StorefrontSettings::default`] when the shop
    /// is unknown, has none, or the stored JSON no longer parses (logged).
    pub async fn settings(&self, domain: &str) -> DbResult<StorefrontSettings> {
        let stored: Option<Option<String>> =
            sqlx::query_scalar("SELECT settings_json FROM shops WHERE domain = ?1")
                .bind(domain)
                .fetch_optional(&self.pool)
                .await?;

        let Some(json) = stored.flatten() else {
            return Ok(StorefrontSettings::default());
        };

        match serde_json::from_str(&json) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(shop = %domain, error = %e, "Stored storefront settings are invalid, using defaults");
                Ok(StorefrontSettings::default())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
