//! # Discount Repository
//!
//! Stored discount configurations.
//!
//! ## Record Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  discounts                                                              │
//! │                                                                         │
//! │  id │ shop_domain │ kind │ status │ configuration_json │ starts_at ... │
//! │     │             │      │   ▲    │   full config      │                │
//! │     │             │      │   │    │   (re-validated    │                │
//! │     │             │      │   │    │    on every read)  │                │
//! │                           external scheduler writes status              │
//! │                                                                         │
//! │  Read path: row ──► DiscountConfiguration::from_json ──► kind check    │
//! │             ──► status column copied over the JSON status              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tierline_core::{validation, CoreError, DiscountConfiguration, DiscountKind, DiscountStatus};

/// Columns needed to rebuild a configuration.
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: String,
    kind: DiscountKind,
    status: DiscountStatus,
    configuration_json: String,
}

impl DiscountRow {
    /// Parses the JSON and applies the authoritative columns.
    fn into_configuration(self) -> DbResult<DiscountConfiguration> {
        let mut config = DiscountConfiguration::from_json(&self.configuration_json)
            .map_err(|e| DbError::invalid_record(&self.id, e))?;

        if config.kind() != self.kind {
            return Err(DbError::invalid_record(
                &self.id,
                CoreError::KindMismatch {
                    discount_id: self.id.clone(),
                    expected: self.kind,
                    actual: config.kind(),
                },
            ));
        }

        config.status = self.status;
        Ok(config)
    }
}

/// Repository for discount database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Lists the ACTIVE configurations of a shop, oldest first.
    ///
    /// Window filtering is left to the caller, which owns the clock.
    ///
    /// ## Errors
    /// `DbError::InvalidRecord` when any stored configuration no longer
    /// validates. The whole call fails rather than silently dropping it.
    pub async fn list_active_for_shop(&self, shop: &str) -> DbResult<Vec<DiscountConfiguration>> {
        let rows: Vec<DiscountRow> = sqlx::query_as(
            r#"
            SELECT id, kind, status, configuration_json
            FROM discounts
            WHERE shop_domain = ?1 AND status = ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(shop)
        .bind(DiscountStatus::Active)
        .fetch_all(&self.pool)
        .await?;

        debug!(shop = %shop, count = rows.len(), "Loaded active discounts");

        rows.into_iter().map(DiscountRow::into_configuration).collect()
    }

    /// Gets a configuration by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DiscountConfiguration>> {
        let row: Option<DiscountRow> = sqlx::query_as(
            "SELECT id, kind, status, configuration_json FROM discounts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DiscountRow::into_configuration).transpose()
    }

    /// Inserts or replaces a configuration.
    ///
    /// The configuration is validated first; the denormalized columns are
    /// derived from it.
    pub async fn upsert(&self, shop: &str, config: &DiscountConfiguration) -> DbResult<()> {
        validation::validate_configuration(config).map_err(|source| {
            DbError::invalid_record(
                &config.id,
                CoreError::InvalidConfiguration {
                    discount_id: config.id.clone(),
                    source,
                },
            )
        })?;

        let configuration_json = serde_json::to_string(config)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, shop_domain, kind, status, title, configuration_json,
                starts_at, ends_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                status = excluded.status,
                title = excluded.title,
                configuration_json = excluded.configuration_json,
                starts_at = excluded.starts_at,
                ends_at = excluded.ends_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&config.id)
        .bind(shop)
        .bind(config.kind())
        .bind(config.status)
        .bind(&config.title)
        .bind(configuration_json)
        .bind(config.window.starts_at)
        .bind(config.window.ends_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(discount_id = %config.id, shop = %shop, kind = %config.kind(), "Discount saved");
        Ok(())
    }

    /// Updates only the status column.
    pub async fn set_status(&self, id: &str, status: DiscountStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE discounts SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }
        Ok(())
    }

    /// Counts the discounts of a shop, any status.
    pub async fn count_for_shop(&self, shop: &str) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM discounts WHERE shop_domain = ?1")
            .bind(shop)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
