//! # Customer Repository
//!
//! Resolves storefront customer ids to emails.
//!
//! The storefront only sends `logged_in_customer_id`, while customer gating
//! compares emails. External ingestion fills this table; the proxy only reads.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Repository for customer lookups.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Stores or replaces a customer's email.
    pub async fn upsert(&self, shop: &str, customer_id: &str, email: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (shop_domain, customer_id, email, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(shop_domain, customer_id) DO UPDATE SET
                email = excluded.email,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(shop)
        .bind(customer_id)
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the email of a shop's customer, if known.
    pub async fn email_for(&self, shop: &str, customer_id: &str) -> DbResult<Option<String>> {
        let email = sqlx::query_scalar(
            "SELECT email FROM customers WHERE shop_domain = ?1 AND customer_id = ?2",
        )
        .bind(shop)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(email)
    }
}
