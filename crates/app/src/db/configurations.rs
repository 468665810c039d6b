//! Configuration store repository.
//!
//! One row per `(shop, product_id)`; `product_id` is always the canonical
//! bare-numeric form (callers normalize before reaching this layer). All
//! reads and writes are scoped by shop.

use sqlx::PgPool;

use monogram_core::{ProductKey, ShopDomain};

use super::RepositoryError;
use crate::models::ConfigurationRecord;

/// Repository for configuration record database operations.
pub struct ConfigurationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConfigurationRepository<'a> {
    /// Create a new configuration repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the configuration record for one product within a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        shop: &ShopDomain,
        product_id: &ProductKey,
    ) -> Result<Option<ConfigurationRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, ConfigurationRecord>(
            r"
            SELECT shop, product_id, configuration_json, created_at, updated_at
            FROM configurations
            WHERE shop = $1 AND product_id = $2
            ",
        )
        .bind(shop)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Get the configuration records for a set of products within a shop.
    ///
    /// Products without a record are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(
        &self,
        shop: &ShopDomain,
        product_ids: &[ProductKey],
    ) -> Result<Vec<ConfigurationRecord>, RepositoryError> {
        let ids: Vec<String> = product_ids.iter().map(|p| p.as_str().to_owned()).collect();

        let records = sqlx::query_as::<_, ConfigurationRecord>(
            r"
            SELECT shop, product_id, configuration_json, created_at, updated_at
            FROM configurations
            WHERE shop = $1 AND product_id = ANY($2)
            ORDER BY product_id
            ",
        )
        .bind(shop)
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// List every configuration record belonging to a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<ConfigurationRecord>, RepositoryError> {
        let records = sqlx::query_as::<_, ConfigurationRecord>(
            r"
            SELECT shop, product_id, configuration_json, created_at, updated_at
            FROM configurations
            WHERE shop = $1
            ORDER BY updated_at DESC
            ",
        )
        .bind(shop)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Insert or replace the configuration for one product within a shop.
    ///
    /// Creates the record on first write; subsequent writes for the same
    /// `(shop, product_id)` replace the payload in place. A `None` payload is
    /// persisted as `NULL` (the record stays, the configuration is cleared).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        shop: &ShopDomain,
        product_id: &ProductKey,
        configuration_json: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO configurations (shop, product_id, configuration_json)
            VALUES ($1, $2, $3)
            ON CONFLICT (shop, product_id) DO UPDATE SET
                configuration_json = EXCLUDED.configuration_json,
                updated_at = NOW()
            ",
        )
        .bind(shop)
        .bind(product_id)
        .bind(configuration_json)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
