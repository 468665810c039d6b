//! Offline Admin API token repository.
//!
//! The install flow (handled by the host platform, outside this service)
//! grants one offline access token per shop. The catalog client reads it to
//! fetch product summaries; the CLI writes and revokes it.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use monogram_core::ShopDomain;

use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// An offline Admin API access token for one shop.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopToken {
    /// Shop the token was granted for.
    pub shop: ShopDomain,
    /// Admin API access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl std::fmt::Debug for ShopToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopToken")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopTokenRow {
    shop: ShopDomain,
    access_token: String,
    scope: String,
    obtained_at: i64,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    #[allow(dead_code)]
    updated_at: DateTime<Utc>,
}

impl From<ShopTokenRow> for ShopToken {
    fn from(row: ShopTokenRow) -> Self {
        let scopes = row
            .scope
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            shop: row.shop,
            access_token: SecretString::from(row.access_token),
            scopes,
            obtained_at: row.obtained_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shop token database operations.
pub struct ShopTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopTokenRepository<'a> {
    /// Create a new shop token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the token for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<ShopToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopTokenRow>(
            r"
            SELECT shop, access_token, scope, obtained_at, created_at, updated_at
            FROM shop_token
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ShopToken::from))
    }

    /// Save or update the token for a shop.
    ///
    /// Uses upsert to handle both new and existing tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        scopes: &[String],
        obtained_at: i64,
    ) -> Result<(), RepositoryError> {
        let scope = scopes.join(",");

        sqlx::query(
            r"
            INSERT INTO shop_token (shop, access_token, scope, obtained_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                obtained_at = EXCLUDED.obtained_at,
                updated_at = NOW()
            ",
        )
        .bind(shop)
        .bind(access_token)
        .bind(scope)
        .bind(obtained_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete the token for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop_token
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if a shop has a token stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM shop_token WHERE shop = $1
            )
            ",
        )
        .bind(shop)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
