//! Shop token management commands.
//!
//! The embedded app needs one offline Admin API token per shop to fetch
//! catalog summaries. The install flow normally stores it; these commands
//! exist for initial setup and rotation.
//!
//! # Usage
//!
//! ```bash
//! mg-cli token set -s demo-store.myshopify.com -t shpat_... --scopes read_products
//! mg-cli token revoke -s demo-store.myshopify.com
//! mg-cli token status -s demo-store.myshopify.com
//! ```
//!
//! # Environment Variables
//!
//! - `MONOGRAM_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)

use sqlx::PgPool;
use thiserror::Error;

use monogram_core::{ShopDomain, ShopDomainError};

use super::migrate::database_url;

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid shop domain.
    #[error("Invalid shop domain: {0}")]
    InvalidShop(#[from] ShopDomainError),

    /// Empty access token.
    #[error("Access token cannot be empty")]
    EmptyToken,
}

/// Store (or replace) a shop's offline Admin API token.
///
/// # Errors
///
/// Returns `TokenError` if the shop domain or token is invalid, or the
/// database operation fails.
pub async fn set(shop: &str, access_token: &str, scopes: &str) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let shop = ShopDomain::parse(shop)?;
    if access_token.is_empty() {
        return Err(TokenError::EmptyToken);
    }

    let pool = connect().await?;
    let obtained_at = chrono::Utc::now().timestamp();

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
    .bind(shop.as_str())
    .bind(access_token)
    .bind(scopes)
    .bind(obtained_at)
    .execute(&pool)
    .await?;

    tracing::info!("Token stored for {shop}");
    Ok(())
}

/// Delete a shop's token.
///
/// # Errors
///
/// Returns `TokenError` if the shop domain is invalid or the database
/// operation fails.
pub async fn revoke(shop: &str) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let shop = ShopDomain::parse(shop)?;
    let pool = connect().await?;

    let result = sqlx::query("DELETE FROM shop_token WHERE shop = $1")
        .bind(shop.as_str())
        .execute(&pool)
        .await?;

    if result.rows_affected() > 0 {
        tracing::info!("Token revoked for {shop}");
    } else {
        tracing::warn!("No token stored for {shop}");
    }
    Ok(())
}

/// Report whether a shop has a token stored.
///
/// # Errors
///
/// Returns `TokenError` if the shop domain is invalid or the database
/// operation fails.
pub async fn status(shop: &str) -> Result<(), TokenError> {
    dotenvy::dotenv().ok();

    let shop = ShopDomain::parse(shop)?;
    let pool = connect().await?;

    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT scope, obtained_at FROM shop_token WHERE shop = $1")
            .bind(shop.as_str())
            .fetch_optional(&pool)
            .await?;

    match row {
        Some((scope, obtained_at)) => {
            tracing::info!("Token stored for {shop} (scopes: [{scope}], obtained_at: {obtained_at})");
        }
        None => tracing::info!("No token stored for {shop}"),
    }
    Ok(())
}

async fn connect() -> Result<PgPool, TokenError> {
    let url =
        database_url().map_err(|_| TokenError::MissingEnvVar("MONOGRAM_DATABASE_URL"))?;
    Ok(PgPool::connect(&url).await?)
}
