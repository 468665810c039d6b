//! Configuration record model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use monogram_core::{ProductKey, ShopDomain};

/// One persisted configuration per `(shop, product_id)` pair.
///
/// `configuration_json` is an opaque serialized payload owned by the external
/// editor; the backend never interprets it. `None` and the empty string both
/// read back as "no configuration", but a row with a `NULL` payload is a
/// distinct persisted state from no row at all (a batch entry may explicitly
/// clear a product's configuration).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConfigurationRecord {
    /// Owning shop; lookups scoped to another shop must never match.
    pub shop: ShopDomain,
    /// Canonical (bare numeric) product identifier, unique within a shop.
    pub product_id: ProductKey,
    /// Opaque editor payload.
    pub configuration_json: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API view of a configuration record, as served to the embedded admin UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationView {
    pub product_id: ProductKey,
    pub configuration_json: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConfigurationRecord> for ConfigurationView {
    fn from(record: ConfigurationRecord) -> Self {
        Self {
            product_id: record.product_id,
            configuration_json: record.configuration_json,
            updated_at: record.updated_at,
        }
    }
}
