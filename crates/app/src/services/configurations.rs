//! Configuration resolve and batch-upsert services.
//!
//! Both trust tiers funnel through [`resolve`]; the admin save form funnels
//! through [`apply_batch`]. Tenant identity always arrives as an explicit
//! [`ShopDomain`] resolved by the caller's auth extractor - nothing in this
//! module reads an ambient shop.

use serde::Deserialize;
use sqlx::PgPool;

use monogram_core::{ProductKey, ShopDomain};

use crate::db::{ConfigurationRepository, RepositoryError};

// =============================================================================
// Resolve (read path)
// =============================================================================

/// Outcome of a configuration lookup.
///
/// Presence is derived from payload truthiness, not row existence: a missing
/// row, a `NULL` payload and an empty-string payload all resolve to "no
/// configuration".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfiguration {
    pub has_config: bool,
    pub configuration_json: Option<String>,
}

impl ResolvedConfiguration {
    /// Derive the resolution from a stored payload (or its absence).
    #[must_use]
    pub fn from_payload(payload: Option<String>) -> Self {
        let has_config = payload.as_deref().is_some_and(|p| !p.is_empty());
        Self {
            has_config,
            configuration_json: payload,
        }
    }

    /// The resolution for a product with no record.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            has_config: false,
            configuration_json: None,
        }
    }
}

/// Look up the configuration for one product within a shop.
///
/// The product identifier may arrive in either the bare numeric or the
/// global-id form; it is normalized here. An identifier that matches
/// nothing resolves to "no configuration" - never an error.
///
/// # Errors
///
/// Returns `RepositoryError` if the store itself fails; callers convert
/// that to the fail-closed response shape.
pub async fn resolve(
    pool: &PgPool,
    shop: &ShopDomain,
    product_id: &str,
) -> Result<ResolvedConfiguration, RepositoryError> {
    let key = ProductKey::normalize(product_id);
    let record = ConfigurationRepository::new(pool).get(shop, &key).await?;

    Ok(record.map_or_else(ResolvedConfiguration::absent, |r| {
        ResolvedConfiguration::from_payload(r.configuration_json)
    }))
}

// =============================================================================
// Batch upsert (write path)
// =============================================================================

/// One entry of the editor's save form, as JSON-encoded text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigEntry {
    product_id: String,
    #[serde(default)]
    configuration_json: Option<serde_json::Value>,
}

/// A parsed, normalized upsert pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertPair {
    pub product_id: ProductKey,
    pub configuration_json: Option<String>,
}

/// Counts of what happened to a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Pairs persisted.
    pub applied: usize,
    /// Entries skipped for parse failure.
    pub skipped: usize,
}

/// Parse raw form entries into normalized upsert pairs, preserving order.
///
/// Malformed entries are dropped with a logged diagnostic; one bad entry
/// never blocks the rest. Returns the pairs plus the skip count.
#[must_use]
pub fn parse_entries(raw_entries: &[String]) -> (Vec<UpsertPair>, usize) {
    let mut pairs = Vec::with_capacity(raw_entries.len());
    let mut skipped = 0;

    for raw in raw_entries {
        match serde_json::from_str::<ConfigEntry>(raw) {
            Ok(entry) => pairs.push(UpsertPair {
                product_id: ProductKey::normalize(&entry.product_id),
                configuration_json: payload_text(entry.configuration_json),
            }),
            Err(e) => {
                skipped += 1;
                tracing::warn!(error = %e, entry = %raw, "skipping malformed configuration entry");
            }
        }
    }

    (pairs, skipped)
}

/// Render the submitted payload value as stored text.
///
/// The editor posts either a JSON document, a pre-serialized string, or
/// null; strings are stored as-is, documents re-serialized compactly.
fn payload_text(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    }
}

/// Persist a batch of editor entries for one shop.
///
/// Pairs are applied in input order, so a later entry for the same product
/// wins. There is no all-or-nothing guarantee beyond per-pair atomicity:
/// parse failures are skipped and the batch continues.
///
/// # Errors
///
/// Returns `RepositoryError` if the store fails while applying a pair;
/// pairs already applied stay applied (each is an independent unit of work).
pub async fn apply_batch(
    pool: &PgPool,
    shop: &ShopDomain,
    raw_entries: &[String],
) -> Result<BatchOutcome, RepositoryError> {
    let (pairs, skipped) = parse_entries(raw_entries);

    let repo = ConfigurationRepository::new(pool);
    let mut applied = 0;
    for pair in &pairs {
        repo.upsert(shop, &pair.product_id, pair.configuration_json.as_deref())
            .await?;
        applied += 1;
    }

    if skipped > 0 {
        tracing::warn!(applied, skipped, shop = %shop, "configuration batch applied partially");
    } else {
        tracing::info!(applied, shop = %shop, "configuration batch applied");
    }

    Ok(BatchOutcome { applied, skipped })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_from_payload() {
        let hit = ResolvedConfiguration::from_payload(Some(r#"{"color":"red"}"#.to_string()));
        assert!(hit.has_config);
        assert_eq!(hit.configuration_json.as_deref(), Some(r#"{"color":"red"}"#));
    }

    #[test]
    fn test_resolution_null_payload_is_no_config() {
        let miss = ResolvedConfiguration::from_payload(None);
        assert!(!miss.has_config);
        assert!(miss.configuration_json.is_none());
    }

    #[test]
    fn test_resolution_empty_payload_is_no_config() {
        // A row with an empty payload still reports "no configuration"
        let miss = ResolvedConfiguration::from_payload(Some(String::new()));
        assert!(!miss.has_config);
    }

    #[test]
    fn test_resolution_absent() {
        assert_eq!(
            ResolvedConfiguration::absent(),
            ResolvedConfiguration::from_payload(None)
        );
    }

    #[test]
    fn test_parse_entries_normalizes_gid() {
        let raw = vec![
            r#"{"productId":"gid://shopify/Product/123","configurationJson":{"color":"red"}}"#
                .to_string(),
        ];
        let (pairs, skipped) = parse_entries(&raw);

        assert_eq!(skipped, 0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.first().unwrap().product_id.as_str(), "123");
        assert_eq!(
            pairs.first().unwrap().configuration_json.as_deref(),
            Some(r#"{"color":"red"}"#)
        );
    }

    #[test]
    fn test_parse_entries_accepts_string_payload() {
        let raw =
            vec![r#"{"productId":"5","configurationJson":"{\"size\":10}"}"#.to_string()];
        let (pairs, _) = parse_entries(&raw);

        assert_eq!(
            pairs.first().unwrap().configuration_json.as_deref(),
            Some(r#"{"size":10}"#)
        );
    }

    #[test]
    fn test_parse_entries_null_payload_clears() {
        let raw = vec![r#"{"productId":"5","configurationJson":null}"#.to_string()];
        let (pairs, _) = parse_entries(&raw);

        assert!(pairs.first().unwrap().configuration_json.is_none());
    }

    #[test]
    fn test_parse_entries_missing_payload_clears() {
        let raw = vec![r#"{"productId":"5"}"#.to_string()];
        let (pairs, skipped) = parse_entries(&raw);

        assert_eq!(skipped, 0);
        assert!(pairs.first().unwrap().configuration_json.is_none());
    }

    #[test]
    fn test_parse_entries_skips_malformed_and_keeps_rest() {
        let raw = vec![
            r#"{"productId":"1","configurationJson":{"a":1}}"#.to_string(),
            "not json at all".to_string(),
            r#"{"configurationJson":{"a":1}}"#.to_string(), // missing productId
            r#"{"productId":"2","configurationJson":{"b":2}}"#.to_string(),
        ];
        let (pairs, skipped) = parse_entries(&raw);

        assert_eq!(skipped, 2);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.first().unwrap().product_id.as_str(), "1");
        assert_eq!(pairs.get(1).unwrap().product_id.as_str(), "2");
    }

    #[test]
    fn test_parse_entries_preserves_input_order() {
        // A later entry for the same product must come later, so it wins
        let raw = vec![
            r#"{"productId":"9","configurationJson":{"v":"first"}}"#.to_string(),
            r#"{"productId":"9","configurationJson":{"v":"second"}}"#.to_string(),
        ];
        let (pairs, _) = parse_entries(&raw);

        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs.last().unwrap().configuration_json.as_deref(),
            Some(r#"{"v":"second"}"#)
        );
    }
}
