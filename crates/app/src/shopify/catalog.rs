//! Product catalog lookups via the Admin GraphQL API.
//!
//! GraphQL requests go through reqwest directly with hand-written response
//! types; the query surface is one `nodes(ids:)` lookup.

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use monogram_core::ShopDomain;

/// Header carrying the per-shop Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Product summary lookup by global ID.
const PRODUCT_SUMMARIES_QUERY: &str = r"
query ProductSummaries($ids: [ID!]!) {
  nodes(ids: $ids) {
    ... on Product {
      id
      title
      featuredImage {
        url
        altText
      }
    }
  }
}
";

/// Errors from the catalog client.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Transport-level failure talking to the Admin API.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("api returned status {0}")]
    Status(reqwest::StatusCode),
    /// The API answered with GraphQL errors.
    #[error("graphql error: {0}")]
    GraphQL(String),
    /// The response envelope had no data.
    #[error("empty response")]
    EmptyResponse,
}

/// A product summary for display next to its configuration.
///
/// Carries only what the admin pages render; the configuration store never
/// persists any of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Global ID (`gid://shopify/Product/<n>`).
    pub id: String,
    pub title: String,
    pub featured_image: Option<ProductImage>,
}

/// Featured image of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub alt_text: Option<String>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NodesData {
    nodes: Vec<Option<ProductSummary>>,
}

// =============================================================================
// Client
// =============================================================================

/// Admin GraphQL client for catalog lookups.
///
/// Stateless apart from the connection pool inside reqwest; the per-shop
/// access token is supplied per call because one deployment serves many
/// shops.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    api_version: String,
}

impl CatalogClient {
    /// Create a new catalog client for the given Admin API version.
    #[must_use]
    pub fn new(api_version: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_version: api_version.to_owned(),
        }
    }

    /// Fetch product summaries for a list of global IDs.
    ///
    /// Missing or deleted products are simply absent from the result; the
    /// caller gets fewer summaries than IDs, never an error for them.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails, the API answers with a
    /// non-success status, or the response carries GraphQL errors.
    #[instrument(skip(self, access_token), fields(shop = %shop, count = ids.len()))]
    pub async fn product_summaries(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        ids: &[String],
    ) -> Result<Vec<ProductSummary>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "https://{shop}/admin/api/{version}/graphql.json",
            version = self.api_version
        );
        let body = GraphQLRequest {
            query: PRODUCT_SUMMARIES_QUERY,
            variables: serde_json::json!({ "ids": ids }),
        };

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCESS_TOKEN_HEADER, access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        let envelope: GraphQLResponse<NodesData> = response.json().await?;

        if let Some(errors) = envelope.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(CatalogError::GraphQL(messages.join("; ")));
        }

        let data = envelope.data.ok_or(CatalogError::EmptyResponse)?;
        Ok(data.nodes.into_iter().flatten().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_nodes_are_filtered() {
        // Deleted products come back as null entries in `nodes`
        let raw = r#"{
            "data": {
                "nodes": [
                    {"id": "gid://shopify/Product/1", "title": "Mug", "featuredImage": null},
                    null,
                    {"id": "gid://shopify/Product/3", "title": "Tee",
                     "featuredImage": {"url": "https://cdn.example/tee.png", "altText": "tee"}}
                ]
            }
        }"#;

        let envelope: GraphQLResponse<NodesData> = serde_json::from_str(raw).unwrap();
        let products: Vec<ProductSummary> =
            envelope.data.unwrap().nodes.into_iter().flatten().collect();

        assert_eq!(products.len(), 2);
        assert_eq!(products.first().unwrap().title, "Mug");
        assert!(products.first().unwrap().featured_image.is_none());
        assert_eq!(
            products
                .get(1)
                .unwrap()
                .featured_image
                .as_ref()
                .unwrap()
                .url,
            "https://cdn.example/tee.png"
        );
    }

    #[test]
    fn test_graphql_errors_deserialize() {
        let raw = r#"{"data": null, "errors": [{"message": "Invalid ID"}]}"#;
        let envelope: GraphQLResponse<NodesData> = serde_json::from_str(raw).unwrap();

        assert!(envelope.data.is_none());
        assert_eq!(
            envelope.errors.unwrap().first().unwrap().message,
            "Invalid ID"
        );
    }
}
