//! Storefront-tier configuration endpoints.
//!
//! These are reached through the Shopify app proxy from public storefront
//! pages, so every response (rejections included) carries permissive CORS
//! headers, and the preflight `OPTIONS` answers `204` directly. The shop is
//! always the one named in the verified proxy signature - one deployment
//! serves many shops and must never conflate their storefronts.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use crate::auth::RequireProxyContext;
use crate::services::configurations as service;
use crate::state::AppState;

use super::configurations::{ConfigurationStatus, LookupParams, store_failure_response};

/// Build the storefront proxy router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/configuration", get(fetch).options(preflight))
        .route("/configuration/check", get(check).options(preflight))
}

/// CORS headers attached to every proxy-tier response.
pub(crate) fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ),
        (
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ),
    ]
}

/// Presence-only response for the storefront check endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HasConfig {
    pub has_config: bool,
}

/// Answer the CORS preflight.
pub async fn preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}

/// Does this product have a configuration?
///
/// Fails closed: a missing `productId` is `400 {"hasConfig": false}`, a
/// store failure `500` with the same shape. The surrounding storefront page
/// must keep rendering whatever happens here.
pub async fn check(
    RequireProxyContext(ctx): RequireProxyContext,
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Response {
    let Some(product_id) = params.product_id.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            cors_headers(),
            Json(HasConfig { has_config: false }),
        )
            .into_response();
    };

    match service::resolve(state.pool(), &ctx.shop, product_id).await {
        Ok(resolved) => (
            StatusCode::OK,
            cors_headers(),
            Json(HasConfig {
                has_config: resolved.has_config,
            }),
        )
            .into_response(),
        Err(e) => with_cors(store_failure_response(&e, &ctx.shop)),
    }
}

/// Serve the configuration payload to the storefront editor.
pub async fn fetch(
    RequireProxyContext(ctx): RequireProxyContext,
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Response {
    let Some(product_id) = params.product_id.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            cors_headers(),
            Json(ConfigurationStatus::absent()),
        )
            .into_response();
    };

    match service::resolve(state.pool(), &ctx.shop, product_id).await {
        Ok(resolved) => (
            StatusCode::OK,
            cors_headers(),
            Json(ConfigurationStatus::from(resolved)),
        )
            .into_response(),
        Err(e) => with_cors(store_failure_response(&e, &ctx.shop)),
    }
}

/// Stamp the CORS headers onto an already-built response.
fn with_cors(mut response: Response) -> Response {
    for (name, value) in cors_headers() {
        response.headers_mut().insert(name, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_has_config_serializes_camel_case() {
        let json = serde_json::to_value(HasConfig { has_config: true }).unwrap();
        assert_eq!(json["hasConfig"], true);
    }

    #[tokio::test]
    async fn test_preflight_is_no_content_with_cors() {
        let response = preflight().await.into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap(),
            "GET, OPTIONS"
        );
    }
}
