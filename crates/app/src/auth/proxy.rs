//! Storefront app-proxy signature verification.
//!
//! Requests that reach the app through the Shopify app proxy carry a
//! `signature` query parameter: the hex HMAC-SHA256 (keyed with the app
//! client secret) of the remaining query parameters, sorted by name, each
//! rendered as `name=value` with repeated values joined by commas, and
//! concatenated without a separator. The signed `shop` parameter is the only
//! source of tenant identity on this tier.

use std::collections::BTreeMap;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use monogram_core::ShopDomain;

use crate::routes::proxy::cors_headers;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur while validating a proxied request.
#[derive(Debug, thiserror::Error)]
pub enum ProxySignatureError {
    /// No `signature` parameter was present.
    #[error("missing signature parameter")]
    MissingSignature,
    /// The signature did not match the query parameters.
    #[error("invalid signature")]
    InvalidSignature,
    /// No `shop` parameter was present in the signed query.
    #[error("missing shop parameter")]
    MissingShop,
    /// The `shop` parameter is not a valid shop domain.
    #[error("invalid shop parameter: {0}")]
    InvalidShop(String),
}

/// A validated storefront proxy request context.
#[derive(Debug, Clone)]
pub struct ProxyContext {
    /// Shop resolved from the signed `shop` parameter.
    pub shop: ShopDomain,
    /// Customer ID when the storefront visitor is logged in.
    pub logged_in_customer_id: Option<String>,
}

/// Verify the proxy signature over a raw query string and extract the
/// storefront context.
///
/// # Errors
///
/// Returns a `ProxySignatureError` when the signature is absent or wrong,
/// or when the signed parameters do not identify a shop. Every variant maps
/// to an authorization rejection; no store access happens on failure.
pub fn verify_proxy_request(
    query: &str,
    api_secret: &str,
) -> Result<ProxyContext, ProxySignatureError> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    let signature = params
        .remove("signature")
        .and_then(|mut v| v.pop())
        .ok_or(ProxySignatureError::MissingSignature)?;
    let provided =
        hex::decode(&signature).map_err(|_| ProxySignatureError::InvalidSignature)?;

    // Sorted name=value pairs, repeated values comma-joined, no separator
    let message: String = params
        .iter()
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect();

    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .map_err(|_| ProxySignatureError::InvalidSignature)?;
    mac.update(message.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| ProxySignatureError::InvalidSignature)?;

    let shop_param = params
        .get("shop")
        .and_then(|v| v.first())
        .ok_or(ProxySignatureError::MissingShop)?;
    let shop = ShopDomain::parse(shop_param)
        .map_err(|e| ProxySignatureError::InvalidShop(e.to_string()))?;

    let logged_in_customer_id = params
        .get("logged_in_customer_id")
        .and_then(|v| v.first())
        .filter(|v| !v.is_empty())
        .cloned();

    Ok(ProxyContext {
        shop,
        logged_in_customer_id,
    })
}

// =============================================================================
// Extractor
// =============================================================================

/// Extractor that requires a validated storefront proxy context.
///
/// # Example
///
/// ```rust,ignore
/// async fn proxied_handler(
///     RequireProxyContext(ctx): RequireProxyContext,
/// ) -> impl IntoResponse {
///     format!("storefront request from {}", ctx.shop)
/// }
/// ```
pub struct RequireProxyContext(pub ProxyContext);

/// Error returned when the proxy signature is missing or invalid.
///
/// Proxy responses are consumed cross-origin by storefront scripts, so the
/// rejection carries the same CORS headers as successful responses.
pub struct ProxyRejection;

impl IntoResponse for ProxyRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            cors_headers(),
            "invalid proxy signature",
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for RequireProxyContext {
    type Rejection = ProxyRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or("");

        match verify_proxy_request(query, state.config().shopify().api_secret()) {
            Ok(ctx) => Ok(Self(ctx)),
            Err(e) => {
                tracing::debug!(error = %e, "proxy request rejected");
                Err(ProxyRejection)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const API_SECRET: &str = "shpss_proxy_test_secret";

    /// Sign a set of decoded parameters the way the app proxy does.
    fn sign(params: &[(&str, &str)]) -> String {
        let mut sorted: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (k, v) in params {
            sorted.entry(k).or_default().push(v);
        }
        let message: String = sorted
            .iter()
            .map(|(k, vals)| format!("{k}={}", vals.join(",")))
            .collect();
        let mut mac = HmacSha256::new_from_slice(API_SECRET.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn query_with_signature(params: &[(&str, &str)]) -> String {
        let signature = sign(params);
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in params {
            serializer.append_pair(k, v);
        }
        serializer.append_pair("signature", &signature);
        serializer.finish()
    }

    #[test]
    fn test_verify_valid_request() {
        let query = query_with_signature(&[
            ("shop", "demo-store.myshopify.com"),
            ("path_prefix", "/apps/monogram"),
            ("timestamp", "1700000000"),
            ("productId", "123"),
        ]);

        let ctx = verify_proxy_request(&query, API_SECRET).unwrap();
        assert_eq!(ctx.shop.as_str(), "demo-store.myshopify.com");
        assert!(ctx.logged_in_customer_id.is_none());
    }

    #[test]
    fn test_verify_extracts_logged_in_customer() {
        let query = query_with_signature(&[
            ("shop", "demo-store.myshopify.com"),
            ("logged_in_customer_id", "777"),
            ("timestamp", "1700000000"),
        ]);

        let ctx = verify_proxy_request(&query, API_SECRET).unwrap();
        assert_eq!(ctx.logged_in_customer_id.as_deref(), Some("777"));
    }

    #[test]
    fn test_verify_repeated_values_join_with_comma() {
        let query = query_with_signature(&[
            ("shop", "demo-store.myshopify.com"),
            ("extra", "1"),
            ("extra", "2"),
            ("timestamp", "1700000000"),
        ]);

        assert!(verify_proxy_request(&query, API_SECRET).is_ok());
    }

    #[test]
    fn test_verify_rejects_missing_signature() {
        let err = verify_proxy_request("shop=demo-store.myshopify.com", API_SECRET).unwrap_err();
        assert!(matches!(err, ProxySignatureError::MissingSignature));
    }

    #[test]
    fn test_verify_rejects_tampered_params() {
        let query = query_with_signature(&[
            ("shop", "demo-store.myshopify.com"),
            ("productId", "123"),
        ]);
        let tampered = query.replace("productId=123", "productId=999");

        let err = verify_proxy_request(&tampered, API_SECRET).unwrap_err();
        assert!(matches!(err, ProxySignatureError::InvalidSignature));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let query = query_with_signature(&[("shop", "demo-store.myshopify.com")]);

        let err = verify_proxy_request(&query, "another-secret").unwrap_err();
        assert!(matches!(err, ProxySignatureError::InvalidSignature));
    }

    #[test]
    fn test_verify_rejects_non_hex_signature() {
        let err = verify_proxy_request(
            "shop=demo-store.myshopify.com&signature=zz-not-hex",
            API_SECRET,
        )
        .unwrap_err();
        assert!(matches!(err, ProxySignatureError::InvalidSignature));
    }

    #[test]
    fn test_verify_requires_shop() {
        let signature = sign(&[("productId", "123")]);
        let query = format!("productId=123&signature={signature}");

        let err = verify_proxy_request(&query, API_SECRET).unwrap_err();
        assert!(matches!(err, ProxySignatureError::MissingShop));
    }

    #[test]
    fn test_verify_rejects_invalid_shop() {
        let signature = sign(&[("shop", "not-a-hostname")]);
        let query = format!("shop=not-a-hostname&signature={signature}");

        let err = verify_proxy_request(&query, API_SECRET).unwrap_err();
        assert!(matches!(err, ProxySignatureError::InvalidShop(_)));
    }
}
