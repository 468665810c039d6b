//! Integration tests for Monogram.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p monogram-cli -- migrate run
//!
//! # Start the app backend
//! cargo run -p monogram-app
//!
//! # Run integration tests
//! cargo test -p monogram-integration-tests -- --ignored
//! ```
//!
//! The tests sign their own session tokens and proxy query strings with
//! `SHOPIFY_API_KEY` / `SHOPIFY_API_SECRET`, which must match the values the
//! running app backend was started with.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Base URL of the running app backend (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("MONOGRAM_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// HTTP client that does not follow redirects, so the save endpoint's
/// confirmation redirect stays observable.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// App client ID the backend was started with.
#[must_use]
pub fn api_key() -> String {
    std::env::var("SHOPIFY_API_KEY").unwrap_or_else(|_| "test-client-id".to_string())
}

/// App client secret the backend was started with.
#[must_use]
pub fn api_secret() -> String {
    std::env::var("SHOPIFY_API_SECRET").unwrap_or_else(|_| "test-client-secret".to_string())
}

/// Shop the tests act as.
#[must_use]
pub fn test_shop() -> String {
    std::env::var("MONOGRAM_TEST_SHOP").unwrap_or_else(|_| "monogram-test.myshopify.com".to_string())
}

/// Sign an embedded-admin session token for the test shop, valid around
/// `now_unix`.
///
/// # Panics
///
/// Panics if the HMAC key is rejected (it never is for non-empty secrets).
#[must_use]
pub fn session_token(shop: &str, now_unix: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "iss": format!("https://{shop}/admin"),
        "dest": format!("https://{shop}"),
        "aud": api_key(),
        "sub": "1",
        "exp": now_unix + 60,
        "nbf": now_unix - 10,
        "iat": now_unix - 10,
        "jti": "integration-test",
        "sid": "integration-test-session",
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());

    #[allow(clippy::unwrap_used)]
    let mut mac = HmacSha256::new_from_slice(api_secret().as_bytes()).unwrap();
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{header}.{payload}.{signature}")
}

/// Build a signed app-proxy query string from decoded parameters.
///
/// # Panics
///
/// Panics if the HMAC key is rejected (it never is for non-empty secrets).
#[must_use]
pub fn signed_proxy_query(params: &[(&str, &str)]) -> String {
    let mut sorted: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (k, v) in params {
        sorted.entry(k).or_default().push(v);
    }
    let message: String = sorted
        .iter()
        .map(|(k, vals)| format!("{k}={}", vals.join(",")))
        .collect();

    #[allow(clippy::unwrap_used)]
    let mut mac = HmacSha256::new_from_slice(api_secret().as_bytes()).unwrap();
    mac.update(message.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let mut query = url_encoded(params);
    query.push_str(&format!("&signature={signature}"));
    query
}

fn url_encoded(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
