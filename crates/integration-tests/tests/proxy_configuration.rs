//! Integration tests for the storefront proxy tier.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The app backend running (cargo run -p monogram-app)
//! - `SHOPIFY_API_KEY` / `SHOPIFY_API_SECRET` matching the backend's
//!
//! Run with: cargo test -p monogram-integration-tests -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use serde_json::Value;

use monogram_integration_tests::{base_url, client, session_token, signed_proxy_query, test_shop};

fn now_unix() -> i64 {
    #[allow(clippy::unwrap_used)]
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Save one configuration through the admin tier so the proxy has data.
async fn seed_configuration(client: &Client, product_id: &str, payload: &str) {
    let shop = test_shop();
    let entry = serde_json::json!({
        "productId": product_id,
        "configurationJson": payload,
    });

    let resp = client
        .post(format!("{}/api/configurations", base_url()))
        .bearer_auth(session_token(&shop, now_unix()))
        .form(&[("configs", entry.to_string())])
        .send()
        .await
        .expect("Failed to save configuration");

    assert!(resp.status().is_redirection() || resp.status().is_success());
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
#[ignore = "Requires running app backend and database"]
async fn test_unsigned_request_is_unauthorized() {
    let client = client();

    let resp = client
        .get(format!(
            "{}/proxy/configuration/check?productId=123&shop={}",
            base_url(),
            test_shop()
        ))
        .send()
        .await
        .expect("Failed to reach proxy endpoint");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running app backend and database"]
async fn test_tampered_signature_is_unauthorized() {
    let client = client();
    let shop = test_shop();
    let query = signed_proxy_query(&[("shop", &shop), ("productId", "123")]);
    let tampered = query.replace("productId=123", "productId=999");

    let resp = client
        .get(format!("{}/proxy/configuration/check?{tampered}", base_url()))
        .send()
        .await
        .expect("Failed to reach proxy endpoint");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Lookup behavior
// ============================================================================

#[tokio::test]
#[ignore = "Requires running app backend and database"]
async fn test_missing_product_id_is_bad_request_with_safe_shape() {
    let client = client();
    let shop = test_shop();
    let query = signed_proxy_query(&[("shop", &shop)]);

    let resp = client
        .get(format!("{}/proxy/configuration/check?{query}", base_url()))
        .send()
        .await
        .expect("Failed to reach proxy endpoint");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Body must be valid JSON");
    assert_eq!(body["hasConfig"], false);
}

#[tokio::test]
#[ignore = "Requires running app backend and database"]
async fn test_unknown_product_has_no_config() {
    let client = client();
    let shop = test_shop();
    let query = signed_proxy_query(&[("shop", &shop), ("productId", "999999999999")]);

    let resp = client
        .get(format!("{}/proxy/configuration/check?{query}", base_url()))
        .send()
        .await
        .expect("Failed to reach proxy endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Body must be valid JSON");
    assert_eq!(body["hasConfig"], false);
}

#[tokio::test]
#[ignore = "Requires running app backend and database"]
async fn test_saved_configuration_is_served() {
    let client = client();
    let shop = test_shop();
    let payload = r#"{"color":"red"}"#;
    seed_configuration(&client, "424242", payload).await;

    let query = signed_proxy_query(&[("shop", &shop), ("productId", "424242")]);
    let resp = client
        .get(format!("{}/proxy/configuration?{query}", base_url()))
        .send()
        .await
        .expect("Failed to reach proxy endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: Value = resp.json().await.expect("Body must be valid JSON");
    assert_eq!(body["hasConfig"], true);
    assert_eq!(body["configurationJson"], payload);
}

#[tokio::test]
#[ignore = "Requires running app backend and database"]
async fn test_other_shop_never_sees_configuration() {
    let client = client();
    seed_configuration(&client, "515151", r#"{"font":"mono"}"#).await;

    // Same product, different (signed) shop
    let query = signed_proxy_query(&[
        ("shop", "some-other-store.myshopify.com"),
        ("productId", "515151"),
    ]);
    let resp = client
        .get(format!("{}/proxy/configuration/check?{query}", base_url()))
        .send()
        .await
        .expect("Failed to reach proxy endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Body must be valid JSON");
    assert_eq!(body["hasConfig"], false);
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
#[ignore = "Requires running app backend and database"]
async fn test_preflight_is_no_content_with_cors_headers() {
    let client = client();

    let resp = client
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/proxy/configuration", base_url()),
        )
        .send()
        .await
        .expect("Failed to reach proxy endpoint");

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-methods")
            .and_then(|v| v.to_str().ok()),
        Some("GET, OPTIONS")
    );
}
