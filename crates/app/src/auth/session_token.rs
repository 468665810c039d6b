//! Embedded-admin session token verification.
//!
//! Shopify issues a short-lived HS256 JWT to the embedded admin page, signed
//! with the app client secret. The token's `dest` claim carries the shop the
//! session belongs to; that claim is the only source of tenant identity on
//! the admin tier.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use url::Url;

use monogram_core::ShopDomain;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Allowed clock skew when checking `exp` and `nbf`.
const LEEWAY_SECONDS: i64 = 5;

/// Errors that can occur while verifying a session token.
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    /// The token is not a three-segment JWT or a segment is not base64url.
    #[error("malformed token")]
    Malformed,
    /// The header does not declare HS256.
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,
    /// The signature does not match the app client secret.
    #[error("invalid signature")]
    InvalidSignature,
    /// The token has expired.
    #[error("token expired")]
    Expired,
    /// The token is not valid yet.
    #[error("token not yet valid")]
    NotYetValid,
    /// The `aud` claim does not match the app client ID.
    #[error("audience mismatch")]
    AudienceMismatch,
    /// The `dest` claim does not name a valid shop.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),
}

#[derive(Debug, Deserialize)]
struct TokenHeader {
    alg: String,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    /// Shop the session belongs to, as a URL (`https://<shop>`).
    dest: String,
    /// App client ID the token was issued for.
    aud: String,
    exp: i64,
    nbf: i64,
}

/// An authenticated embedded-admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// Shop resolved from the verified `dest` claim.
    pub shop: ShopDomain,
}

/// Verify a session token and resolve the shop it belongs to.
///
/// `now` is the current Unix timestamp; it is a parameter so expiry handling
/// is testable.
///
/// # Errors
///
/// Returns a `SessionTokenError` describing the first check that failed.
/// Nothing about the failure is recoverable by the caller; every variant
/// maps to an authorization rejection.
pub fn verify_session_token(
    token: &str,
    api_key: &str,
    api_secret: &str,
    now: i64,
) -> Result<AdminSession, SessionTokenError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(SessionTokenError::Malformed);
    };

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| SessionTokenError::Malformed)?;
    let header: TokenHeader =
        serde_json::from_slice(&header_bytes).map_err(|_| SessionTokenError::Malformed)?;
    if header.alg != "HS256" {
        return Err(SessionTokenError::UnsupportedAlgorithm);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| SessionTokenError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(api_secret.as_bytes())
        .map_err(|_| SessionTokenError::InvalidSignature)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| SessionTokenError::InvalidSignature)?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| SessionTokenError::Malformed)?;
    let claims: TokenClaims =
        serde_json::from_slice(&claims_bytes).map_err(|_| SessionTokenError::Malformed)?;

    if claims.exp + LEEWAY_SECONDS <= now {
        return Err(SessionTokenError::Expired);
    }
    if claims.nbf - LEEWAY_SECONDS > now {
        return Err(SessionTokenError::NotYetValid);
    }
    if claims.aud != api_key {
        return Err(SessionTokenError::AudienceMismatch);
    }

    let shop = shop_from_dest(&claims.dest)?;
    Ok(AdminSession { shop })
}

/// Resolve the shop domain from the `dest` claim (`https://<shop>`).
fn shop_from_dest(dest: &str) -> Result<ShopDomain, SessionTokenError> {
    let url =
        Url::parse(dest).map_err(|e| SessionTokenError::InvalidDestination(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| SessionTokenError::InvalidDestination("missing host".to_string()))?;
    ShopDomain::parse(host).map_err(|e| SessionTokenError::InvalidDestination(e.to_string()))
}

// =============================================================================
// Extractor
// =============================================================================

/// Extractor that requires an authenticated embedded-admin session.
///
/// The token is read from the `Authorization: Bearer` header, falling back
/// to the `id_token` query parameter Shopify appends to document requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminSession(session): RequireAdminSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", session.shop)
/// }
/// ```
pub struct RequireAdminSession(pub AdminSession);

/// Error returned when a valid session token is required but absent.
pub struct SessionRejection;

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "invalid session token").into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdminSession {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| id_token_param(parts))
            .ok_or(SessionRejection)?;

        let shopify = state.config().shopify();
        let now = chrono::Utc::now().timestamp();

        match verify_session_token(&token, &shopify.api_key, shopify.api_secret(), now) {
            Ok(session) => Ok(Self(session)),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                Err(SessionRejection)
            }
        }
    }
}

/// Read the token from the `Authorization: Bearer` header.
fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

/// Read the token from the `id_token` query parameter.
fn id_token_param(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "id_token")
        .map(|(_, v)| v.into_owned())
}
