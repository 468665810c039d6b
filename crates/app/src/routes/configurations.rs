//! Admin-tier configuration endpoints.
//!
//! Every handler resolves its shop from the verified session token; the
//! store is never touched on behalf of an unproven tenant.

use axum::{
    Json, Router,
    extract::{Query, RawForm, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use monogram_core::{ProductKey, ShopDomain};

use crate::auth::RequireAdminSession;
use crate::db::{ConfigurationRepository, RepositoryError, ShopTokenRepository};
use crate::error::{AppError, Result};
use crate::models::ConfigurationView;
use crate::services::configurations as service;
use crate::services::configurations::ResolvedConfiguration;
use crate::shopify::ProductSummary;
use crate::state::AppState;

/// Where the editor form lands after a save, unless it asks otherwise.
const DEFAULT_RETURN_TO: &str = "/app/products?saved=1";

/// Build the admin configurations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show).post(save))
        .route("/overview", get(overview))
        .route("/editor", get(editor))
}

// =============================================================================
// Request / response shapes
// =============================================================================

/// Query parameters for a single-product lookup.
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    #[serde(rename = "productId")]
    pub product_id: Option<String>,
}

/// Lookup response served to both tiers' payload endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStatus {
    pub has_config: bool,
    pub configuration_json: Option<String>,
}

impl ConfigurationStatus {
    /// The fail-closed default: no configuration.
    pub(crate) const fn absent() -> Self {
        Self {
            has_config: false,
            configuration_json: None,
        }
    }
}

impl From<ResolvedConfiguration> for ConfigurationStatus {
    fn from(resolved: ResolvedConfiguration) -> Self {
        Self {
            has_config: resolved.has_config,
            configuration_json: resolved.configuration_json,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub shop: ShopDomain,
    pub products: Vec<ProductSummary>,
    pub configurations: Vec<ConfigurationView>,
}

#[derive(Debug, Deserialize)]
pub struct EditorParams {
    pub ids: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorResponse {
    pub products: Vec<ProductSummary>,
    pub configurations: Vec<ConfigurationView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Look up one product's configuration for the embedded admin UI.
///
/// Always answers with a well-formed JSON body: `400` with the empty shape
/// when `productId` is absent, `500` with the empty shape when the store is
/// unreachable. Nothing propagates as a raw error to the page.
pub async fn show(
    RequireAdminSession(session): RequireAdminSession,
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Response {
    let Some(product_id) = params.product_id.as_deref() else {
        return (StatusCode::BAD_REQUEST, Json(ConfigurationStatus::absent())).into_response();
    };

    match service::resolve(state.pool(), &session.shop, product_id).await {
        Ok(resolved) => (StatusCode::OK, Json(ConfigurationStatus::from(resolved))).into_response(),
        Err(e) => store_failure_response(&e, &session.shop),
    }
}

/// Persist a batch of editor entries submitted from the save form.
///
/// The form carries one JSON-encoded `{productId, configurationJson}` entry
/// per repeated `configs` field. Malformed entries are skipped inside the
/// service; the response is a redirect to the confirmation location either
/// way. Only a store failure surfaces as an error.
pub async fn save(
    RequireAdminSession(session): RequireAdminSession,
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> Result<Redirect> {
    let mut entries = Vec::new();
    let mut return_to: Option<String> = None;
    for (key, value) in url::form_urlencoded::parse(&body) {
        match key.as_ref() {
            "configs" => entries.push(value.into_owned()),
            "return_to" if return_to.is_none() => return_to = Some(value.into_owned()),
            _ => {}
        }
    }

    service::apply_batch(state.pool(), &session.shop, &entries).await?;

    // Only same-origin confirmation locations; anything else falls back
    let target = return_to
        .filter(|t| t.starts_with('/') && !t.starts_with("//"))
        .unwrap_or_else(|| DEFAULT_RETURN_TO.to_string());
    Ok(Redirect::to(&target))
}

/// List every configured product for the session shop, joined with live
/// catalog summaries for display.
pub async fn overview(
    RequireAdminSession(session): RequireAdminSession,
    State(state): State<AppState>,
) -> Result<Json<OverviewResponse>> {
    let records = ConfigurationRepository::new(state.pool())
        .list_for_shop(&session.shop)
        .await?;

    if records.is_empty() {
        return Ok(Json(OverviewResponse {
            shop: session.shop,
            products: Vec::new(),
            configurations: Vec::new(),
        }));
    }

    let ids: Vec<String> = records
        .iter()
        .map(|r| product_gid(&r.product_id))
        .collect();
    let products = fetch_summaries(&state, &session.shop, &ids).await?;

    Ok(Json(OverviewResponse {
        shop: session.shop,
        products,
        configurations: records.into_iter().map(ConfigurationView::from).collect(),
    }))
}

/// Bootstrap the multi-product editor: catalog summaries plus any existing
/// configurations for the requested products.
pub async fn editor(
    RequireAdminSession(session): RequireAdminSession,
    State(state): State<AppState>,
    Query(params): Query<EditorParams>,
) -> Result<Json<EditorResponse>> {
    let gids: Vec<String> = params
        .ids
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    if gids.is_empty() {
        return Err(AppError::BadRequest("missing ids".to_string()));
    }

    let keys: Vec<ProductKey> = gids.iter().map(|g| ProductKey::normalize(g)).collect();
    let records = ConfigurationRepository::new(state.pool())
        .get_many(&session.shop, &keys)
        .await?;

    let products = fetch_summaries(&state, &session.shop, &gids).await?;

    Ok(Json(EditorResponse {
        products,
        configurations: records.into_iter().map(ConfigurationView::from).collect(),
    }))
}

// =============================================================================
// Helpers
// =============================================================================

/// Rebuild the global ID the catalog API expects from a canonical key.
fn product_gid(key: &ProductKey) -> String {
    format!("gid://shopify/Product/{key}")
}

/// Fetch catalog summaries with the shop's stored Admin API token.
async fn fetch_summaries(
    state: &AppState,
    shop: &ShopDomain,
    ids: &[String],
) -> Result<Vec<ProductSummary>> {
    let token = ShopTokenRepository::new(state.pool())
        .get_by_shop(shop)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized(format!("no Admin API token stored for {shop}"))
        })?;

    let products = state
        .catalog()
        .product_summaries(shop, token.access_token.expose_secret(), ids)
        .await?;
    Ok(products)
}

/// Fail closed on a store failure: capture it, answer with the safe shape.
pub(crate) fn store_failure_response(e: &RepositoryError, shop: &ShopDomain) -> Response {
    let event_id = sentry::capture_error(e);
    tracing::error!(
        error = %e,
        shop = %shop,
        sentry_event_id = %event_id,
        "configuration lookup failed"
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ConfigurationStatus::absent()),
    )
        .into_response()
}
