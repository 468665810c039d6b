//! HTTP route handlers for the app backend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (DB ping)
//!
//! # Admin API (embedded app, session-token tier)
//! GET  /api/configurations              - Configuration lookup for one product
//! POST /api/configurations              - Batch save from the editor form
//! GET  /api/configurations/overview     - All configured products with catalog summaries
//! GET  /api/configurations/editor       - Editor bootstrap for a set of products
//!
//! # Storefront API (app proxy, signature tier)
//! GET  /proxy/configuration             - Configuration payload for one product
//! GET  /proxy/configuration/check       - Presence check for one product
//! OPTIONS on both                       - CORS preflight (204)
//! ```

pub mod configurations;
pub mod proxy;

use axum::Router;

use crate::state::AppState;

/// Create all routes for the app backend.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/configurations", configurations::router())
        .nest("/proxy", proxy::router())
}
