//! Request authentication for the two trust tiers.
//!
//! Every handler states its trust tier through an extractor argument:
//!
//! - [`RequireAdminSession`] - embedded admin UI, authenticated by the
//!   session token Shopify issues to the embedded page (HS256 JWT signed
//!   with the app client secret). The shop comes from the token's `dest`
//!   claim.
//! - [`RequireProxyContext`] - public storefront, reaching the app through
//!   the Shopify app proxy. The proxy signs the query string with the app
//!   client secret; the shop comes from the signed `shop` parameter.
//!
//! Neither tier ever falls back to a statically configured shop: a request
//! that cannot prove its tenant is rejected before any store access.

pub mod proxy;
pub mod session_token;

pub use proxy::{ProxyContext, RequireProxyContext};
pub use session_token::{AdminSession, RequireAdminSession};
