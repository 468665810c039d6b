//! Shopify Admin API integration.
//!
//! Only the catalog lookup lives here: configuration records reference
//! products by identifier alone, so titles and images are fetched live when
//! a page needs them, never cached or copied into the store.

pub mod catalog;

pub use catalog::{CatalogClient, CatalogError, ProductImage, ProductSummary};
