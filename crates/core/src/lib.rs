//! Monogram Core - Shared types library.
//!
//! This crate provides common types used across all Monogram components:
//! - `app` - Embedded-app backend (admin API + storefront proxy)
//! - `cli` - Command-line tools for migrations and shop token management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product identifiers and shop domains

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
