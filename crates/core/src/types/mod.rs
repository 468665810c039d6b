//! Core types for Monogram.
//!
//! This module provides type-safe wrappers for the two identifiers every
//! configuration record is keyed by.

pub mod product;
pub mod shop;

pub use product::ProductKey;
pub use shop::{ShopDomain, ShopDomainError};
