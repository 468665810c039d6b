//! Business logic services.

pub mod configurations;
