//! Data models for the app backend.

pub mod configuration;

pub use configuration::{ConfigurationRecord, ConfigurationView};
