//! Configuration system for site-sentry.
//!
//! This crate provides configuration loading, saving, and default values
//! for the host. It includes:
//!
//! - List source and refresh settings
//! - Storage location
//! - Page host and overlay settings
//! - Log level

pub mod config;
pub mod defaults;
pub mod error;
mod types;

// Re-export main types for convenience
pub use config::{Config, OverlayConfig, SyncConfig};
pub use error::ConfigError;
pub use types::LogLevel;
