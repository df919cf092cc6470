//! Typed error variants for the site-sentry-config crate.
//!
//! `Config::load` and `Config::save` return `anyhow::Result`; `ConfigError`
//! values are coerced through the `From` impl that `anyhow` provides for any
//! `std::error::Error`, so callers can still `downcast_ref::<ConfigError>()`.
//!
//! # Example
//!
//! ```rust,no_run
//! use site_sentry_config::ConfigError;
//!
//! fn check_load_err(e: &anyhow::Error) {
//!     if let Some(cfg_err) = e.downcast_ref::<ConfigError>() {
//!         match cfg_err {
//!             ConfigError::Io(io) => eprintln!("I/O error: {io}"),
//!             ConfigError::Parse(p) => eprintln!("YAML parse error: {p}"),
//!             ConfigError::Validation(msg) => eprintln!("Validation: {msg}"),
//!         }
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors that can occur when loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the config file.
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file contained invalid YAML that could not be parsed.
    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string describes which field is invalid and why.
    #[error("Config validation error: {0}")]
    Validation(String),
}
