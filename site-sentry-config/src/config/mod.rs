//! Core `Config` struct definition.
//!
//! # Sub-modules
//!
//! - [`persistence`]: `load_from` / `save_to` and XDG path helpers
//!
//! List synchronization settings live in [`SyncConfig`], flattened with
//! `#[serde(flatten)]` so they are serialized at the top level of the YAML
//! file. Overlay text is a nested `overlay:` section.

mod persistence;

use crate::error::ConfigError;
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the List Synchronizer and its HTTP transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// URL of the `PATTERN:MESSAGE` list
    #[serde(default = "crate::defaults::list_source_url")]
    pub list_source_url: String,

    /// Minutes between refreshes of the list (minimum 1)
    #[serde(default = "crate::defaults::refresh_period_minutes")]
    pub refresh_period_minutes: u64,

    /// Global timeout for the list download
    #[serde(default = "crate::defaults::http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Maximum accepted size of the list body in bytes
    #[serde(default = "crate::defaults::max_list_bytes")]
    pub max_list_bytes: u64,

    /// Accept `http://` list URLs (HTTPS is required otherwise)
    #[serde(default)]
    pub allow_insecure_http: bool,

    /// If non-empty, the list URL host must be one of these
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

impl SyncConfig {
    /// Global timeout for the list download
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            list_source_url: crate::defaults::list_source_url(),
            refresh_period_minutes: crate::defaults::refresh_period_minutes(),
            http_timeout_secs: crate::defaults::http_timeout_secs(),
            max_list_bytes: crate::defaults::max_list_bytes(),
            allow_insecure_http: false,
            allowed_hosts: Vec::new(),
        }
    }
}

/// Text shown by the warning overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "crate::defaults::overlay_title")]
    pub title: String,

    #[serde(default = "crate::defaults::overlay_dismiss_label")]
    pub dismiss_label: String,

    /// Wrap width of the overlay box, in columns
    #[serde(default = "crate::defaults::overlay_width")]
    pub width: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            title: crate::defaults::overlay_title(),
            dismiss_label: crate::defaults::overlay_dismiss_label(),
            width: crate::defaults::overlay_width(),
        }
    }
}

/// Host configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub sync: SyncConfig,

    /// Location of the JSON key-value store.
    /// `None` uses `storage.json` next to the config file; `~/` is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,

    /// Debug log verbosity
    #[serde(default)]
    pub log_level: LogLevel,

    /// Pages on these hosts never get an overlay injected
    #[serde(default = "crate::defaults::injection_denied_hosts")]
    pub injection_denied_hosts: Vec<String>,

    #[serde(default)]
    pub overlay: OverlayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            store_path: None,
            log_level: LogLevel::default(),
            injection_denied_hosts: crate::defaults::injection_denied_hosts(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list source URL
    pub fn with_list_source(mut self, url: impl Into<String>) -> Self {
        self.sync.list_source_url = url.into();
        self
    }

    /// Set the refresh period in minutes
    pub fn with_refresh_period_minutes(mut self, minutes: u64) -> Self {
        self.sync.refresh_period_minutes = minutes;
        self
    }

    /// Set the store location
    pub fn with_store_path(mut self, path: impl Into<String>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Interval of the `refreshWebsites` alarm
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.sync.refresh_period_minutes.max(1) * 60)
    }

    /// Check field values that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let source = &self.sync.list_source_url;
        let parsed = url::Url::parse(source).map_err(|e| {
            ConfigError::Validation(format!("list_source_url '{source}' is not a valid URL: {e}"))
        })?;
        match parsed.scheme() {
            "https" => {}
            "http" if self.sync.allow_insecure_http => {}
            "http" => {
                return Err(ConfigError::Validation(format!(
                    "list_source_url '{source}' uses plain HTTP; \
                     set allow_insecure_http: true to permit it"
                )));
            }
            scheme => {
                return Err(ConfigError::Validation(format!(
                    "list_source_url '{source}' has unsupported scheme '{scheme}'"
                )));
            }
        }

        if self.sync.refresh_period_minutes == 0 {
            return Err(ConfigError::Validation(
                "refresh_period_minutes must be at least 1".to_string(),
            ));
        }
        if self.sync.http_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "http_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.overlay.width < 20 {
            return Err(ConfigError::Validation(
                "overlay.width must be at least 20 columns".to_string(),
            ));
        }
        if self.sync.max_list_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_list_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
