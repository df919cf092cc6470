//! Where the restricted-site list comes from.

use crate::http::{self, FetchError, UrlPolicy};
use site_sentry_config::SyncConfig;
use std::time::Duration;
use ureq::Agent;

/// An opaque text source for the list
pub trait ListSource: Send + Sync {
    /// Retrieve the full list text
    fn fetch(&self) -> Result<String, FetchError>;

    /// Human-readable origin, used in log lines
    fn describe(&self) -> String;
}

/// Downloads the list over HTTPS
pub struct HttpListSource {
    url: String,
    policy: UrlPolicy,
    max_bytes: u64,
    agent: Agent,
}

impl std::fmt::Debug for HttpListSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListSource")
            .field("url", &self.url)
            .field("policy", &self.policy)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

impl HttpListSource {
    pub fn new(url: impl Into<String>, policy: UrlPolicy, timeout: Duration, max_bytes: u64) -> Self {
        Self {
            url: url.into(),
            policy,
            max_bytes,
            agent: http::agent(timeout),
        }
    }

    /// Build a source from the sync section of the configuration
    pub fn from_config(config: &SyncConfig) -> Self {
        let policy = UrlPolicy {
            allow_insecure_http: config.allow_insecure_http,
            allowed_hosts: config.allowed_hosts.clone(),
        };
        Self::new(
            config.list_source_url.clone(),
            policy,
            config.http_timeout(),
            config.max_list_bytes,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ListSource for HttpListSource {
    fn fetch(&self) -> Result<String, FetchError> {
        // Validate at call time so a bad URL never reaches the network.
        http::validate_list_url(&self.url, &self.policy)?;
        http::fetch_text(&self.agent, &self.url, self.max_bytes)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
