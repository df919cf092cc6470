//! HTTP client helper with native-tls support.

use std::time::Duration;
use thiserror::Error;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// Errors raised while downloading the restricted-site list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The URL failed validation before any request was made
    #[error("list URL '{url}' rejected: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered with a non-success status
    #[error("HTTP error fetching '{url}': status {status}")]
    Status { url: String, status: u16 },

    /// DNS, connection, TLS or timeout failure
    #[error("failed to fetch '{url}': {message}")]
    Transport { url: String, message: String },

    /// The body could not be read, was not UTF-8, or exceeded the size limit
    #[error("failed to read list body from '{url}': {message}")]
    Body { url: String, message: String },
}

/// Which list URLs may be fetched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPolicy {
    /// Accept `http://` in addition to `https://`
    pub allow_insecure_http: bool,
    /// If non-empty, the URL host must be one of these
    pub allowed_hosts: Vec<String>,
}

/// Validate that a URL is acceptable as a list source.
///
/// Enforces:
/// - HTTPS scheme (HTTP only when the policy allows it)
/// - Host must be in the allowlist when one is configured
pub fn validate_list_url(url: &str, policy: &UrlPolicy) -> Result<(), FetchError> {
    let reject = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = url::Url::parse(url).map_err(|e| reject(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" if policy.allow_insecure_http => {}
        scheme => {
            return Err(reject(format!(
                "insecure or unsupported scheme '{scheme}'; only HTTPS is allowed"
            )));
        }
    }

    let host = parsed.host_str().unwrap_or("");
    if host.is_empty() {
        return Err(reject("URL has no host".to_string()));
    }
    if !policy.allowed_hosts.is_empty()
        && !policy
            .allowed_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    {
        return Err(reject(format!(
            "host '{}' is not in the allowed list ({})",
            host,
            policy.allowed_hosts.join(", ")
        )));
    }

    Ok(())
}

/// Create a new HTTP agent configured with native-tls and a global timeout.
pub fn agent(timeout: Duration) -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Download `url` as UTF-8 text.
///
/// The response body is limited to `max_bytes`. Non-2xx responses are
/// reported as [`FetchError::Status`].
pub fn fetch_text(agent: &Agent, url: &str, max_bytes: u64) -> Result<String, FetchError> {
    let response = agent
        .get(url)
        .header("User-Agent", concat!("site-sentry/", env!("CARGO_PKG_VERSION")))
        .header("Accept", "text/plain")
        .call()
        .map_err(|e| match e {
            ureq::Error::StatusCode(status) => FetchError::Status {
                url: url.to_string(),
                status,
            },
            other => FetchError::Transport {
                url: url.to_string(),
                message: other.to_string(),
            },
        })?;

    response
        .into_body()
        .with_config()
        .limit(max_bytes)
        .read_to_string()
        .map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
}
