//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! `Config` fields and by the `Default` impls.

/// Remote restricted-site list
pub fn list_source_url() -> String {
    "https://raw.githubusercontent.com/Gvuj/teste25/refs/heads/main/webs.txt".to_string()
}

/// Minutes between list refreshes. Short for rapid iteration; production
/// deployments should lengthen this.
pub fn refresh_period_minutes() -> u64 {
    1
}

pub fn http_timeout_secs() -> u64 {
    30
}

/// Response size cap for the list download (1 MB)
pub fn max_list_bytes() -> u64 {
    1024 * 1024
}

/// Hosts where the page host refuses to run the renderer
pub fn injection_denied_hosts() -> Vec<String> {
    vec![
        "chromewebstore.google.com".to_string(),
        "chrome.google.com".to_string(),
        "addons.mozilla.org".to_string(),
    ]
}

pub fn overlay_title() -> String {
    "WARNING: Restricted Website Detected".to_string()
}

/// Label of the line that dismisses the overlay
pub fn overlay_dismiss_label() -> String {
    "Acknowledge and Close".to_string()
}

/// Column width the overlay text is wrapped to
pub fn overlay_width() -> usize {
    72
}
