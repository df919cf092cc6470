//! Page host: the tabs the renderer can be injected into.
//!
//! Every completed navigation replaces the tab's [`PageContext`], which also
//! resets the tab's one-overlay-per-page guard. Injection is refused for
//! tabs the host has never seen, for non-web pages and for privileged hosts
//! listed in `injection_denied_hosts`.

use crate::events::TabId;
use crate::renderer::{NoticeRenderer, RenderOutcome};
use parking_lot::Mutex;
use site_sentry_core::is_web_url;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    #[error("no page is loaded in tab {0}")]
    NoSuchTab(TabId),

    #[error("cannot inject into {url}: {reason}")]
    Denied { url: String, reason: String },

    #[error("renderer failed: {0}")]
    Render(String),
}

/// Runs the renderer in a tab
pub trait PageInjector: Send + Sync {
    fn inject(&self, tab_id: TabId) -> Result<(), InjectError>;
}

/// The page currently loaded in one tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    tab_id: TabId,
    url: String,
    host: String,
    overlay_shown: bool,
}

impl PageContext {
    pub fn new(tab_id: TabId, url: impl Into<String>) -> Self {
        let url = url.into();
        let host = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            tab_id,
            url,
            host,
            overlay_shown: false,
        }
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Host name of the page, empty when the URL has none
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn overlay_shown(&self) -> bool {
        self.overlay_shown
    }

    pub(crate) fn mark_overlay_shown(&mut self) {
        self.overlay_shown = true;
    }
}

/// In-process page host driving a [`NoticeRenderer`]
#[derive(Debug)]
pub struct LocalPageHost {
    pages: Mutex<HashMap<TabId, PageContext>>,
    renderer: NoticeRenderer,
    denied_hosts: Vec<String>,
}

impl LocalPageHost {
    pub fn new(renderer: NoticeRenderer, denied_hosts: Vec<String>) -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            renderer,
            denied_hosts: denied_hosts
                .into_iter()
                .map(|h| h.trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Record that `tab_id` finished loading `url`
    pub fn commit_navigation(&self, tab_id: TabId, url: &str) {
        log::trace!("Tab {} committed {}", tab_id, url);
        self.pages.lock().insert(tab_id, PageContext::new(tab_id, url));
    }

    /// Forget a tab. Returns whether it was known.
    pub fn close_tab(&self, tab_id: TabId) -> bool {
        self.pages.lock().remove(&tab_id).is_some()
    }

    /// Snapshot of the page loaded in `tab_id`
    pub fn page(&self, tab_id: TabId) -> Option<PageContext> {
        self.pages.lock().get(&tab_id).cloned()
    }

    fn denial_reason(&self, page: &PageContext) -> Option<String> {
        if !is_web_url(page.url()) {
            return Some("not a web page".to_string());
        }
        if page.host().is_empty() {
            return Some("page has no host".to_string());
        }
        let host = page.host().to_ascii_lowercase();
        self.denied_hosts
            .iter()
            .find(|denied| host == **denied || host.ends_with(&format!(".{denied}")))
            .map(|denied| format!("host is privileged ({denied})"))
    }
}

impl PageInjector for LocalPageHost {
    fn inject(&self, tab_id: TabId) -> Result<(), InjectError> {
        let mut pages = self.pages.lock();
        let page = pages.get_mut(&tab_id).ok_or(InjectError::NoSuchTab(tab_id))?;

        if let Some(reason) = self.denial_reason(page) {
            return Err(InjectError::Denied {
                url: page.url().to_string(),
                reason,
            });
        }

        match self.renderer.render(page) {
            Ok(RenderOutcome::Displayed) => Ok(()),
            Ok(other) => {
                log::debug!("Render pass in tab {} ended with {:?}", tab_id, other);
                Ok(())
            }
            Err(e) => Err(InjectError::Render(e.to_string())),
        }
    }
}
