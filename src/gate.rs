//! Match-and-Notify Gate.
//!
//! Runs on every completed navigation: checks the URL against the stored
//! pattern mapping and, on the first match, leaves a Pending Notice for the
//! tab and asks the page host to run the renderer there.

use crate::events::TabId;
use crate::page_host::{InjectError, PageInjector};
use site_sentry_core::{
    KeyValueStore, PatternMapping, PendingNotice, StoreError, find_match, is_web_url, keys,
};
use std::sync::Arc;

/// What the gate did with one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Not an HTTP(S) URL; the store was not touched
    Ignored,
    /// No pattern matched
    NoMatch,
    /// A notice was written and the renderer injected
    Notified { pattern: String },
    /// A notice was written but injection failed; the notice was removed
    InjectionFailed { pattern: String, error: InjectError },
    /// The store could not be read or written
    StoreFailed(String),
}

pub struct MatchGate {
    store: Arc<dyn KeyValueStore>,
    injector: Arc<dyn PageInjector>,
}

impl std::fmt::Debug for MatchGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchGate").finish_non_exhaustive()
    }
}

impl MatchGate {
    pub fn new(store: Arc<dyn KeyValueStore>, injector: Arc<dyn PageInjector>) -> Self {
        Self { store, injector }
    }

    /// Load the stored mapping; a missing key is an empty mapping.
    pub fn mapping(&self) -> Result<PatternMapping, StoreError> {
        Ok(self
            .store
            .as_ref()
            .get_as::<PatternMapping>(keys::RESTRICTED_WEBSITES)?
            .unwrap_or_default())
    }

    /// Handle a navigation that finished loading in `tab_id`.
    pub fn on_navigation_complete(&self, tab_id: TabId, url: &str) -> GateOutcome {
        if !is_web_url(url) {
            return GateOutcome::Ignored;
        }

        let mapping = match self.mapping() {
            Ok(mapping) => mapping,
            Err(e) => {
                log::error!("Could not load restricted site list: {}", e);
                return GateOutcome::StoreFailed(e.to_string());
            }
        };

        let Some(entry) = find_match(&mapping, url) else {
            return GateOutcome::NoMatch;
        };
        let pattern = entry.pattern.clone();
        log::warn!(
            "Restricted website detected: {} (pattern '{}') in tab {}",
            url,
            pattern,
            tab_id
        );

        if let Err(e) = PendingNotice::new(entry.message.as_str(), tab_id).publish(self.store.as_ref())
        {
            log::error!("Could not store warning for tab {}: {}", tab_id, e);
            return GateOutcome::StoreFailed(e.to_string());
        }

        match self.injector.inject(tab_id) {
            Ok(()) => GateOutcome::Notified { pattern },
            Err(error) => {
                log::error!("Could not show warning in tab {}: {}", tab_id, error);
                if let Err(e) = PendingNotice::clear(self.store.as_ref()) {
                    log::error!("Could not remove undelivered warning: {}", e);
                }
                GateOutcome::InjectionFailed { pattern, error }
            }
        }
    }
}
