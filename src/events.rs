//! Host events and the router that dispatches them to registered handlers.
//!
//! Handlers are registered per [`EventKind`] and run in registration order.
//! The host delivers events one at a time, so two handlers never run at the
//! same moment; they share state only through the key-value store.

use std::collections::HashMap;

/// Browser-style tab identifier
pub type TabId = u64;

/// Name of the periodic list-refresh alarm
pub const REFRESH_ALARM: &str = "refreshWebsites";

/// Loading state reported with a tab update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Events delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// First run: no persisted storage existed
    Installed,
    /// Host process (re)started with existing storage
    Startup,
    /// A named alarm fired
    Alarm { name: String },
    /// A tab changed loading state
    TabUpdated {
        tab_id: TabId,
        status: TabStatus,
        url: Option<String>,
    },
    /// Stop the dispatch loop
    Shutdown,
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Installed => EventKind::Installed,
            HostEvent::Startup => EventKind::Startup,
            HostEvent::Alarm { .. } => EventKind::Alarm,
            HostEvent::TabUpdated { .. } => EventKind::TabUpdated,
            HostEvent::Shutdown => EventKind::Shutdown,
        }
    }

    /// Tab id and URL of a completed navigation, if this is one
    pub fn completed_navigation(&self) -> Option<(TabId, &str)> {
        match self {
            HostEvent::TabUpdated {
                tab_id,
                status: TabStatus::Complete,
                url: Some(url),
            } => Some((*tab_id, url.as_str())),
            _ => None,
        }
    }
}

/// Handler registration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Installed,
    Startup,
    Alarm,
    TabUpdated,
    Shutdown,
}

pub type Handler = Box<dyn FnMut(&HostEvent) + Send>;

/// Dispatches events to the handlers registered for their kind
#[derive(Default)]
pub struct EventRouter {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&EventKind, usize> =
            self.handlers.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("EventRouter")
            .field("handlers", &counts)
            .finish()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one kind of event
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&HostEvent) + Send + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Run every handler registered for the event's kind, in order.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch(&mut self, event: &HostEvent) -> usize {
        let Some(handlers) = self.handlers.get_mut(&event.kind()) else {
            log::trace!("No handlers for {:?}", event.kind());
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler(event);
        }
        handlers.len()
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_dispatch_runs_handlers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = EventRouter::new();

        let s = Arc::clone(&seen);
        router.on(EventKind::Startup, move |_| s.lock().push("first"));
        let s = Arc::clone(&seen);
        router.on(EventKind::Startup, move |_| s.lock().push("second"));

        assert_eq!(router.dispatch(&HostEvent::Startup), 2);
        assert_eq!(*seen.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_dispatch_without_handlers() {
        let mut router = EventRouter::new();
        assert_eq!(router.dispatch(&HostEvent::Installed), 0);
        assert_eq!(router.handler_count(EventKind::Installed), 0);
    }

    #[test]
    fn test_handlers_only_see_their_kind() {
        let alarms = Arc::new(Mutex::new(0));
        let mut router = EventRouter::new();
        let a = Arc::clone(&alarms);
        router.on(EventKind::Alarm, move |_| *a.lock() += 1);

        router.dispatch(&HostEvent::Startup);
        router.dispatch(&HostEvent::Alarm {
            name: REFRESH_ALARM.to_string(),
        });
        assert_eq!(*alarms.lock(), 1);
    }

    #[test]
    fn test_completed_navigation() {
        let complete = HostEvent::TabUpdated {
            tab_id: 4,
            status: TabStatus::Complete,
            url: Some("https://a.com".to_string()),
        };
        assert_eq!(complete.completed_navigation(), Some((4, "https://a.com")));

        let loading = HostEvent::TabUpdated {
            tab_id: 4,
            status: TabStatus::Loading,
            url: Some("https://a.com".to_string()),
        };
        assert_eq!(loading.completed_navigation(), None);

        let no_url = HostEvent::TabUpdated {
            tab_id: 4,
            status: TabStatus::Complete,
            url: None,
        };
        assert_eq!(no_url.completed_navigation(), None);
    }
}
