//! Host runtime: wires the synchronizer, gate and page host to host events.
//!
//! Events from alarms, the navigation feed and Ctrl-C are funnelled into one
//! channel and dispatched one at a time on a blocking thread.

use crate::alarms::Alarms;
use crate::cli::RuntimeOptions;
use crate::events::{EventKind, EventRouter, HostEvent, REFRESH_ALARM, TabId, TabStatus};
use crate::gate::{GateOutcome, MatchGate};
use crate::page_host::LocalPageHost;
use crate::renderer::NoticeRenderer;
use anyhow::{Context, Result};
use site_sentry_config::Config;
use site_sentry_core::{FileStore, KeyValueStore};
use site_sentry_sync::{HttpListSource, ListSynchronizer, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Everything the event handlers act on
#[derive(Clone)]
pub struct HostComponents {
    pub synchronizer: Arc<ListSynchronizer>,
    pub gate: Arc<MatchGate>,
    pub page_host: Arc<LocalPageHost>,
    pub alarms: Arc<Alarms>,
    pub refresh_period: Duration,
}

impl HostComponents {
    /// Build the components around `store` from the configuration
    pub fn from_config(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        alarms: Arc<Alarms>,
    ) -> Self {
        let source = HttpListSource::from_config(&config.sync);
        let synchronizer = Arc::new(ListSynchronizer::new(Box::new(source), Arc::clone(&store)));
        let renderer = NoticeRenderer::to_stdout(Arc::clone(&store), config.overlay.clone());
        let page_host = Arc::new(LocalPageHost::new(
            renderer,
            config.injection_denied_hosts.clone(),
        ));
        let gate = Arc::new(MatchGate::new(store, page_host.clone()));
        Self {
            synchronizer,
            gate,
            page_host,
            alarms,
            refresh_period: config.refresh_period(),
        }
    }

    /// Synchronize now and (re)create the refresh alarm
    pub fn setup(&self) {
        match self.synchronizer.synchronize() {
            SyncOutcome::Updated(stats) => {
                log::info!("Initial synchronization stored {} patterns", stats.entries)
            }
            SyncOutcome::Skipped => {}
            SyncOutcome::Failed(_) => log::warn!("Initial synchronization failed, keeping stored list"),
        }
        self.alarms.create(REFRESH_ALARM, self.refresh_period);
    }
}

/// Register the host's handlers on `router`.
///
/// The page host records a navigation before the gate sees it, so an
/// injection for that navigation always finds the new page.
pub fn register_handlers(router: &mut EventRouter, host: &HostComponents) {
    let h = host.clone();
    router.on(EventKind::Installed, move |_| {
        log::info!("First run: no stored data yet");
        h.setup();
    });

    let h = host.clone();
    router.on(EventKind::Startup, move |_| {
        log::info!("Host started");
        h.setup();
    });

    let synchronizer = Arc::clone(&host.synchronizer);
    router.on(EventKind::Alarm, move |event| {
        if let HostEvent::Alarm { name } = event
            && name == REFRESH_ALARM
        {
            log::debug!("Alarm '{}' fired", name);
            synchronizer.synchronize();
        }
    });

    let page_host = Arc::clone(&host.page_host);
    router.on(EventKind::TabUpdated, move |event| {
        if let Some((tab_id, url)) = event.completed_navigation() {
            page_host.commit_navigation(tab_id, url);
        }
    });

    let gate = Arc::clone(&host.gate);
    router.on(EventKind::TabUpdated, move |event| {
        if let Some((tab_id, url)) = event.completed_navigation() {
            match gate.on_navigation_complete(tab_id, url) {
                GateOutcome::Notified { pattern } => {
                    log::info!("Warned tab {} (pattern '{}')", tab_id, pattern)
                }
                outcome => log::trace!("Tab {}: {:?}", tab_id, outcome),
            }
        }
    });

    let alarms = Arc::clone(&host.alarms);
    router.on(EventKind::Shutdown, move |_| {
        log::info!("Shutting down");
        alarms.clear_all();
    });
}

/// Dispatch events until `Shutdown` arrives or every sender is gone.
///
/// Returns the number of events dispatched.
pub fn run_event_loop(router: &mut EventRouter, events: &mut UnboundedReceiver<HostEvent>) -> usize {
    let mut count = 0;
    while let Some(event) = events.blocking_recv() {
        router.dispatch(&event);
        count += 1;
        if event == HostEvent::Shutdown {
            break;
        }
    }
    count
}

/// Parse one navigation feed line of the form `<tab_id> <url>`.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_feed_line(line: &str) -> Result<Option<(TabId, String)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (tab, url) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("expected '<tab_id> <url>', got '{line}'"))?;
    let tab_id = tab
        .parse::<TabId>()
        .map_err(|e| format!("invalid tab id '{tab}': {e}"))?;
    let url = url.trim();
    if url.is_empty() {
        return Err(format!("missing URL for tab {tab_id}"));
    }
    Ok(Some((tab_id, url.to_string())))
}

/// Read navigations from stdin until EOF, then request shutdown
async fn navigation_feed(events: UnboundedSender<HostEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_feed_line(&line) {
                Ok(Some((tab_id, url))) => {
                    let event = HostEvent::TabUpdated {
                        tab_id,
                        status: TabStatus::Complete,
                        url: Some(url),
                    };
                    if events.send(event).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Ignoring navigation line: {}", e),
            },
            Ok(None) => {
                log::info!("Navigation feed closed");
                break;
            }
            Err(e) => {
                log::error!("Failed to read navigation feed: {}", e);
                break;
            }
        }
    }
    let _ = events.send(HostEvent::Shutdown);
}

/// Main application state
pub struct App {
    config: Config,
    store: Arc<FileStore>,
    runtime: Arc<Runtime>,
}

impl App {
    /// Load configuration and open the store
    pub fn new(runtime: Arc<Runtime>, options: RuntimeOptions) -> Result<Self> {
        let (config, config_dir) = options.load_config()?;
        let store_path = config.resolved_store_path(&config_dir);
        let store = FileStore::open(&store_path)
            .with_context(|| format!("failed to open store at {}", store_path.display()))?;
        log::info!("Store: {}", store_path.display());

        Ok(Self {
            config,
            store: Arc::new(store),
            runtime,
        })
    }

    /// Run the host until Ctrl-C or the end of the navigation feed
    pub fn run(self) -> Result<()> {
        let (tx, mut rx) = unbounded_channel();
        let alarms = Arc::new(Alarms::new(self.runtime.handle().clone(), tx.clone()));
        let store: Arc<dyn KeyValueStore> = self.store.clone();
        let host = HostComponents::from_config(&self.config, store, alarms);

        let mut router = EventRouter::new();
        register_handlers(&mut router, &host);

        let first = if self.store.existed() {
            HostEvent::Startup
        } else {
            HostEvent::Installed
        };
        tx.send(first).context("event channel closed before startup")?;

        self.runtime.spawn(navigation_feed(tx.clone()));
        let ctrl_c_tx = tx.clone();
        self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Ctrl-C received");
                let _ = ctrl_c_tx.send(HostEvent::Shutdown);
            }
        });
        drop(tx);

        let event_loop = self
            .runtime
            .spawn_blocking(move || run_event_loop(&mut router, &mut rx));
        let dispatched = self
            .runtime
            .block_on(event_loop)
            .context("event loop panicked")?;
        log::info!("Event loop finished after {} events", dispatched);

        host.alarms.clear_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_line() {
        assert_eq!(
            parse_feed_line("7 https://a.com/x"),
            Ok(Some((7, "https://a.com/x".to_string())))
        );
        assert_eq!(
            parse_feed_line("  12\thttps://b.com  "),
            Ok(Some((12, "https://b.com".to_string())))
        );
        assert_eq!(parse_feed_line(""), Ok(None));
        assert_eq!(parse_feed_line("# comment"), Ok(None));
    }

    #[test]
    fn test_parse_feed_line_errors() {
        assert!(parse_feed_line("https://a.com").is_err());
        assert!(parse_feed_line("tab https://a.com").is_err());
        assert!(parse_feed_line("-1 https://a.com").is_err());
    }

    #[test]
    fn test_event_loop_stops_at_shutdown() {
        let (tx, mut rx) = unbounded_channel();
        let mut router = EventRouter::new();
        tx.send(HostEvent::Startup).unwrap();
        tx.send(HostEvent::Shutdown).unwrap();
        tx.send(HostEvent::Startup).unwrap();

        assert_eq!(run_event_loop(&mut router, &mut rx), 2);
        assert_eq!(rx.try_recv(), Ok(HostEvent::Startup));
    }

    #[test]
    fn test_event_loop_stops_when_senders_drop() {
        let (tx, mut rx) = unbounded_channel();
        let mut router = EventRouter::new();
        tx.send(HostEvent::Installed).unwrap();
        drop(tx);
        assert_eq!(run_event_loop(&mut router, &mut rx), 1);
    }
}
