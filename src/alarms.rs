//! Named periodic alarms.
//!
//! Each alarm is a tokio task that sends [`HostEvent::Alarm`] into the host's
//! event channel once per period. The first tick fires one full period after
//! the alarm is created. Creating an alarm with an existing name replaces it.

use crate::events::HostEvent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at};

pub struct Alarms {
    runtime: Handle,
    events: UnboundedSender<HostEvent>,
    active: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl std::fmt::Debug for Alarms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alarms")
            .field("active", &self.names())
            .finish_non_exhaustive()
    }
}

impl Alarms {
    pub fn new(runtime: Handle, events: UnboundedSender<HostEvent>) -> Self {
        Self {
            runtime,
            events,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or restart) the alarm `name` with the given period
    pub fn create(&self, name: &str, period: Duration) {
        let events = self.events.clone();
        let alarm_name = name.to_string();

        let task = self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let event = HostEvent::Alarm {
                    name: alarm_name.clone(),
                };
                if events.send(event).is_err() {
                    // Event loop is gone
                    break;
                }
            }
        });

        if let Some(previous) = self.active.lock().insert(name.to_string(), task) {
            previous.abort();
        }
        log::info!("Alarm '{}' set to every {:?}", name, period);
    }

    /// Stop the alarm `name`. Returns whether it existed.
    pub fn clear(&self, name: &str) -> bool {
        match self.active.lock().remove(name) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Stop every alarm
    pub fn clear_all(&self) {
        for (_, task) in self.active.lock().drain() {
            task.abort();
        }
    }

    /// Names of the active alarms, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Drop for Alarms {
    fn drop(&mut self) {
        self.clear_all();
    }
}
