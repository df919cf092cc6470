// Library exports for testing and potential library use
//
// # Mutex Usage Policy
//
// Shared sync-only state (the store, the page host's tab table, alarm
// handles) uses `parking_lot::Mutex`. Never hold one across an `.await`.
// Event handlers run one at a time on the dispatch thread.

/// Application version (root crate version)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod debug;

pub mod alarms;
pub mod app;
pub mod cli;
pub mod events;
pub mod gate;
pub mod page_host;
pub mod renderer;
