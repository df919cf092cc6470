//! Restricted-site list synchronization for site-sentry.
//!
//! Provides:
//! - `http`: ureq agent, list URL validation and the download helper
//! - `source`: `ListSource` trait and its HTTP implementation
//! - `synchronizer`: fetch → parse → store cycle with in-progress guard

pub mod http;
pub mod source;
pub mod synchronizer;

pub use http::FetchError;
pub use source::{HttpListSource, ListSource};
pub use synchronizer::{ListSynchronizer, SyncError, SyncOutcome, SyncRecord};
