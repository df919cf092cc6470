//! Core types for site-sentry.
//!
//! Provides:
//! - `mapping`: The ordered pattern → message list (`PatternMapping`)
//! - `list_parser`: Parsing of the remote `PATTERN:MESSAGE` text list
//! - `pattern`: Glob-to-regex compilation and first-match-wins lookup
//! - `store`: Key-value store abstraction shared by all components
//! - `notice`: The single-slot Pending Notice handed to the renderer

pub mod list_parser;
pub mod mapping;
pub mod notice;
pub mod pattern;
pub mod store;

pub use list_parser::{ParsedList, SyncStats, parse_list};
pub use mapping::{PatternEntry, PatternMapping};
pub use notice::PendingNotice;
pub use pattern::{PatternError, PatternMatcher, find_match, is_web_url};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, keys};
