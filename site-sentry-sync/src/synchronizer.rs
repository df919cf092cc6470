//! List Synchronizer: one fetch → parse → store cycle per call.
//!
//! A cycle either replaces the stored mapping in full or leaves it untouched.
//! Fetch failures are logged and the previous mapping stays authoritative
//! until the next successful cycle.

use crate::http::FetchError;
use crate::source::ListSource;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use site_sentry_core::{KeyValueStore, SyncStats, keys, parse_list};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to persist pattern list: {0}")]
    Store(String),
}

/// Result of a synchronization cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The stored mapping was replaced
    Updated(SyncStats),
    /// Another cycle was already running
    Skipped,
    /// Nothing was written
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

/// Persisted summary of the last successful cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// RFC 3339 timestamp
    pub synced_at: String,
    pub source: String,
    pub stats: SyncStats,
}

impl SyncRecord {
    /// Load the record of the last successful cycle, if any
    pub fn load(store: &dyn KeyValueStore) -> Option<SyncRecord> {
        match store.get_as(keys::LAST_SYNC) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Ignoring unreadable sync record: {}", e);
                None
            }
        }
    }

    /// Format the timestamp for display
    pub fn display_time(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.synced_at) {
            Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => self.synced_at.clone(),
        }
    }
}

/// Keeps the stored pattern mapping in step with the remote list
pub struct ListSynchronizer {
    source: Box<dyn ListSource>,
    store: Arc<dyn KeyValueStore>,
    /// Whether a cycle is currently running
    in_progress: AtomicBool,
    /// Outcome of the most recent cycle in this process
    last_outcome: Mutex<Option<SyncOutcome>>,
}

impl ListSynchronizer {
    pub fn new(source: Box<dyn ListSource>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            source,
            store,
            in_progress: AtomicBool::new(false),
            last_outcome: Mutex::new(None),
        }
    }

    /// Outcome of the most recent cycle run by this synchronizer
    pub fn last_outcome(&self) -> Option<SyncOutcome> {
        self.last_outcome.lock().clone()
    }

    /// Run one synchronization cycle.
    ///
    /// Safe to call repeatedly; a call made while another cycle is running
    /// returns [`SyncOutcome::Skipped`] without doing anything.
    pub fn synchronize(&self) -> SyncOutcome {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Synchronization already in progress, skipping");
            return SyncOutcome::Skipped;
        }

        log::debug!("--- sync start ---");
        let outcome = self.run_cycle();
        log::debug!("--- sync end ---");

        *self.last_outcome.lock() = Some(outcome.clone());
        self.in_progress.store(false, Ordering::SeqCst);
        outcome
    }

    fn run_cycle(&self) -> SyncOutcome {
        let origin = self.source.describe();

        let text = match self.source.fetch() {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to fetch restricted site list: {}", e);
                return SyncOutcome::Failed(e.into());
            }
        };

        let parsed = parse_list(&text);
        let stats = parsed.stats;

        // Single write replaces the previous mapping in full
        if let Err(e) = self
            .store
            .set_as(keys::RESTRICTED_WEBSITES, &parsed.mapping)
        {
            log::error!("Failed to save restricted site list: {}", e);
            return SyncOutcome::Failed(SyncError::Store(e.to_string()));
        }

        log::info!(
            "Loaded and saved {} patterns from {} ({} lines, {} comments, {} blank, {} malformed, {} duplicates)",
            stats.entries,
            origin,
            stats.total_lines,
            stats.comment_lines,
            stats.blank_lines,
            stats.malformed_lines,
            stats.duplicate_patterns
        );

        let record = SyncRecord {
            synced_at: Utc::now().to_rfc3339(),
            source: origin,
            stats,
        };
        if let Err(e) = self.store.set_as(keys::LAST_SYNC, &record) {
            log::warn!("Failed to save sync record: {}", e);
        }

        SyncOutcome::Updated(stats)
    }
}
