//! Shared integration test helpers for site-sentry.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{CountingStore, ScriptedSource, SharedBuffer};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use site_sentry::renderer::NoticeRenderer;
use site_sentry_config::OverlayConfig;
use site_sentry_core::{KeyValueStore, MemoryStore, StoreError};
use site_sentry_sync::{FetchError, ListSource};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cloneable `Write` sink whose contents can be inspected after the fact
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// In-memory store that counts every access
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn accesses(&self) -> usize {
        self.reads() + self.writes()
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}

/// List source that replays queued responses, then fails
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<String, FetchError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, text: &str) -> Self {
        self.responses.lock().push_back(Ok(text.to_string()));
        self
    }

    pub fn then_err(self, error: FetchError) -> Self {
        self.responses.lock().push_back(Err(error));
        self
    }

    /// Shared counter of `fetch` calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ListSource for ScriptedSource {
    fn fetch(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(transport_error()))
    }

    fn describe(&self) -> String {
        "scripted://list".to_string()
    }
}

/// A typical network failure
pub fn transport_error() -> FetchError {
    FetchError::Transport {
        url: "https://lists.example/webs.txt".to_string(),
        message: "connection refused".to_string(),
    }
}

/// Renderer writing into a [`SharedBuffer`]
pub fn capturing_renderer(store: Arc<dyn KeyValueStore>) -> (NoticeRenderer, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let renderer = NoticeRenderer::new(store, OverlayConfig::default(), Box::new(buffer.clone()));
    (renderer, buffer)
}

/// A small list in `PATTERN:MESSAGE` format
pub const SAMPLE_LIST: &str = "\
# restricted sites
a.com:msg1
a.com*b:msg2

*.tracker.net/ads:Ad network: follows you around
broken line without colon
:no pattern
";
