//! Pending Notice: the single-slot hand-off from the gate to the renderer.
//!
//! The gate writes a notice immediately before asking the host to run the
//! renderer in a tab; the renderer reads it once and deletes it. There is no
//! queue, so a second navigation may overwrite a notice that has not been
//! consumed yet. The `tab_id` lets the renderer ignore a notice addressed to
//! another tab.

use crate::store::{KeyValueStore, StoreError, keys};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotice {
    /// Warning text to display
    pub message: String,
    /// Tab the notice was written for
    pub tab_id: u64,
}

impl PendingNotice {
    pub fn new(message: impl Into<String>, tab_id: u64) -> Self {
        Self {
            message: message.into(),
            tab_id,
        }
    }

    /// Whether this notice is addressed to `tab_id`
    pub fn is_for(&self, tab_id: u64) -> bool {
        self.tab_id == tab_id
    }

    /// Replace whatever notice is pending with this one.
    ///
    /// The slot is cleared first so a failed write never leaves an older
    /// notice in place.
    pub fn publish(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.remove(keys::CURRENT_WARNING_MESSAGE)?;
        store.set_as(keys::CURRENT_WARNING_MESSAGE, self)
    }

    /// Read the pending notice without consuming it
    pub fn peek(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
        store.get_as(keys::CURRENT_WARNING_MESSAGE)
    }

    /// Read the pending notice (if any) and delete the slot.
    ///
    /// The slot is deleted even when its content cannot be decoded, so a
    /// corrupt value is consumed rather than retried forever.
    pub fn take(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
        let notice = Self::peek(store);
        store.remove(keys::CURRENT_WARNING_MESSAGE)?;
        notice
    }

    /// Delete the slot
    pub fn clear(store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.remove(keys::CURRENT_WARNING_MESSAGE)
    }
}
