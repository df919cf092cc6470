//! Key-value store shared by the synchronizer, the gate and the renderer.
//!
//! Components never call each other directly; they communicate only through
//! the keys in [`keys`]. Every `set` replaces the whole value of one key.
//!
//! Two implementations are provided:
//! - [`MemoryStore`]: process-local, used by tests and one-shot commands
//! - [`FileStore`]: JSON file persisted across restarts with atomic writes

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Well-known storage keys
pub mod keys {
    /// Serialized `PatternMapping`
    pub const RESTRICTED_WEBSITES: &str = "restrictedWebsitesData";
    /// Serialized `PendingNotice`, absent when nothing is pending
    pub const CURRENT_WARNING_MESSAGE: &str = "currentWarningMessage";
    /// Timestamp and line counts of the last successful synchronization
    pub const LAST_SYNC: &str = "lastSyncRecord";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("value under key '{key}' has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("value for key '{key}' could not be serialized: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Process-wide key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value of a key
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value of a key in full
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete a key; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl dyn KeyValueStore + '_ {
    /// Read and decode a typed value
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encode and store a typed value
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value)
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// JSON-file backed store.
///
/// The whole file is loaded once on open and kept in memory; every mutation
/// rewrites the file through a temp file and rename so a crash never leaves a
/// half-written store behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
    existed: bool,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; the file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let existed = path.exists();

        let values = if existed {
            let contents = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            if contents.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            Map::new()
        };

        log::debug!(
            "Opened store {:?} ({} keys, existed={})",
            path,
            values.len(),
            existed
        );

        Ok(Self {
            path,
            values: Mutex::new(values),
            existed,
        })
    }

    /// Whether the backing file existed when the store was opened
    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content =
            serde_json::to_string_pretty(values).map_err(|source| StoreError::Encode {
                key: "*".to_string(),
                source,
            })?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(io_err)?;
        fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        let previous = values.insert(key.to_string(), value);
        if let Err(e) = self.flush(&values) {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => values.insert(key.to_string(), old),
                None => values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        let Some(previous) = values.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&values) {
            values.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::PatternMapping;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", json!("v")).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!("v")));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        // Removing again is a no-op
        store.remove("k").unwrap();
    }

    #[test]
    fn test_typed_helpers() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        let mapping: PatternMapping = [("b.com", "2"), ("a.com", "1")].into_iter().collect();

        store.set_as(keys::RESTRICTED_WEBSITES, &mapping).unwrap();
        let loaded: PatternMapping = store.get_as(keys::RESTRICTED_WEBSITES).unwrap().unwrap();
        assert_eq!(loaded, mapping);
    }

    #[test]
    fn test_get_as_reports_decode_error() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.set(keys::RESTRICTED_WEBSITES, json!(["not", "a", "map"])).unwrap();

        let err = store
            .get_as::<PatternMapping>(keys::RESTRICTED_WEBSITES)
            .unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("storage.json")).unwrap();
        assert!(!store.existed());
        assert_eq!(store.get("anything").unwrap(), None);
        // Nothing is written until the first mutation
        assert!(!dir.path().join("storage.json").exists());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        {
            let store: Box<dyn KeyValueStore> = Box::new(FileStore::open(&path).unwrap());
            let mapping: PatternMapping =
                [("z.com", "last"), ("a.com", "first")].into_iter().collect();
            store.set_as(keys::RESTRICTED_WEBSITES, &mapping).unwrap();
            store.set(keys::CURRENT_WARNING_MESSAGE, json!({"message": "m", "tab_id": 1})).unwrap();
            store.remove(keys::CURRENT_WARNING_MESSAGE).unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.existed());
        assert_eq!(reopened.get(keys::CURRENT_WARNING_MESSAGE).unwrap(), None);

        let store: &dyn KeyValueStore = &reopened;
        let mapping: PatternMapping = store.get_as(keys::RESTRICTED_WEBSITES).unwrap().unwrap();
        let patterns: Vec<&str> = mapping.iter().map(|e| e.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["z.com", "a.com"]);

        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_file_store_empty_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "  \n").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.existed());
        assert_eq!(store.get("k").unwrap(), None);
    }
}
