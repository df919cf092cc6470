//! Ordered pattern → message mapping.
//!
//! Iteration order is significant: the gate scans entries front to back and
//! stops at the first match. When a pattern is inserted twice the entry keeps
//! the position of its first occurrence and takes the message of the last.
//!
//! The mapping serializes as a JSON object whose key order is the iteration
//! order, so it round-trips through the store unchanged.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A single restricted pattern and its warning message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEntry {
    /// Host/path glob (literal text plus `*` wildcards)
    pub pattern: String,
    /// User-facing warning text
    pub message: String,
}

/// Ordered mapping from pattern to message with unique patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMapping {
    entries: Vec<PatternEntry>,
    /// Pattern → index into `entries`
    index: HashMap<String, usize>,
}

impl PatternMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry.
    ///
    /// Returns `true` when the pattern was already present; in that case the
    /// message is replaced in place and the entry keeps its original position.
    pub fn insert(&mut self, pattern: impl Into<String>, message: impl Into<String>) -> bool {
        let pattern = pattern.into();
        let message = message.into();
        if let Some(&pos) = self.index.get(&pattern) {
            self.entries[pos].message = message;
            return true;
        }
        self.index.insert(pattern.clone(), self.entries.len());
        self.entries.push(PatternEntry { pattern, message });
        false
    }

    /// Look up the message for an exact pattern
    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.index
            .get(pattern)
            .map(|&pos| self.entries[pos].message.as_str())
    }

    /// Entries in iteration order
    pub fn iter(&self) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter()
    }

    /// Entries as a slice, in iteration order
    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, M: Into<String>> FromIterator<(P, M)> for PatternMapping {
    fn from_iter<I: IntoIterator<Item = (P, M)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (pattern, message) in iter {
            mapping.insert(pattern, message);
        }
        mapping
    }
}

impl<'a> IntoIterator for &'a PatternMapping {
    type Item = &'a PatternEntry;
    type IntoIter = std::slice::Iter<'a, PatternEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for PatternMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.pattern, &entry.message)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PatternMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = PatternMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of pattern strings to message strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut mapping = PatternMapping::new();
                while let Some((pattern, message)) = access.next_entry::<String, String>()? {
                    mapping.insert(pattern, message);
                }
                Ok(mapping)
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}
