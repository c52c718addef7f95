//! Independent point-in-time copies of a context.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An independent copy of a context, taken at a specific instant.
///
/// A snapshot owns its entries. Changing it never affects the store it came
/// from, and the store's later writes never show up in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSnapshot {
    entries: HashMap<String, String>,
}

impl ContextSnapshot {
    /// Creates a new empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, returning the snapshot for chaining.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Gets a value from the snapshot.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Inserts an entry into this copy only.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes an entry from this copy only.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    /// Borrows the entries as a map.
    #[must_use]
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.entries
    }

    /// Consumes the snapshot, returning the entries.
    #[must_use]
    pub fn into_map(self) -> HashMap<String, String> {
        self.entries
    }
}

impl From<HashMap<String, String>> for ContextSnapshot {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContextSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for ContextSnapshot {
    type Item = (String, String);
    type IntoIter = std::collections::hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
