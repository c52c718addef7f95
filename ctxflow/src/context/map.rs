//! The lock-guarded key/value map shared between execution units.

use parking_lot::Mutex;
use std::collections::HashMap;

/// A string-keyed diagnostic context map.
///
/// A map has exactly one mutating owner at a time. The lock only makes a
/// single copy or a single mutation atomic; it is never held across a whole
/// store operation.
#[derive(Debug, Default)]
pub struct ContextMap {
    entries: Mutex<HashMap<String, String>>,
}

impl ContextMap {
    /// Creates a new empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map that takes ownership of existing entries.
    #[must_use]
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Produces an independent map with the same entries as `source`.
    ///
    /// The copy is taken under the source's lock, so a concurrent writer on
    /// the source never sees, or causes, a partially copied state.
    #[must_use]
    pub fn duplicate(source: &Self) -> Self {
        Self::from_entries(source.to_map())
    }

    /// Gets a value from the map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries.lock().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    pub(crate) fn insert(&self, key: String, value: String) -> Option<String> {
        self.entries.lock().insert(key, value)
    }

    pub(crate) fn remove(&self, key: &str) -> Option<String> {
        self.entries.lock().remove(key)
    }
}

impl From<HashMap<String, String>> for ContextMap {
    fn from(entries: HashMap<String, String>) -> Self {
        Self::from_entries(entries)
    }
}
