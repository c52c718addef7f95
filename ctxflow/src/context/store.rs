//! Per-execution-unit context store with copy-on-write inheritance.

use super::{
    ContextMap, ContextSnapshot, DuplicationObserver, DuplicationReason, NoOpDuplicationObserver,
};
use crate::errors::ContextError;
use std::collections::HashMap;
use std::sync::Arc;

/// What the unit currently holds and whether it may write in place.
enum Ownership {
    /// No map yet, or the map was detached by `clear`.
    Uninitialized,
    /// The map is private to this unit and is mutated in place.
    Write(Arc<ContextMap>),
    /// The map may be visible elsewhere; the next write copies it first.
    Shared(Arc<ContextMap>),
}

/// Diagnostic view of a store's ownership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipState {
    /// No map is held.
    Uninitialized,
    /// A private map is held.
    Write,
    /// A possibly shared map is held.
    Shared,
}

/// The diagnostic context owned by one execution unit.
///
/// A store belongs to exactly one sequential flow (a thread, a pool worker,
/// an async task) and is passed explicitly to the code running in it.
/// Handing context to another unit goes through [`snapshot`](Self::snapshot)
/// and [`restore`](Self::restore), or [`fork`](Self::fork) for lazy copies.
pub struct ContextStore {
    ownership: Ownership,
    observer: Arc<dyn DuplicationObserver>,
}

impl ContextStore {
    /// Creates a new store with no context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ownership: Ownership::Uninitialized,
            observer: Arc::new(NoOpDuplicationObserver),
        }
    }

    /// Creates a store seeded with an inherited snapshot.
    ///
    /// The snapshot is already private to the new unit, so it is adopted
    /// without another copy and the unit starts in the write state.
    #[must_use]
    pub fn inherit(snapshot: ContextSnapshot) -> Self {
        let mut store = Self::new();
        store.adopt(snapshot);
        store
    }

    /// Sets the duplication observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DuplicationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the duplication observer.
    #[must_use]
    pub fn observer(&self) -> &Arc<dyn DuplicationObserver> {
        &self.observer
    }

    /// Puts a value under `key`.
    ///
    /// The first write after a share (or on a unit without a map) works on a
    /// fresh private copy; later writes mutate that copy in place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `key` is empty or absent. The store is left
    /// unchanged.
    pub fn put<'k>(
        &mut self,
        key: impl Into<Option<&'k str>>,
        value: impl Into<String>,
    ) -> Result<(), ContextError> {
        let key = valid_key(key.into()).ok_or_else(|| ContextError::invalid_key("put"))?;
        self.privatize().insert(key.to_owned(), value.into());
        Ok(())
    }

    /// Gets the value stored under `key`.
    ///
    /// Never changes the ownership state.
    #[must_use]
    pub fn get<'k>(&self, key: impl Into<Option<&'k str>>) -> Option<String> {
        let key = valid_key(key.into())?;
        self.current().and_then(|map| map.get(key))
    }

    /// Removes the value stored under `key`.
    ///
    /// A no-op for an empty or absent key and for a unit without a map.
    /// Otherwise the map is privatized first, like `put`.
    pub fn remove<'k>(&mut self, key: impl Into<Option<&'k str>>) {
        let Some(key) = valid_key(key.into()) else {
            return;
        };
        if self.current().is_none() {
            return;
        }
        self.privatize().remove(key);
    }

    /// Detaches the current map.
    ///
    /// The map itself is never cleared in place, since a parent or a sibling
    /// may still reference it.
    pub fn clear(&mut self) {
        self.ownership = Ownership::Uninitialized;
    }

    /// Returns an independent copy of the current context.
    ///
    /// The unit is marked shared, so its next write copies before mutating.
    /// Returns an empty snapshot for a unit without a map.
    pub fn snapshot(&mut self) -> ContextSnapshot {
        match std::mem::replace(&mut self.ownership, Ownership::Uninitialized) {
            Ownership::Write(map) | Ownership::Shared(map) => {
                let entries = map.to_map();
                self.observer
                    .on_duplicate(DuplicationReason::Snapshot, entries.len());
                self.ownership = Ownership::Shared(map);
                ContextSnapshot::from(entries)
            }
            Ownership::Uninitialized => ContextSnapshot::new(),
        }
    }

    /// Replaces the current context with a private copy of `entries`.
    ///
    /// An empty mapping is valid and clears the existing context.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `entries` is absent. The store is left
    /// unchanged.
    pub fn restore(&mut self, entries: Option<&HashMap<String, String>>) -> Result<(), ContextError> {
        let entries = entries
            .ok_or_else(|| ContextError::invalid_argument("restore", "context mapping is absent"))?;

        self.observer
            .on_duplicate(DuplicationReason::Restore, entries.len());
        self.ownership = Ownership::Write(Arc::new(ContextMap::from_entries(entries.clone())));
        Ok(())
    }

    /// Replaces the current context with an owned snapshot, without copying.
    pub fn adopt(&mut self, snapshot: ContextSnapshot) {
        tracing::trace!(entries = snapshot.len(), "Adopting inherited context");
        self.ownership = Ownership::Write(Arc::new(ContextMap::from_entries(snapshot.into_map())));
    }

    /// Creates a child unit that lazily shares this unit's map.
    ///
    /// Both sides are marked shared; whichever writes first copies, so a
    /// child that only reads never pays for a copy.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        let ownership = match std::mem::replace(&mut self.ownership, Ownership::Uninitialized) {
            Ownership::Write(map) | Ownership::Shared(map) => {
                self.ownership = Ownership::Shared(Arc::clone(&map));
                Ownership::Shared(map)
            }
            Ownership::Uninitialized => Ownership::Uninitialized,
        };

        Self {
            ownership,
            observer: Arc::clone(&self.observer),
        }
    }

    /// Returns the ownership state.
    #[must_use]
    pub fn ownership(&self) -> OwnershipState {
        match self.ownership {
            Ownership::Uninitialized => OwnershipState::Uninitialized,
            Ownership::Write(_) => OwnershipState::Write,
            Ownership::Shared(_) => OwnershipState::Shared,
        }
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.current().is_some_and(|map| map.contains_key(key))
    }

    /// Returns all keys currently set.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.current().map(ContextMap::keys).unwrap_or_default()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current().map_or(0, ContextMap::len)
    }

    /// Returns true if no entries are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Option<&ContextMap> {
        match &self.ownership {
            Ownership::Write(map) | Ownership::Shared(map) => Some(map.as_ref()),
            Ownership::Uninitialized => None,
        }
    }

    /// Returns a map this unit may mutate in place, copying first if needed.
    fn privatize(&mut self) -> Arc<ContextMap> {
        let map = match &self.ownership {
            Ownership::Write(map) => return Arc::clone(map),
            Ownership::Shared(map) => {
                let copy = ContextMap::duplicate(map);
                self.observer
                    .on_duplicate(DuplicationReason::Privatize, copy.len());
                copy
            }
            Ownership::Uninitialized => {
                self.observer.on_duplicate(DuplicationReason::Privatize, 0);
                ContextMap::new()
            }
        };

        let map = Arc::new(map);
        self.ownership = Ownership::Write(Arc::clone(&map));
        map
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("ownership", &self.ownership())
            .field("len", &self.len())
            .finish()
    }
}

fn valid_key(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CountingDuplicationObserver, MockDuplicationObserver};
    use mockall::predicate::eq;

    fn counted() -> (ContextStore, Arc<CountingDuplicationObserver>) {
        let observer = Arc::new(CountingDuplicationObserver::new());
        let store = ContextStore::new().with_observer(observer.clone());
        (store, observer)
    }

    #[test]
    fn test_put_and_get() {
        let mut store = ContextStore::new();
        store.put("traceId", "abc").unwrap();

        assert_eq!(store.get("traceId"), Some("abc".to_string()));
        assert_eq!(store.ownership(), OwnershipState::Write);
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = ContextStore::new();
        store.put("k", "1").unwrap();
        store.put("k", "2").unwrap();

        assert_eq!(store.get("k"), Some("2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_rejects_empty_and_absent_keys() {
        let mut store = ContextStore::new();

        let err = store.put("", "x").unwrap_err();
        assert!(matches!(err, ContextError::InvalidKey(_)));
        let err = store.put(None::<&str>, "x").unwrap_err();
        assert!(matches!(err, ContextError::InvalidKey(_)));

        assert_eq!(store.get(""), None);
        assert_eq!(store.get(None::<&str>), None);
        assert_eq!(store.ownership(), OwnershipState::Uninitialized);
    }

    #[test]
    fn test_invalid_put_leaves_shared_state_untouched() {
        let (mut store, observer) = counted();
        store.put("k", "v").unwrap();
        let _ = store.snapshot();
        observer.reset();

        assert!(store.put("", "x").is_err());
        assert_eq!(store.ownership(), OwnershipState::Shared);
        assert_eq!(observer.total(), 0);
    }

    #[test]
    fn test_get_does_not_change_state() {
        let mut store = ContextStore::new();
        store.put("k", "v").unwrap();
        let _ = store.snapshot();

        assert_eq!(store.get("k"), Some("v".to_string()));
        assert_eq!(store.get("missing"), None);
        assert_eq!(store.ownership(), OwnershipState::Shared);
    }

    #[test]
    fn test_first_write_creates_map_once() {
        let (mut store, observer) = counted();
        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();
        store.put("c", "3").unwrap();

        assert_eq!(observer.privatizations(), 1);
    }

    #[test]
    fn test_write_after_snapshot_copies_once() {
        let (mut store, observer) = counted();
        store.put("a", "1").unwrap();
        let _ = store.snapshot();
        observer.reset();

        store.put("b", "2").unwrap();
        store.put("c", "3").unwrap();

        assert_eq!(observer.privatizations(), 1);
        assert_eq!(store.ownership(), OwnershipState::Write);
    }

    #[test]
    fn test_privatize_reports_entry_count() {
        let mut mock = MockDuplicationObserver::new();
        mock.expect_on_duplicate()
            .with(eq(DuplicationReason::Privatize), eq(0))
            .times(1)
            .return_const(());
        mock.expect_on_duplicate()
            .with(eq(DuplicationReason::Snapshot), eq(1))
            .times(1)
            .return_const(());
        mock.expect_on_duplicate()
            .with(eq(DuplicationReason::Privatize), eq(1))
            .times(1)
            .return_const(());

        let mut store = ContextStore::new().with_observer(Arc::new(mock));
        store.put("a", "1").unwrap();
        let _ = store.snapshot();
        store.put("b", "2").unwrap();
    }

    #[test]
    fn test_remove() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();
        store.remove("a");

        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some("2".to_string()));
    }

    #[test]
    fn test_remove_without_map_is_noop() {
        let (mut store, observer) = counted();
        store.remove("a");
        store.remove("");
        store.remove(None::<&str>);

        assert_eq!(store.ownership(), OwnershipState::Uninitialized);
        assert_eq!(observer.total(), 0);
    }

    #[test]
    fn test_remove_after_snapshot_privatizes() {
        let (mut store, observer) = counted();
        store.put("a", "1").unwrap();
        let snapshot = store.snapshot();
        observer.reset();

        store.remove("a");

        assert_eq!(observer.privatizations(), 1);
        assert_eq!(store.ownership(), OwnershipState::Write);
        assert_eq!(store.get("a"), None);
        assert_eq!(snapshot.get("a"), Some("1"));
    }

    #[test]
    fn test_clear_detaches() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
        assert_eq!(store.ownership(), OwnershipState::Uninitialized);
    }

    #[test]
    fn test_clear_does_not_touch_forked_child() {
        let mut parent = ContextStore::new();
        parent.put("a", "1").unwrap();
        let child = parent.fork();

        parent.clear();

        assert_eq!(child.get("a"), Some("1".to_string()));
    }

    #[test]
    fn test_snapshot_of_empty_store() {
        let mut store = ContextStore::new();
        let snapshot = store.snapshot();

        assert!(snapshot.is_empty());
        assert_eq!(store.ownership(), OwnershipState::Uninitialized);
    }

    #[test]
    fn test_snapshot_marks_shared() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();
        let snapshot = store.snapshot();

        assert_eq!(snapshot.get("a"), Some("1"));
        assert_eq!(store.ownership(), OwnershipState::Shared);
    }

    #[test]
    fn test_restore_replaces_context() {
        let mut store = ContextStore::new();
        store.put("old", "1").unwrap();

        let mut entries = HashMap::new();
        entries.insert("new".to_string(), "2".to_string());
        store.restore(Some(&entries)).unwrap();
        entries.insert("late".to_string(), "3".to_string());

        assert_eq!(store.get("old"), None);
        assert_eq!(store.get("new"), Some("2".to_string()));
        assert_eq!(store.get("late"), None);
        assert_eq!(store.ownership(), OwnershipState::Write);
    }

    #[test]
    fn test_restore_empty_mapping_clears() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();
        store.restore(Some(&HashMap::new())).unwrap();

        assert!(store.is_empty());
        assert_eq!(store.ownership(), OwnershipState::Write);
    }

    #[test]
    fn test_restore_rejects_absent_mapping() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();

        let err = store.restore(None).unwrap_err();
        assert!(matches!(err, ContextError::InvalidArgument(_)));
        assert_eq!(store.get("a"), Some("1".to_string()));
    }

    #[test]
    fn test_restore_then_write_does_not_copy() {
        let (mut store, observer) = counted();
        store.restore(Some(&HashMap::new())).unwrap();
        store.put("a", "1").unwrap();

        assert_eq!(observer.privatizations(), 0);
        assert_eq!(observer.count(DuplicationReason::Restore), 1);
    }

    #[test]
    fn test_inherit_starts_in_write_state() {
        let store = ContextStore::inherit(ContextSnapshot::new().with_entry("a", "1"));

        assert_eq!(store.ownership(), OwnershipState::Write);
        assert_eq!(store.get("a"), Some("1".to_string()));
    }

    #[test]
    fn test_fork_shares_lazily() {
        let (mut parent, observer) = counted();
        parent.put("a", "1").unwrap();
        observer.reset();

        let mut child = parent.fork();
        assert_eq!(parent.ownership(), OwnershipState::Shared);
        assert_eq!(child.ownership(), OwnershipState::Shared);
        assert_eq!(child.get("a"), Some("1".to_string()));
        assert_eq!(observer.total(), 0);

        child.put("a", "child").unwrap();
        parent.put("a", "parent").unwrap();

        assert_eq!(observer.privatizations(), 2);
        assert_eq!(child.get("a"), Some("child".to_string()));
        assert_eq!(parent.get("a"), Some("parent".to_string()));
    }

    #[test]
    fn test_fork_of_empty_store() {
        let mut parent = ContextStore::new();
        let mut child = parent.fork();
        child.put("a", "1").unwrap();

        assert_eq!(parent.get("a"), None);
        assert_eq!(parent.ownership(), OwnershipState::Uninitialized);
    }

    #[test]
    fn test_keys_and_contains() {
        let mut store = ContextStore::new();
        assert!(store.keys().is_empty());

        store.put("a", "1").unwrap();
        store.put("b", "2").unwrap();

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(store.contains_key("a"));
        assert!(!store.contains_key("c"));
    }

    #[test]
    fn test_debug_output() {
        let mut store = ContextStore::new();
        store.put("a", "1").unwrap();
        let debug = format!("{store:?}");

        assert!(debug.contains("Write"));
        assert!(debug.contains("len: 1"));
    }
}
