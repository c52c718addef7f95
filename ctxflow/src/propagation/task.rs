//! Tasks that carry their submitter's context.

use crate::context::{ContextSnapshot, ContextStore};
use std::ops::{Deref, DerefMut};

/// Clears a unit's context when dropped.
///
/// Dereferences to the guarded store so the task body keeps using it. The
/// reset runs on every exit path, including unwinding.
pub struct ResetGuard<'a> {
    store: &'a mut ContextStore,
}

impl<'a> ResetGuard<'a> {
    /// Guards the given store.
    pub fn new(store: &'a mut ContextStore) -> Self {
        Self { store }
    }
}

impl Deref for ResetGuard<'_> {
    type Target = ContextStore;

    fn deref(&self) -> &ContextStore {
        self.store
    }
}

impl DerefMut for ResetGuard<'_> {
    fn deref_mut(&mut self) -> &mut ContextStore {
        self.store
    }
}

impl Drop for ResetGuard<'_> {
    fn drop(&mut self) {
        self.store.clear();
        tracing::trace!("Execution unit context reset");
    }
}

/// A task body paired with the context captured when it was submitted.
pub struct ContextualTask<F> {
    snapshot: ContextSnapshot,
    body: F,
}

impl<F> ContextualTask<F> {
    /// Captures `parent`'s context for `body`.
    ///
    /// The parent is marked shared, so its next write copies and can never
    /// reach the task.
    pub fn capture(parent: &mut ContextStore, body: F) -> Self {
        Self::from_snapshot(parent.snapshot(), body)
    }

    /// Pairs `body` with an existing snapshot.
    pub fn from_snapshot(snapshot: ContextSnapshot, body: F) -> Self {
        Self { snapshot, body }
    }

    /// Returns the captured context.
    #[must_use]
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    /// Runs the body on a worker's store.
    ///
    /// The store is seeded with the captured snapshot before the body runs
    /// and cleared after it returns or unwinds.
    pub fn run_on<R>(self, worker: &mut ContextStore) -> R
    where
        F: FnOnce(&mut ContextStore) -> R,
    {
        worker.adopt(self.snapshot);
        let mut guard = ResetGuard::new(worker);
        (self.body)(&mut *guard)
    }
}

impl<F> std::fmt::Debug for ContextualTask<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualTask")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}
