//! Observers notified whenever a context map is copied.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Why a context map was copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DuplicationReason {
    /// First write after a share, or first write on a unit without a map.
    Privatize,
    /// An independent copy handed out by `snapshot`.
    Snapshot,
    /// A private copy taken from an externally supplied mapping.
    Restore,
}

impl DuplicationReason {
    /// Returns the reason as a static string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Privatize => "privatize",
            Self::Snapshot => "snapshot",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for DuplicationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for types that want to see every map copy made by a store.
#[cfg_attr(test, mockall::automock)]
pub trait DuplicationObserver: Send + Sync {
    /// Called after a copy of `entries` entries was made.
    fn on_duplicate(&self, reason: DuplicationReason, entries: usize);
}

/// No-op observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDuplicationObserver;

impl DuplicationObserver for NoOpDuplicationObserver {
    fn on_duplicate(&self, _reason: DuplicationReason, _entries: usize) {}
}

/// Logs every copy at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDuplicationObserver;

impl DuplicationObserver for LoggingDuplicationObserver {
    fn on_duplicate(&self, reason: DuplicationReason, entries: usize) {
        tracing::debug!(reason = %reason, entries, "Context map duplicated");
    }
}

/// Counts copies per reason.
#[derive(Debug, Default)]
pub struct CountingDuplicationObserver {
    privatize: AtomicUsize,
    snapshot: AtomicUsize,
    restore: AtomicUsize,
}

impl CountingDuplicationObserver {
    /// Creates a new counting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of copies made for the given reason.
    #[must_use]
    pub fn count(&self, reason: DuplicationReason) -> usize {
        self.counter(reason).load(Ordering::SeqCst)
    }

    /// Returns the number of copy-on-write privatizations.
    #[must_use]
    pub fn privatizations(&self) -> usize {
        self.count(DuplicationReason::Privatize)
    }

    /// Returns the total number of copies.
    #[must_use]
    pub fn total(&self) -> usize {
        self.privatizations()
            + self.count(DuplicationReason::Snapshot)
            + self.count(DuplicationReason::Restore)
    }

    /// Resets all counters.
    pub fn reset(&self) {
        self.privatize.store(0, Ordering::SeqCst);
        self.snapshot.store(0, Ordering::SeqCst);
        self.restore.store(0, Ordering::SeqCst);
    }

    fn counter(&self, reason: DuplicationReason) -> &AtomicUsize {
        match reason {
            DuplicationReason::Privatize => &self.privatize,
            DuplicationReason::Snapshot => &self.snapshot,
            DuplicationReason::Restore => &self.restore,
        }
    }
}

impl DuplicationObserver for CountingDuplicationObserver {
    fn on_duplicate(&self, reason: DuplicationReason, _entries: usize) {
        self.counter(reason).fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_observer_counts_per_reason() {
        let observer = CountingDuplicationObserver::new();
        observer.on_duplicate(DuplicationReason::Privatize, 0);
        observer.on_duplicate(DuplicationReason::Privatize, 3);
        observer.on_duplicate(DuplicationReason::Snapshot, 3);

        assert_eq!(observer.privatizations(), 2);
        assert_eq!(observer.count(DuplicationReason::Snapshot), 1);
        assert_eq!(observer.count(DuplicationReason::Restore), 0);
        assert_eq!(observer.total(), 3);

        observer.reset();
        assert_eq!(observer.total(), 0);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(DuplicationReason::Privatize.to_string(), "privatize");
        assert_eq!(DuplicationReason::Restore.as_str(), "restore");
    }

    #[test]
    fn test_noop_and_logging_observers() {
        NoOpDuplicationObserver.on_duplicate(DuplicationReason::Snapshot, 1);
        LoggingDuplicationObserver.on_duplicate(DuplicationReason::Snapshot, 1);
        // Should not panic
    }
}
