//! Diagnostic context storage.
//!
//! This module provides:
//! - A lock-guarded context map, the unit that is shared and then copied
//! - A per-execution-unit store implementing the copy-on-write policy
//! - Independent snapshots used to seed spawned tasks
//! - Observers for counting or logging map copies

mod map;
mod observer;
mod snapshot;
mod store;

pub use map::ContextMap;
#[cfg(test)]
pub use observer::MockDuplicationObserver;
pub use observer::{
    CountingDuplicationObserver, DuplicationObserver, DuplicationReason,
    LoggingDuplicationObserver, NoOpDuplicationObserver,
};
pub use snapshot::ContextSnapshot;
pub use store::{ContextStore, OwnershipState};
