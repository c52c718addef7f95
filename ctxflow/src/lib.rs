//! # Ctxflow
//!
//! Diagnostic context propagation for processes that reuse worker threads.
//!
//! A context is a small string map (a trace id, a user id) that follows one
//! logical flow of execution. Thread-local storage gets this wrong under a
//! pool: a reused thread keeps the previous task's values and submitted
//! tasks never see their submitter's. Ctxflow instead gives every execution
//! unit an explicit [`ContextStore`](context::ContextStore) with:
//!
//! - **Copy-on-write inheritance**: a spawned task starts from an
//!   independent snapshot of its parent; later writes on either side stay
//!   on that side
//! - **Minimal copying**: a unit copies its map only on the first write
//!   after it was shared, then writes in place
//! - **Reset on reuse**: pooled workers clear their context after every
//!   task, including tasks that panic
//!
//! ## Quick Start
//!
//! ```rust
//! use ctxflow::prelude::*;
//!
//! let pool = WorkerPool::new(PoolConfig::new().with_workers(2))?;
//!
//! let mut request = ContextStore::new();
//! let mut scope = RequestTraceScope::enter(&mut request, &TraceConfig::default(), Some("abc"))?;
//!
//! let handle = pool.submit(&mut scope, |worker| worker.get(TRACE_ID_KEY))?;
//! assert_eq!(handle.join()?, Some("abc".to_string()));
//! # Ok::<(), ctxflow::errors::ContextError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod context;
pub mod errors;
pub mod observability;
pub mod pool;
pub mod propagation;
pub mod trace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{
        ContextMap, ContextSnapshot, ContextStore, CountingDuplicationObserver,
        DuplicationObserver, DuplicationReason, LoggingDuplicationObserver,
        NoOpDuplicationObserver, OwnershipState,
    };
    pub use crate::errors::{ContextError, InvalidArgumentError, InvalidKeyError};
    pub use crate::observability::{init_tracing, LogFormat, LoggingConfig};
    pub use crate::pool::{PoolConfig, TaskHandle, WorkerPool};
    pub use crate::propagation::{
        spawn_blocking_inherited, spawn_inherited, ContextualTask, ResetGuard,
    };
    pub use crate::trace::{
        generate_trace_id, inject_headers, put_trace_id, trace_id, trace_span,
        RequestTraceScope, TraceConfig, TRACE_ID_HEADER, TRACE_ID_KEY,
    };
}
