//! A fixed-size pool of reused worker threads that propagates context.
//!
//! Each worker owns one [`ContextStore`](crate::context::ContextStore) for
//! its whole lifetime. Tasks carry their submitter's snapshot; the worker
//! installs it before the task body and clears it afterwards, so nothing
//! leaks from one task into the next.

mod config;
mod handle;
mod worker;

pub use config::PoolConfig;
pub use handle::TaskHandle;
pub use worker::WorkerPool;
