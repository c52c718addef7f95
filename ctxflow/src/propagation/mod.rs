//! Context hand-off between execution units.
//!
//! Submission captures a snapshot of the submitting unit; execution seeds
//! the running unit with it and resets the unit afterwards, however the task
//! body ends.

mod spawn;
mod task;

pub use spawn::{spawn_blocking_inherited, spawn_inherited};
pub use task::{ContextualTask, ResetGuard};
