//! Tokio spawning with inherited context.

use crate::context::ContextStore;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

fn child_of(parent: &mut ContextStore) -> ContextStore {
    ContextStore::inherit(parent.snapshot()).with_observer(Arc::clone(parent.observer()))
}

/// Spawns an async task that owns a copy of `parent`'s context.
///
/// The child store lives exactly as long as the task, so nothing needs
/// resetting afterwards.
pub fn spawn_inherited<F, Fut>(parent: &mut ContextStore, task: F) -> JoinHandle<Fut::Output>
where
    F: FnOnce(ContextStore) -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let child = child_of(parent);
    tokio::spawn(async move { task(child).await })
}

/// Runs a blocking closure on tokio's blocking pool with a copy of
/// `parent`'s context.
pub fn spawn_blocking_inherited<F, R>(parent: &mut ContextStore, task: F) -> JoinHandle<R>
where
    F: FnOnce(&mut ContextStore) -> R + Send + 'static,
    R: Send + 'static,
{
    let mut child = child_of(parent);
    tokio::task::spawn_blocking(move || task(&mut child))
}
