//! Handles for tasks submitted to a worker pool.

use crate::errors::ContextError;
use tokio::sync::oneshot;

/// The eventual result of a pooled task.
#[derive(Debug)]
pub struct TaskHandle<R> {
    receiver: oneshot::Receiver<Result<R, ContextError>>,
}

impl<R> TaskHandle<R> {
    pub(crate) fn new(receiver: oneshot::Receiver<Result<R, ContextError>>) -> Self {
        Self { receiver }
    }

    /// Blocks the calling thread until the task finishes.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`wait`](Self::wait) there.
    ///
    /// # Errors
    ///
    /// Returns `TaskPanicked` if the body panicked, or `PoolShutdown` if the
    /// pool dropped the task without running it.
    pub fn join(self) -> Result<R, ContextError> {
        self.receiver
            .blocking_recv()
            .map_err(|_| ContextError::PoolShutdown)?
    }

    /// Waits asynchronously until the task finishes.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join).
    pub async fn wait(self) -> Result<R, ContextError> {
        self.receiver.await.map_err(|_| ContextError::PoolShutdown)?
    }
}
