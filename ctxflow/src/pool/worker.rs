//! Worker threads and task dispatch.

use super::{PoolConfig, TaskHandle};
use crate::context::{ContextStore, DuplicationObserver, NoOpDuplicationObserver};
use crate::errors::ContextError;
use crate::propagation::ContextualTask;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, warn};

type Job = Box<dyn FnOnce(&mut ContextStore) + Send + 'static>;

struct Worker {
    name: String,
    thread: Option<thread::JoinHandle<()>>,
}

/// A fixed-size pool of worker threads with context hand-off.
///
/// Workers are reused across tasks. Every task runs with the context its
/// submitter had at submission time, and the worker's context is cleared
/// after each task whether it returns or panics.
pub struct WorkerPool {
    config: PoolConfig,
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Starts a pool.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a worker thread cannot be spawned.
    pub fn new(config: PoolConfig) -> Result<Self, ContextError> {
        Self::with_observer(config, Arc::new(NoOpDuplicationObserver))
    }

    /// Starts a pool whose worker stores report copies to `observer`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a worker thread cannot be spawned.
    pub fn with_observer(
        config: PoolConfig,
        observer: Arc<dyn DuplicationObserver>,
    ) -> Result<Self, ContextError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let count = config.workers.max(1);
        let mut workers = Vec::with_capacity(count);

        for index in 0..count {
            let name = config.thread_name(index);
            let receiver = Arc::clone(&receiver);
            let observer = Arc::clone(&observer);
            let thread = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(&receiver, observer))?;
            workers.push(Worker {
                name,
                thread: Some(thread),
            });
        }

        debug!(workers = count, prefix = %config.thread_name_prefix, "Worker pool started");

        Ok(Self {
            config,
            sender: Some(sender),
            workers,
        })
    }

    /// Submits a task carrying `parent`'s current context.
    ///
    /// `parent` is marked shared, so its later writes never reach the task.
    ///
    /// # Errors
    ///
    /// Returns `PoolShutdown` if the pool no longer accepts tasks.
    pub fn submit<F, R>(&self, parent: &mut ContextStore, body: F) -> Result<TaskHandle<R>, ContextError>
    where
        F: FnOnce(&mut ContextStore) -> R + Send + 'static,
        R: Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(ContextError::PoolShutdown)?;
        let task = ContextualTask::capture(parent, body);
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::new(move |store: &mut ContextStore| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run_on(store)));
            let result = outcome.map_err(|payload| {
                let worker = thread::current()
                    .name()
                    .unwrap_or("<unnamed>")
                    .to_string();
                let message = panic_message(payload.as_ref());
                warn!(worker = %worker, panic = %message, "Pooled task panicked");
                ContextError::task_panicked(worker, message)
            });
            // The submitter may have dropped the handle.
            let _ = tx.send(result);
        });

        sender.send(job).map_err(|_| ContextError::PoolShutdown)?;
        Ok(TaskHandle::new(rx))
    }

    /// Submits a task without keeping its result.
    ///
    /// # Errors
    ///
    /// Returns `PoolShutdown` if the pool no longer accepts tasks.
    pub fn execute<F>(&self, parent: &mut ContextStore, body: F) -> Result<(), ContextError>
    where
        F: FnOnce(&mut ContextStore) + Send + 'static,
    {
        self.submit(parent, body).map(drop)
    }

    /// Stops accepting tasks, lets queued tasks finish and joins the workers.
    ///
    /// Idempotent.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    warn!(worker = %worker.name, "Worker thread terminated abnormally");
                }
            }
        }

        debug!(workers = self.workers.len(), "Worker pool shut down");
    }

    /// Returns true once `shutdown` has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.sender.is_none()
    }

    /// Returns the number of workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Returns the worker thread names.
    #[must_use]
    pub fn worker_names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name.clone()).collect()
    }

    /// Returns the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.worker_count())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn worker_loop(receiver: &Mutex<mpsc::Receiver<Job>>, observer: Arc<dyn DuplicationObserver>) {
    let mut store = ContextStore::new().with_observer(observer);

    loop {
        let job = receiver.lock().recv();
        match job {
            Ok(job) => job(&mut store),
            Err(_) => break,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
