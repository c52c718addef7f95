//! Error types for the ctxflow crate.
//!
//! Store operations only fail on caller mistakes (an absent key, an absent
//! mapping). The pool adds the failures that come from running tasks on
//! worker threads.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for ctxflow operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A `put` was attempted with an empty or absent key.
    #[error("{0}")]
    InvalidKey(#[from] InvalidKeyError),

    /// A `restore` was attempted without a mapping.
    #[error("{0}")]
    InvalidArgument(#[from] InvalidArgumentError),

    /// A task body panicked on a pool worker.
    #[error("Task panicked on worker '{worker}': {message}")]
    TaskPanicked {
        /// The worker thread name.
        worker: String,
        /// The panic payload rendered as text.
        message: String,
    },

    /// The pool no longer accepts or runs tasks.
    #[error("Worker pool is shut down")]
    PoolShutdown,

    /// IO error (worker thread spawn).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContextError {
    /// Creates an invalid key error for the given operation.
    #[must_use]
    pub fn invalid_key(operation: &'static str) -> Self {
        Self::InvalidKey(InvalidKeyError::new(operation))
    }

    /// Creates an invalid argument error for the given operation.
    #[must_use]
    pub fn invalid_argument(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument(InvalidArgumentError::new(operation, reason))
    }

    /// Creates a task panicked error.
    #[must_use]
    pub fn task_panicked(worker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TaskPanicked {
            worker: worker.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by the caller rather than the runtime.
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidKey(_) | Self::InvalidArgument(_))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::InvalidKey(err) => {
                map.insert("type".to_string(), serde_json::json!("InvalidKey"));
                map.insert("operation".to_string(), serde_json::json!(err.operation));
            }
            Self::InvalidArgument(err) => {
                map.insert("type".to_string(), serde_json::json!("InvalidArgument"));
                map.insert("operation".to_string(), serde_json::json!(err.operation));
                map.insert("reason".to_string(), serde_json::json!(err.reason));
            }
            Self::TaskPanicked { worker, message } => {
                map.insert("type".to_string(), serde_json::json!("TaskPanicked"));
                map.insert("worker".to_string(), serde_json::json!(worker));
                map.insert("panic".to_string(), serde_json::json!(message));
            }
            Self::PoolShutdown => {
                map.insert("type".to_string(), serde_json::json!("PoolShutdown"));
            }
            Self::Io(err) => {
                map.insert("type".to_string(), serde_json::json!("Io"));
                map.insert("kind".to_string(), serde_json::json!(format!("{:?}", err.kind())));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Error raised when a context key is empty or absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid key passed to '{operation}': key must be a non-empty string")]
pub struct InvalidKeyError {
    /// The store operation that rejected the key.
    pub operation: &'static str,
}

impl InvalidKeyError {
    /// Creates a new invalid key error.
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

/// Error raised when a required argument is absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid argument passed to '{operation}': {reason}")]
pub struct InvalidArgumentError {
    /// The store operation that rejected the argument.
    pub operation: &'static str,
    /// Why the argument was rejected.
    pub reason: String,
}

impl InvalidArgumentError {
    /// Creates a new invalid argument error.
    #[must_use]
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_message() {
        let err = ContextError::invalid_key("put");
        assert!(err.to_string().contains("'put'"));
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_invalid_argument_to_dict() {
        let err = ContextError::invalid_argument("restore", "mapping is absent");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "InvalidArgument");
        assert_eq!(dict.get("operation").unwrap(), "restore");
        assert_eq!(dict.get("reason").unwrap(), "mapping is absent");
    }

    #[test]
    fn test_task_panicked_to_dict() {
        let err = ContextError::task_panicked("ctx-pool-0", "boom");
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "TaskPanicked");
        assert_eq!(dict.get("worker").unwrap(), "ctx-pool-0");
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_pool_shutdown_message() {
        let err = ContextError::PoolShutdown;
        assert_eq!(err.to_string(), "Worker pool is shut down");
        assert_eq!(err.to_dict().get("type").unwrap(), "PoolShutdown");
    }
}
