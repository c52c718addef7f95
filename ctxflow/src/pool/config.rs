//! Worker pool configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`WorkerPool`](super::WorkerPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Prefix for worker thread names; the worker index is appended.
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, usize::from) * 2
}

fn default_thread_name_prefix() -> String {
    "ctx-pool-".to_string()
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            thread_name_prefix: default_thread_name_prefix(),
        }
    }
}

impl PoolConfig {
    /// Creates a new pool configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of workers (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Returns the thread name for worker `index`.
    #[must_use]
    pub fn thread_name(&self, index: usize) -> String {
        format!("{}{}", self.thread_name_prefix, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert!(config.workers >= 2);
        assert_eq!(config.thread_name(3), "ctx-pool-3");
    }

    #[test]
    fn test_workers_floor() {
        let config = PoolConfig::new().with_workers(0);
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: PoolConfig = serde_json::from_str(r#"{"workers": 3}"#).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.thread_name_prefix, "ctx-pool-");
    }
}
