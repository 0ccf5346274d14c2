//! Worker thread pool configuration.

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_QUEUE_DEPTH: usize = 4096;
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const DEFAULT_THREAD_PREFIX: &str = "condo-worker";

/// Configuration for [`ThreadPoolExecutor`](crate::core::ThreadPoolExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Maximum tasks waiting for a worker before submissions are rejected.
    pub max_queue_depth: usize,
    /// Stack size of each worker thread in bytes.
    pub thread_stack_size: usize,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().max(1),
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            thread_stack_size: DEFAULT_STACK_SIZE,
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
        }
    }
}

impl WorkerPoolConfig {
    /// Default configuration sized to the number of CPUs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the maximum queue depth.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }
}
