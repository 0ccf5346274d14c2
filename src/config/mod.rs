//! Configuration models for coordinators and their executors.

pub mod coordinator;
pub mod worker_pool;

pub use coordinator::{CoordinatorConfig, ExecutorConfig};
pub use worker_pool::WorkerPoolConfig;
