//! Runtime adapters for executing released actions.

pub mod tokio_spawner;

pub use tokio_spawner::TokioExecutor;
