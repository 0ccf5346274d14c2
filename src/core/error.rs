//! Error types for coordinator operations and relayed action outcomes.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

use super::executor::Task;
use super::predicate::MaskId;

/// Errors produced by the coordinator itself.
///
/// Action failures are never reported through this type; they travel through the
/// action's own [`Completion`](super::Completion) as an [`ActionError`].
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// `unmask` was called with an id that is not currently registered.
    #[error("mask not registered: {0}")]
    UnregisteredMask(MaskId),
    /// A blocking call was interrupted through `interrupt_waiters`.
    #[error("interrupted while waiting")]
    Interrupted,
    /// A blocking call exceeded the configured wait timeout.
    #[error("timed out after {0:?} while waiting")]
    TimedOut(Duration),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

/// Failure outcome of a scheduled action, relayed verbatim to its completion handle.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action (or the future it returned) resolved with an error.
    #[error("action failed: {0}")]
    Failed(#[from] anyhow::Error),
    /// The action panicked while being invoked or polled.
    #[error("action panicked: {0}")]
    Panicked(String),
    /// The action was dropped without ever running, or its outcome was already taken.
    #[error("action abandoned before completion")]
    Abandoned,
}

impl ActionError {
    /// Build an error from a panic payload caught with `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(message)
    }
}

/// Rejection returned by an [`Executor`](super::Executor); the task is handed back.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The executor no longer accepts work.
    #[error("executor has been shut down")]
    Shutdown(Task),
    /// The executor's queue is at capacity.
    #[error("executor queue is full")]
    QueueFull(Task),
}

impl ExecutorError {
    /// Recover the rejected task.
    #[must_use]
    pub fn into_task(self) -> Task {
        match self {
            Self::Shutdown(task) | Self::QueueFull(task) => task,
        }
    }
}

/// Result alias for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Outcome of a scheduled action as observed through its completion handle.
pub type ActionResult<T> = Result<T, ActionError>;
