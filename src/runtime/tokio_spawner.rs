//! Tokio runtime executor implementation.

use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};

use crate::core::{CoordinatorError, Executor, ExecutorError, Task};

/// Executor that spawns each task onto a tokio runtime.
///
/// Blocking coordinator calls (`pump`, `wait_*`) must not be made from tasks running
/// on this executor's runtime threads.
#[derive(Clone)]
pub struct TokioExecutor {
    handle: Handle,
    /// Keeps an owned runtime alive for as long as any clone exists.
    owned_runtime: Option<Arc<Runtime>>,
}

impl TokioExecutor {
    /// Spawn onto the runtime behind `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            owned_runtime: None,
        }
    }

    /// Spawn onto the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::InvalidConfig`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, CoordinatorError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| CoordinatorError::InvalidConfig(format!("no tokio runtime: {e}")))
    }

    /// Create an owned multi-threaded runtime with `worker_threads` workers.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::InvalidConfig`] for zero workers,
    /// [`CoordinatorError::WorkerSpawn`] if the runtime cannot be built.
    pub fn with_worker_threads(worker_threads: usize) -> Result<Self, CoordinatorError> {
        if worker_threads == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "worker_threads must be greater than 0".into(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name("condo-tokio")
            .enable_all()
            .build()
            .map_err(CoordinatorError::WorkerSpawn)?;
        Ok(Self {
            handle: runtime.handle().clone(),
            owned_runtime: Some(Arc::new(runtime)),
        })
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        self.handle.spawn(task.into_future());
        Ok(())
    }
}

impl std::fmt::Debug for TokioExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioExecutor")
            .field("owned_runtime", &self.owned_runtime.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Coordinator, Predicate};
    use std::time::Duration;

    #[test]
    fn test_current_outside_runtime_fails() {
        assert!(matches!(
            TokioExecutor::current(),
            Err(CoordinatorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_owned_runtime_runs_async_actions() {
        let executor = TokioExecutor::with_worker_threads(2).unwrap();
        let coordinator: Coordinator<&'static str> = Coordinator::builder()
            .executor(executor)
            .wait_timeout(Duration::from_secs(5))
            .build();

        let done = coordinator.schedule_async("sleepy", || async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(3)
        });
        coordinator
            .wait_once(&Predicate::new(|m: &&str| *m == "sleepy"))
            .unwrap();
        assert_eq!(done.wait().unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_completion_awaited_on_current_runtime() {
        let coordinator: Coordinator<u8> = Coordinator::new(TokioExecutor::current().unwrap());
        let done = coordinator.schedule(1, || Ok("from tokio"));
        assert_eq!(done.await.unwrap(), "from tokio");
    }
}
