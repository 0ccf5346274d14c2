//! Work execution abstraction.
//!
//! The coordinator does not run released actions itself: it hands each one to an
//! [`Executor`] as a [`Task`], a boxed future that drives the action, resolves its
//! completion and records it as processed. Implementations decide which thread polls
//! the task.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::thread;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::warn;

use super::error::ExecutorError;

/// A unit of work submitted to an executor.
pub struct Task {
    fut: BoxFuture<'static, ()>,
}

impl Task {
    /// Wrap a future as a task.
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self { fut: fut.boxed() }
    }

    /// Run the task to completion on the current thread.
    pub fn run(self) {
        futures::executor::block_on(self.fut);
    }

    /// Unwrap the underlying future.
    #[must_use]
    pub fn into_future(self) -> BoxFuture<'static, ()> {
        self.fut
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

/// Runs tasks handed over by the coordinator.
///
/// # Example
///
/// ```
/// use prometheus_condo::core::{Executor, ExecutorError, Task};
///
/// struct SpawnPerTask;
///
/// impl Executor for SpawnPerTask {
///     fn execute(&self, task: Task) -> Result<(), ExecutorError> {
///         std::thread::spawn(move || task.run());
///         Ok(())
///     }
/// }
/// ```
pub trait Executor: Send + Sync + 'static {
    /// Accept a task for execution.
    ///
    /// # Errors
    ///
    /// Implementations hand the task back inside [`ExecutorError`] when they cannot
    /// accept it.
    fn execute(&self, task: Task) -> Result<(), ExecutorError>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        (**self).execute(task)
    }
}

/// Executor that runs every task on the submitting thread before returning.
///
/// Makes scheduling fully synchronous, which is what most single-threaded tests want.
/// Async actions are driven with a local block-on, so they must not depend on a
/// runtime-specific reactor.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        task.run();
        Ok(())
    }
}

/// Submit `task`, running it on the calling thread if the executor rejects it.
///
/// A caller inside a tokio runtime (a pool worker, a `TokioExecutor` task) must not
/// block on the task: its timers are driven by the runtime the caller is stalling. Such
/// rejected tasks get a short-lived thread with a runtime of their own.
pub(crate) fn dispatch(executor: &dyn Executor, task: Task) {
    let Err(err) = executor.execute(task) else {
        return;
    };

    if tokio::runtime::Handle::try_current().is_ok() {
        warn!(error = %err, "executor rejected task; running on an overflow thread");
        run_on_overflow_thread(err.into_task());
    } else {
        warn!(error = %err, "executor rejected task; running on calling thread");
        err.into_task().run();
    }
}

fn run_on_overflow_thread(task: Task) {
    // the slot keeps the task reachable if the thread cannot be spawned
    let slot = Arc::new(Mutex::new(Some(task)));
    let thread_slot = Arc::clone(&slot);

    let spawned = thread::Builder::new()
        .name("condo-overflow".to_string())
        .spawn(move || {
            let Some(task) = thread_slot.lock().take() else {
                return;
            };
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(task.into_future()),
                Err(e) => {
                    warn!(error = %e, "Failed to create overflow runtime");
                    task.run();
                }
            }
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Failed to spawn overflow thread; running task on calling thread");
        let task = slot.lock().take();
        if let Some(task) = task {
            task.run();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Rejecting;

    impl Executor for Rejecting {
        fn execute(&self, task: Task) -> Result<(), ExecutorError> {
            Err(ExecutorError::Shutdown(task))
        }
    }

    #[test]
    fn test_inline_runs_before_returning() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        InlineExecutor
            .execute(Task::new(async move {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_falls_back_on_rejection() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        dispatch(
            &Rejecting,
            Task::new(async move {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_inside_runtime_does_not_stall_timers() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        dispatch(
            &Rejecting,
            Task::new(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                tx.send(thread::current().name().map(str::to_string)).unwrap();
            }),
        );
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("condo-overflow"));
    }

    #[test]
    fn test_arc_executor_delegates() {
        let executor: Arc<dyn Executor> = Arc::new(InlineExecutor);
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        executor
            .execute(Task::new(async move {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
