//! Thread pool executor with dedicated OS worker threads.
//!
//! Each worker owns a single-threaded tokio runtime and drives one task at a time to
//! completion, so async actions may use tokio timers and I/O.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel recv
//! - **Bounded queue**: submissions beyond `max_queue_depth` are handed back
//! - **Clean shutdown**: dropping the sender unblocks workers once the queue is drained
//! - **No lost work**: every accepted task runs, even after shutdown or drop

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WorkerPoolConfig;

use super::error::{CoordinatorError, ExecutorError};
use super::executor::{Executor, InlineExecutor, Task};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Currently executing tasks.
    pub active_tasks: u64,
    /// Tasks waiting in the queue.
    pub queued_tasks: u64,
    /// Tasks that ran to completion.
    pub completed_tasks: u64,
    /// Tasks that panicked inside a worker.
    pub failed_tasks: u64,
    /// Tasks accepted by `execute`.
    pub submitted_tasks: u64,
}

/// Internal counters for pool statistics.
#[derive(Debug, Default)]
struct PoolCounters {
    active_tasks: AtomicU64,
    queued_tasks: AtomicU64,
    completed_tasks: AtomicU64,
    failed_tasks: AtomicU64,
    submitted_tasks: AtomicU64,
}

impl PoolCounters {
    fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
        }
    }
}

/// Executor backed by dedicated OS threads.
///
/// ```
/// use prometheus_condo::config::WorkerPoolConfig;
/// use prometheus_condo::core::{Coordinator, ThreadPoolExecutor};
///
/// let pool = ThreadPoolExecutor::new(WorkerPoolConfig::new().with_worker_count(2)).unwrap();
/// let coordinator: Coordinator<u32> = Coordinator::new(pool);
/// let done = coordinator.schedule(1, || Ok("written"));
/// assert_eq!(done.wait().unwrap(), "written");
/// ```
pub struct ThreadPoolExecutor {
    config: WorkerPoolConfig,
    /// Task sender. `None` once shut down.
    task_tx: Mutex<Option<Sender<Task>>>,
    counters: Arc<PoolCounters>,
    shutdown: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPoolExecutor {
    /// Spawn `config.worker_count` worker threads.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::InvalidConfig`] for an invalid configuration,
    /// [`CoordinatorError::WorkerSpawn`] if a thread cannot be started.
    pub fn new(config: WorkerPoolConfig) -> Result<Self, CoordinatorError> {
        config.validate().map_err(CoordinatorError::InvalidConfig)?;

        let (task_tx, task_rx) = bounded::<Task>(config.max_queue_depth);
        let counters = Arc::new(PoolCounters::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                worker_id,
                &config,
                task_rx.clone(),
                Arc::clone(&counters),
            );
            match worker {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // dropping task_tx on return stops the workers already spawned
                    return Err(CoordinatorError::WorkerSpawn(e));
                }
            }
        }

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            "ThreadPoolExecutor initialized"
        );

        Ok(Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            shutdown,
            workers: Mutex::new(workers),
        })
    }

    /// Current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Stop accepting tasks and wait up to two seconds per worker for the queue to drain.
    ///
    /// Tasks accepted before the call still run. Workers that do not finish in time are
    /// detached and keep draining in the background.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down thread pool executor");
        *self.task_tx.lock() = None;

        let mut workers = self.workers.lock();
        let worker_count = workers.len();
        for (idx, worker) in workers.drain(..).enumerate() {
            let (tx, rx) = crossbeam_channel::bounded(1);
            let joiner = thread::spawn(move || {
                let _ = tx.send(worker.join().is_ok());
            });

            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(true) => debug!(worker_id = idx, "Worker joined"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }
            let _ = joiner.join();
        }

        info!(worker_count, "Thread pool executor shut down");
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(ExecutorError::Shutdown(task));
        }

        let task_tx = self.task_tx.lock();
        let Some(task_tx) = task_tx.as_ref() else {
            return Err(ExecutorError::Shutdown(task));
        };

        // counted before the send so a fast worker never decrements first
        self.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);
        let sent = task_tx.try_send(task);
        if sent.is_err() {
            self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
        }

        match sent {
            Ok(()) => {
                self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(task)) => {
                warn!(
                    max_queue_depth = self.config.max_queue_depth,
                    "Thread pool queue is full"
                );
                Err(ExecutorError::QueueFull(task))
            }
            Err(TrySendError::Disconnected(task)) => Err(ExecutorError::Shutdown(task)),
        }
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        // Workers are detached rather than joined; they finish the queued tasks and exit.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            *self.task_tx.lock() = None;
            debug!("ThreadPoolExecutor dropped without explicit shutdown - workers draining");
        }
    }
}

impl std::fmt::Debug for ThreadPoolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPoolExecutor")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// The process-wide executor used by [`Coordinator::build_default`](super::Coordinator::build_default).
///
/// A thread pool sized to the number of CPUs, created on first use. Falls back to
/// [`InlineExecutor`] if the pool cannot be started.
pub fn default_executor() -> Arc<dyn Executor> {
    static SHARED: OnceLock<Arc<dyn Executor>> = OnceLock::new();
    let shared = SHARED.get_or_init(|| {
        let config = WorkerPoolConfig::default().with_thread_name_prefix("condo-shared");
        let executor: Arc<dyn Executor> = match ThreadPoolExecutor::new(config) {
            Ok(pool) => Arc::new(pool),
            Err(e) => {
                error!(error = %e, "Failed to start shared thread pool; running actions inline");
                Arc::new(InlineExecutor)
            }
        };
        executor
    });
    Arc::clone(shared)
}

fn spawn_worker(
    worker_id: usize,
    config: &WorkerPoolConfig,
    task_rx: Receiver<Task>,
    counters: Arc<PoolCounters>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name_prefix))
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            debug!(worker_id, "Worker thread started");

            // without a runtime the worker still drains its queue, polling tasks directly
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => Some(rt),
                Err(e) => {
                    error!(worker_id, error = %e, "Failed to create worker runtime");
                    None
                }
            };

            // recv() keeps yielding buffered tasks after the sender is dropped and
            // fails only once the queue is empty
            while let Ok(task) = task_rx.recv() {
                counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);

                counters.active_tasks.fetch_add(1, Ordering::Relaxed);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &rt {
                    Some(rt) => rt.block_on(task.into_future()),
                    None => task.run(),
                }));
                counters.active_tasks.fetch_sub(1, Ordering::Relaxed);

                if outcome.is_ok() {
                    counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
                } else {
                    counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                    warn!(worker_id, "Task panicked on worker");
                }
            }

            debug!(worker_id, "Worker thread exiting");
        })
}
