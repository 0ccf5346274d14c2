//! The coordinator: masking, deferral, release and waiting.
//!
//! Two monitors guard disjoint state. The mask monitor owns the mask registry and the
//! deferred queue; the processed monitor (inside [`ProcessedLog`]) owns both processed
//! logs. Actions are never invoked while the mask monitor is held: scans and queue
//! mutations happen under the lock, invocation happens after it is released.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, info};

use super::completion::{self, Completion};
use super::deferred::{DeferredAction, DeferredQueue};
use super::error::{ActionError, CoordinatorError, CoordinatorResult};
use super::executor::{dispatch, Executor, Task};
use super::mask::MaskRegistry;
use super::monitor::Monitor;
use super::predicate::{MaskId, Predicate};
use super::processed::ProcessedLog;
use crate::builders::CoordinatorBuilder;
use crate::core::worker_pool::default_executor;

struct MaskState<M> {
    registry: MaskRegistry<M>,
    deferred: DeferredQueue<M>,
}

/// Snapshot of coordinator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Masks currently registered.
    pub active_masks: usize,
    /// Actions held back by a mask.
    pub deferred_actions: usize,
    /// Actions that have finished, successfully or not.
    pub processed: usize,
    /// Finished actions not yet claimed by `wait_once`.
    pub unclaimed: usize,
    /// Threads currently blocked in `pump`, `wait_any` or `wait_once`.
    pub blocked_waiters: usize,
}

/// Schedules tagged actions and lets tests mask, release and await them.
///
/// Production code routes side effects through [`schedule`](Self::schedule) or
/// [`schedule_async`](Self::schedule_async), tagging each with metadata `M`. Test code
/// then controls them:
///
/// - [`mask`](Self::mask) holds back every future action whose metadata matches.
/// - [`unmask`](Self::unmask) lifts a mask and releases what is no longer covered.
/// - [`pump`](Self::pump) releases one held action without lifting the mask.
/// - [`wait_any`](Self::wait_any) / [`wait_once`](Self::wait_once) block until a
///   matching action has finished.
///
/// A coordinator is shared by reference counting; wrap it in an `Arc` and hand clones
/// to every component that schedules work.
///
/// ```
/// use prometheus_condo::core::{Coordinator, InlineExecutor, Predicate};
///
/// # fn main() -> Result<(), prometheus_condo::core::CoordinatorError> {
/// let coordinator = Coordinator::new(InlineExecutor);
/// let writes = Predicate::new(|m: &&str| m.starts_with("write"));
///
/// let mask = coordinator.mask(writes.clone());
/// let done = coordinator.schedule("write:1", || Ok(1));
/// assert!(!done.is_done());
///
/// coordinator.unmask(mask)?.wait_once(&writes)?;
/// assert_eq!(done.wait().unwrap(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Coordinator<M> {
    executor: Arc<dyn Executor>,
    masks: Monitor<MaskState<M>>,
    processed: Arc<ProcessedLog<M>>,
    wait_timeout: Option<Duration>,
}

impl<M> Coordinator<M>
where
    M: Send + Sync + 'static,
{
    /// Create a coordinator that runs released actions on `executor`.
    pub fn new<E: Executor>(executor: E) -> Self {
        Self::from_parts(Arc::new(executor), None)
    }

    /// Create a coordinator on the process-wide shared thread pool.
    #[must_use]
    pub fn build_default() -> Self {
        Self::from_parts(default_executor(), None)
    }

    /// Start configuring a coordinator.
    #[must_use]
    pub fn builder() -> CoordinatorBuilder<M> {
        CoordinatorBuilder::new()
    }

    pub(crate) fn from_parts(executor: Arc<dyn Executor>, wait_timeout: Option<Duration>) -> Self {
        Self {
            executor,
            masks: Monitor::new(MaskState {
                registry: MaskRegistry::new(),
                deferred: DeferredQueue::new(),
            }),
            processed: Arc::new(ProcessedLog::new()),
            wait_timeout,
        }
    }

    /// Schedule a synchronous action tagged with `metadata`.
    ///
    /// The action runs on the executor unless a mask covers `metadata`, in which case
    /// it is deferred until released. Its outcome, including an `Err` return or a
    /// panic, is delivered through the returned completion.
    pub fn schedule<T, F>(&self, metadata: M, action: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        self.schedule_async(metadata, move || async move { action() })
    }

    /// Schedule an action that returns a future.
    ///
    /// `action` is invoked once the action is released (immediately if unmasked); the
    /// action counts as finished only when the future it returned resolves.
    pub fn schedule_async<T, F, Fut>(&self, metadata: M, action: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let metadata = Arc::new(metadata);
        let (completer, completion) = completion::channel();

        let tag = Arc::clone(&metadata);
        let launch = move |executor: &dyn Executor, processed: &Arc<ProcessedLog<M>>| {
            let fut = match panic::catch_unwind(AssertUnwindSafe(action)) {
                Ok(fut) => fut,
                Err(payload) => {
                    completer.complete(Err(ActionError::from_panic(payload)));
                    processed.record(tag);
                    return;
                }
            };

            let processed = Arc::clone(processed);
            let task = Task::new(async move {
                let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(ActionError::Failed(err)),
                    Err(payload) => Err(ActionError::from_panic(payload)),
                };
                completer.complete(outcome);
                processed.record(tag);
            });
            dispatch(executor, task);
        };
        let action = DeferredAction::new(metadata, Box::new(launch));

        {
            let mut state = self.masks.lock();
            if state.registry.covers(action.metadata()) {
                state.deferred.push(action);
                debug!(deferred = state.deferred.len(), "action deferred by active mask");
                self.masks.notify_all();
                return completion;
            }
        }

        action.launch(self.executor.as_ref(), &self.processed);
        completion
    }

    /// Hold back every action scheduled from now on whose metadata matches `predicate`.
    ///
    /// Returns the id needed to lift the mask again. Registering the same predicate
    /// twice yields two independent masks.
    pub fn mask(&self, predicate: Predicate<M>) -> MaskId {
        let mut state = self.masks.lock();
        let id = state.registry.insert(predicate);
        debug!(mask_id = %id, active = state.registry.len(), "mask registered");
        self.masks.notify_all();
        id
    }

    /// Lift a mask and release every deferred action no mask covers any longer.
    ///
    /// Released actions start in the order they were deferred.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::UnregisteredMask`] if `id` is not currently registered; no
    /// state changes in that case.
    pub fn unmask(&self, id: MaskId) -> CoordinatorResult<&Self> {
        let released = {
            let mut state = self.masks.lock();
            if !state.registry.remove(id) {
                return Err(CoordinatorError::UnregisteredMask(id));
            }
            let MaskState { registry, deferred } = &mut **state;
            let released = deferred.drain_unmasked(registry);
            debug!(
                mask_id = %id,
                released = released.len(),
                still_deferred = deferred.len(),
                "mask removed"
            );
            self.masks.notify_all();
            released
        };

        for action in released {
            action.launch(self.executor.as_ref(), &self.processed);
        }
        Ok(self)
    }

    /// Release the earliest deferred action matching `predicate`, blocking until one
    /// exists. The mask that deferred it stays active.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Interrupted`] or [`CoordinatorError::TimedOut`].
    pub fn pump(&self, predicate: &Predicate<M>) -> CoordinatorResult<&Self> {
        self.pump_all(std::slice::from_ref(predicate))
    }

    /// Release one deferred action per predicate, blocking until each predicate has
    /// claimed its own action. Two predicates never claim the same action.
    ///
    /// Claimed actions are held back until every predicate has a match, then started
    /// together in claim order.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Interrupted`] or [`CoordinatorError::TimedOut`]. Nothing is
    /// released on failure: claimed actions go back to their queue positions, and only
    /// those whose masks were lifted in the meantime start.
    pub fn pump_all(&self, predicates: &[Predicate<M>]) -> CoordinatorResult<&Self> {
        let mut pending: Vec<&Predicate<M>> = predicates.iter().collect();
        let mut claimed = Vec::with_capacity(predicates.len());
        let mut state = self.masks.lock();
        let ticket = state.ticket(self.wait_timeout);

        loop {
            pending.retain(|predicate| match state.deferred.take_first(predicate) {
                Some(action) => {
                    claimed.push(action);
                    false
                }
                None => true,
            });
            if pending.is_empty() {
                break;
            }

            if let Err(err) = self.masks.wait(&mut state, &ticket) {
                let MaskState { registry, deferred } = &mut **state;
                let returned = claimed.len();
                deferred.restore(claimed);
                let released = deferred.drain_unmasked(registry);
                self.masks.notify_all();
                drop(state);

                debug!(
                    error = %err,
                    returned,
                    released = released.len(),
                    "pump abandoned; claimed actions returned to the queue"
                );
                for action in released {
                    action.launch(self.executor.as_ref(), &self.processed);
                }
                return Err(err);
            }
        }
        drop(state);

        debug!(released = claimed.len(), "pumped deferred actions");
        for action in claimed {
            action.launch(self.executor.as_ref(), &self.processed);
        }
        Ok(self)
    }

    /// Block until any finished action matches `predicate`.
    ///
    /// Does not claim anything: repeated calls may all succeed on the same action.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Interrupted`] or [`CoordinatorError::TimedOut`].
    pub fn wait_any(&self, predicate: &Predicate<M>) -> CoordinatorResult<&Self> {
        self.processed.wait_any(predicate, self.wait_timeout)?;
        Ok(self)
    }

    /// Block until a finished, unclaimed action matches `predicate`, and claim it.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Interrupted`] or [`CoordinatorError::TimedOut`].
    pub fn wait_once(&self, predicate: &Predicate<M>) -> CoordinatorResult<&Self> {
        self.wait_once_all(std::slice::from_ref(predicate))
    }

    /// Block until every predicate can claim its own finished action, then claim them.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Interrupted`] or [`CoordinatorError::TimedOut`]; nothing is
    /// claimed on failure.
    pub fn wait_once_all(&self, predicates: &[Predicate<M>]) -> CoordinatorResult<&Self> {
        self.processed.wait_once_all(predicates, self.wait_timeout)?;
        Ok(self)
    }

    /// Fail every call currently blocked in `pump*`, `wait_any` or `wait_once*` with
    /// [`CoordinatorError::Interrupted`]. Later calls are unaffected.
    pub fn interrupt_waiters(&self) {
        let masked = self.masks.interrupt();
        let processed = self.processed.interrupt();
        info!(
            interrupted = masked + processed,
            "interrupted blocked coordinator waiters"
        );
    }

    /// Current state counts.
    #[must_use]
    pub fn stats(&self) -> CoordinatorStats {
        let (active_masks, deferred_actions, mask_waiters) = {
            let state = self.masks.lock();
            (state.registry.len(), state.deferred.len(), state.waiters())
        };
        let (processed, unclaimed, processed_waiters) = self.processed.counts();
        CoordinatorStats {
            active_masks,
            deferred_actions,
            processed,
            unclaimed,
            blocked_waiters: mask_waiters + processed_waiters,
        }
    }

    /// Configured wait timeout, if any.
    #[must_use]
    pub const fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout
    }
}

impl<M> Default for Coordinator<M>
where
    M: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::build_default()
    }
}

impl<M> std::fmt::Debug for Coordinator<M>
where
    M: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("stats", &self.stats())
            .field("wait_timeout", &self.wait_timeout)
            .finish_non_exhaustive()
    }
}
