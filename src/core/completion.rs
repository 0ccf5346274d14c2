//! Completion handles returned to callers of `schedule` / `schedule_async`.
//!
//! A completion is a one-shot slot guarded by a `parking_lot` mutex with a condvar for
//! blocking waiters and a stored waker for async ones. The producing half lives inside
//! the deferred action; dropping it unresolved resolves the slot as
//! [`ActionError::Abandoned`] so no consumer waits on a producer that no longer exists.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::error::{ActionError, ActionResult};

struct Slot<T> {
    outcome: Option<ActionResult<T>>,
    resolved: bool,
    waker: Option<Waker>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn resolve(&self, outcome: ActionResult<T>) {
        let waker = {
            let mut slot = self.slot.lock();
            if slot.resolved {
                return;
            }
            slot.outcome = Some(outcome);
            slot.resolved = true;
            self.ready.notify_all();
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Create a linked producer/consumer pair.
pub(crate) fn channel<T>() -> (Completer<T>, Completion<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            outcome: None,
            resolved: false,
            waker: None,
        }),
        ready: Condvar::new(),
    });
    (
        Completer {
            shared: Some(Arc::clone(&shared)),
        },
        Completion { shared },
    )
}

/// Producing half of a completion. Resolves exactly once.
pub(crate) struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, outcome: ActionResult<T>) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(outcome);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.resolve(Err(ActionError::Abandoned));
        }
    }
}

/// Handle to the eventual outcome of a scheduled action.
///
/// Resolves once the action has run, or, for async actions, once the future it
/// returned has finished. A masked action keeps its completion pending until the
/// action is released by `unmask` or `pump`.
///
/// The outcome can be taken either by blocking ([`Completion::wait`]) or by awaiting
/// the handle, which implements [`Future`].
pub struct Completion<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Completion<T> {
    /// Returns `true` once the action's outcome is available.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.shared.slot.lock().resolved
    }

    /// Block the current thread until the outcome is available.
    ///
    /// # Errors
    ///
    /// Returns the action's failure, or [`ActionError::Abandoned`] if the action was
    /// dropped without running.
    pub fn wait(self) -> ActionResult<T> {
        let mut slot = self.shared.slot.lock();
        self.shared.ready.wait_while(&mut slot, |s| !s.resolved);
        slot.outcome.take().unwrap_or(Err(ActionError::Abandoned))
    }

    /// Block for at most `timeout`, handing the completion back if it is still pending.
    ///
    /// # Errors
    ///
    /// `Err(self)` when the timeout elapsed before the action finished.
    pub fn wait_timeout(self, timeout: Duration) -> Result<ActionResult<T>, Self> {
        let outcome = {
            let mut slot = self.shared.slot.lock();
            let result = self
                .shared
                .ready
                .wait_while_for(&mut slot, |s| !s.resolved, timeout);
            if result.timed_out() && !slot.resolved {
                None
            } else {
                Some(slot.outcome.take().unwrap_or(Err(ActionError::Abandoned)))
            }
        };
        outcome.ok_or(self)
    }
}

impl<T> Future for Completion<T> {
    type Output = ActionResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.shared.slot.lock();
        if slot.resolved {
            return Poll::Ready(slot.outcome.take().unwrap_or(Err(ActionError::Abandoned)));
        }
        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("done", &self.is_done())
            .finish()
    }
}
