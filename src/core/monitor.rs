//! Mutex + condition variable pair with interruptible guarded waits.
//!
//! Every coordinator lock domain is a [`Monitor`]: mutations happen under the mutex and
//! end with [`Monitor::notify_all`]; waiters loop re-checking their condition and call
//! [`Monitor::wait`] between checks. The monitor also carries an interrupt epoch: bumping
//! it fails every wait whose [`WaitTicket`] was taken under the previous epoch.

use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use super::error::CoordinatorError;

/// State guarded by a monitor, plus its bookkeeping.
pub(crate) struct Guarded<S> {
    value: S,
    epoch: u64,
    waiters: usize,
}

impl<S> Guarded<S> {
    /// Take a ticket for a wait starting now.
    pub(crate) fn ticket(&self, timeout: Option<Duration>) -> WaitTicket {
        WaitTicket {
            epoch: self.epoch,
            deadline: timeout.map(|t| (Instant::now() + t, t)),
        }
    }

    /// Number of threads currently parked on this monitor.
    pub(crate) const fn waiters(&self) -> usize {
        self.waiters
    }
}

impl<S> Deref for Guarded<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.value
    }
}

impl<S> DerefMut for Guarded<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.value
    }
}

/// Interrupt epoch and optional deadline captured when a blocking call begins.
pub(crate) struct WaitTicket {
    epoch: u64,
    deadline: Option<(Instant, Duration)>,
}

pub(crate) struct Monitor<S> {
    state: Mutex<Guarded<S>>,
    changed: Condvar,
}

impl<S> Monitor<S> {
    pub(crate) const fn new(value: S) -> Self {
        Self {
            state: Mutex::new(Guarded {
                value,
                epoch: 0,
                waiters: 0,
            }),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Guarded<S>> {
        self.state.lock()
    }

    /// Wake every waiter so it re-checks its condition.
    pub(crate) fn notify_all(&self) {
        self.changed.notify_all();
    }

    /// Fail every wait that started before this call.
    pub(crate) fn interrupt(&self) -> usize {
        let mut guard = self.state.lock();
        guard.epoch = guard.epoch.wrapping_add(1);
        self.changed.notify_all();
        guard.waiters
    }

    /// Park until the next notification.
    ///
    /// Returns `Ok` on any wakeup, spurious ones included; callers re-check their
    /// condition and call again. Fails once the ticket's epoch is stale or its
    /// deadline has passed.
    pub(crate) fn wait(
        &self,
        guard: &mut MutexGuard<'_, Guarded<S>>,
        ticket: &WaitTicket,
    ) -> Result<(), CoordinatorError> {
        if guard.epoch != ticket.epoch {
            return Err(CoordinatorError::Interrupted);
        }

        guard.waiters += 1;
        let outcome = match ticket.deadline {
            Some((deadline, timeout)) => {
                if Instant::now() >= deadline {
                    Err(CoordinatorError::TimedOut(timeout))
                } else {
                    self.changed.wait_until(guard, deadline);
                    Ok(())
                }
            }
            None => {
                self.changed.wait(guard);
                Ok(())
            }
        };
        guard.waiters -= 1;
        outcome?;

        if guard.epoch == ticket.epoch {
            Ok(())
        } else {
            Err(CoordinatorError::Interrupted)
        }
    }
}
