//! Logs of finished actions, backing `wait_any` and `wait_once`.

use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::error::CoordinatorError;
use super::monitor::Monitor;
use super::predicate::Predicate;

pub(crate) struct Entries<M> {
    /// Every finished action, append-only.
    processed: Vec<Arc<M>>,
    /// Finished actions not yet claimed by `wait_once`.
    unclaimed: Vec<Arc<M>>,
}

/// The processed monitor: both logs behind one lock.
pub(crate) struct ProcessedLog<M> {
    monitor: Monitor<Entries<M>>,
}

impl<M> ProcessedLog<M> {
    pub(crate) const fn new() -> Self {
        Self {
            monitor: Monitor::new(Entries {
                processed: Vec::new(),
                unclaimed: Vec::new(),
            }),
        }
    }

    /// Append a finished action to both logs and wake waiters.
    pub(crate) fn record(&self, metadata: Arc<M>) {
        let mut entries = self.monitor.lock();
        entries.processed.push(Arc::clone(&metadata));
        entries.unclaimed.push(metadata);
        trace!(processed = entries.processed.len(), "action recorded as processed");
        self.monitor.notify_all();
    }

    /// Block until some finished action matches `predicate`. Claims nothing.
    pub(crate) fn wait_any(
        &self,
        predicate: &Predicate<M>,
        timeout: Option<Duration>,
    ) -> Result<(), CoordinatorError> {
        let mut entries = self.monitor.lock();
        let ticket = entries.ticket(timeout);
        while !entries.processed.iter().any(|m| predicate.test(m)) {
            self.monitor.wait(&mut entries, &ticket)?;
        }
        Ok(())
    }

    /// Block until every predicate has its own unclaimed match, then claim them all.
    ///
    /// Claims are made in one step, so a failed wait leaves the unclaimed log as it was.
    pub(crate) fn wait_once_all(
        &self,
        predicates: &[Predicate<M>],
        timeout: Option<Duration>,
    ) -> Result<(), CoordinatorError> {
        let mut entries = self.monitor.lock();
        let ticket = entries.ticket(timeout);
        loop {
            if let Some(mut claims) = assign(&entries.unclaimed, predicates) {
                claims.sort_unstable_by(|a, b| b.cmp(a));
                for index in claims {
                    entries.unclaimed.remove(index);
                }
                return Ok(());
            }
            self.monitor.wait(&mut entries, &ticket)?;
        }
    }

    pub(crate) fn interrupt(&self) -> usize {
        self.monitor.interrupt()
    }

    /// `(processed, unclaimed, blocked waiters)`.
    pub(crate) fn counts(&self) -> (usize, usize, usize) {
        let entries = self.monitor.lock();
        (entries.processed.len(), entries.unclaimed.len(), entries.waiters())
    }
}

/// Give each predicate, in order, the earliest entry it matches that no earlier
/// predicate took. `None` if any predicate is left without an entry.
fn assign<M>(entries: &[Arc<M>], predicates: &[Predicate<M>]) -> Option<Vec<usize>> {
    let mut taken = vec![false; entries.len()];
    let mut claims = Vec::with_capacity(predicates.len());
    for predicate in predicates {
        let index = entries
            .iter()
            .enumerate()
            .position(|(i, m)| !taken[i] && predicate.test(m))?;
        taken[index] = true;
        claims.push(index);
    }
    Some(claims)
}
