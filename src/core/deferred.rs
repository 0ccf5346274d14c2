//! Actions held back by an active mask.

use std::sync::Arc;

use super::executor::Executor;
use super::mask::MaskRegistry;
use super::predicate::Predicate;
use super::processed::ProcessedLog;

/// Starts an action: invokes it and hands its continuation to the executor.
pub(crate) type Launch<M> = Box<dyn FnOnce(&dyn Executor, &Arc<ProcessedLog<M>>) + Send>;

/// Metadata plus the suspended execution of one scheduled action.
pub(crate) struct DeferredAction<M> {
    metadata: Arc<M>,
    launch: Launch<M>,
    /// Position in the deferral order, assigned by [`DeferredQueue::push`].
    seq: u64,
}

impl<M> DeferredAction<M> {
    pub(crate) fn new(metadata: Arc<M>, launch: Launch<M>) -> Self {
        Self {
            metadata,
            launch,
            seq: 0,
        }
    }

    pub(crate) fn metadata(&self) -> &M {
        &self.metadata
    }

    pub(crate) fn launch(self, executor: &dyn Executor, processed: &Arc<ProcessedLog<M>>) {
        (self.launch)(executor, processed);
    }
}

/// Deferred actions in insertion order.
pub(crate) struct DeferredQueue<M> {
    actions: Vec<DeferredAction<M>>,
    next_seq: u64,
}

impl<M> DeferredQueue<M> {
    pub(crate) const fn new() -> Self {
        Self {
            actions: Vec::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn push(&mut self, mut action: DeferredAction<M>) {
        action.seq = self.next_seq;
        self.next_seq += 1;
        self.actions.push(action);
    }

    /// Put previously taken actions back at their original queue positions.
    pub(crate) fn restore(&mut self, actions: Vec<DeferredAction<M>>) {
        for action in actions {
            let index = self.actions.partition_point(|queued| queued.seq < action.seq);
            self.actions.insert(index, action);
        }
    }

    /// Remove and return the earliest action matching `predicate`.
    pub(crate) fn take_first(&mut self, predicate: &Predicate<M>) -> Option<DeferredAction<M>> {
        let index = self
            .actions
            .iter()
            .position(|action| predicate.test(action.metadata()))?;
        Some(self.actions.remove(index))
    }

    /// Remove every action no longer covered by `masks`, preserving queue order.
    pub(crate) fn drain_unmasked(&mut self, masks: &MaskRegistry<M>) -> Vec<DeferredAction<M>> {
        let (released, still_masked): (Vec<_>, Vec<_>) = self
            .actions
            .drain(..)
            .partition(|action| !masks.covers(action.metadata()));
        self.actions = still_masked;
        released
    }

    pub(crate) fn len(&self) -> usize {
        self.actions.len()
    }
}
