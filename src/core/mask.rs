//! Registry of active masks.

use super::predicate::{MaskId, Predicate};

/// Ordered list of active mask predicates.
///
/// List semantics: registering the same predicate twice produces two entries with
/// distinct ids, each removed independently.
pub(crate) struct MaskRegistry<M> {
    entries: Vec<(MaskId, Predicate<M>)>,
    next_id: u64,
}

impl<M> MaskRegistry<M> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn insert(&mut self, predicate: Predicate<M>) -> MaskId {
        let id = MaskId::new(self.next_id);
        self.next_id += 1;
        self.entries.push((id, predicate));
        id
    }

    /// Remove the entry registered under `id`. Returns `false` if there is none.
    pub(crate) fn remove(&mut self, id: MaskId) -> bool {
        match self.entries.iter().position(|(entry, _)| *entry == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether any active mask covers `metadata`.
    pub(crate) fn covers(&self, metadata: &M) -> bool {
        self.entries.iter().any(|(_, p)| p.test(metadata))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_cover() {
        let mut registry = MaskRegistry::new();
        assert!(!registry.covers(&3_u32));
        registry.insert(Predicate::new(|n: &u32| *n > 2));
        assert!(registry.covers(&3));
        assert!(!registry.covers(&1));
    }

    #[test]
    fn test_duplicate_registration_needs_two_removals() {
        let mut registry = MaskRegistry::new();
        let p = Predicate::<u32>::always();
        let first = registry.insert(p.clone());
        let second = registry.insert(p);
        assert_ne!(first, second);

        assert!(registry.remove(first));
        assert!(registry.covers(&0));
        assert!(registry.remove(second));
        assert!(!registry.covers(&0));
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut registry = MaskRegistry::<u32>::new();
        let id = registry.insert(Predicate::always());
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.len(), 0);
    }
}
