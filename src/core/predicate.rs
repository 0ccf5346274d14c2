//! Caller-supplied predicates over metadata and the identity tokens handed out for masks.

use std::fmt;
use std::sync::Arc;

/// A boolean test over metadata values.
///
/// Predicates are shared closures: cloning one is cheap and yields a handle to the
/// same underlying function, so [`Predicate::ptr_eq`] holds between clones.
/// The coordinator never inspects metadata itself; every match goes through a predicate.
///
/// ```
/// use prometheus_condo::core::Predicate;
///
/// let writes = Predicate::new(|m: &String| m.starts_with("write:"));
/// assert!(writes.test(&"write:1".to_string()));
/// assert!(!writes.test(&"read:1".to_string()));
/// ```
pub struct Predicate<M> {
    inner: Arc<dyn Fn(&M) -> bool + Send + Sync>,
}

impl<M> Predicate<M> {
    /// Wrap a closure as a predicate.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// A predicate matching every metadata value.
    #[must_use]
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Evaluate the predicate against a metadata value.
    #[inline]
    pub fn test(&self, metadata: &M) -> bool {
        (self.inner)(metadata)
    }

    /// Returns `true` if both handles refer to the same predicate instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<M> Clone for Predicate<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> fmt::Debug for Predicate<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Identity of one registered mask.
///
/// Returned by [`Coordinator::mask`](super::Coordinator::mask) and required by
/// [`Coordinator::unmask`](super::Coordinator::unmask). Every `mask` call yields a fresh
/// id, even when the same predicate is registered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaskId(u64);

impl MaskId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value, unique within one coordinator.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mask#{}", self.0)
    }
}
