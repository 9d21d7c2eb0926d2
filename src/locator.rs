use crate::{container::Container, errors::ResolveErrorKind, utils::thread_safety::RcAnyThreadSafety};

/// Read-only view of a container, for consumers that only look instances up.
pub trait Locator {
    /// Checks whether `id` has a cached instance or a pending factory
    fn has(&self, id: &str) -> bool;

    /// Gets the instance registered under `id`, resolving it on first access
    ///
    /// # Errors
    /// Returns [`ResolveErrorKind`] if the instance can't be resolved
    fn get(&self, id: &str) -> Result<RcAnyThreadSafety, ResolveErrorKind>;
}

impl Locator for Container {
    #[inline]
    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }

    #[inline]
    fn get(&self, id: &str) -> Result<RcAnyThreadSafety, ResolveErrorKind> {
        Container::get(self, id)
    }
}
