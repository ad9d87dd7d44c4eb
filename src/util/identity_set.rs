use std::collections::HashSet;
use std::sync::Arc;

/// A set of `Arc<T>`s compared by allocation instead of by value. Two equal but separately allocated values are
/// distinct members. Only the address is stored, so the set must not outlive the values it has seen or a freed
/// address may be reused by a new allocation.
pub struct ArcIdentitySet<T> {
    inner: HashSet<*const T>,
}

impl<T> ArcIdentitySet<T> {
    pub fn new() -> Self {
        Self { inner: HashSet::new() }
    }

    /// Returns whether the value has not been seen before.
    #[inline]
    pub fn insert(&mut self, value: &Arc<T>) -> bool {
        self.inner.insert(Arc::as_ptr(value))
    }

    #[inline]
    pub fn contains(&self, value: &Arc<T>) -> bool {
        self.inner.contains(&Arc::as_ptr(value))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> Default for ArcIdentitySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::util::identity_set::ArcIdentitySet;

    #[test]
    fn equal_values_are_distinct_members() {
        let a = Arc::new(5);
        let b = Arc::new(5);
        let mut set = ArcIdentitySet::new();

        assert!(set.insert(&a));
        assert!(!set.insert(&a.clone()));
        assert!(set.insert(&b));
        assert!(set.contains(&a));
        assert_eq!(set.len(), 2);
    }
}
