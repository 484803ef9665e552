// WHY: The only shared mutable state of a turn; every in-flight detection merges through here
// Set-union under a lock means concurrent merges can neither lose nor duplicate items

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

/// Returned by [`RedactionSet::try_add`] once the turn has completed
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("redaction set is frozen: items cannot be added after the turn has completed")]
pub struct RedactionSetFrozen;

#[derive(Debug, Default)]
struct Inner {
    items: BTreeSet<String>,
    frozen: bool,
}

/// Accumulator of PII substrings discovered during one generation turn.
///
/// Grows monotonically until [`freeze`](Self::freeze), after which it is read-only.
/// Clones share the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct RedactionSet {
    inner: Arc<RwLock<Inner>>,
}

impl RedactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge items into the set, returning how many were not already present.
    ///
    /// # Panics
    /// Panics if the set has been frozen. Adding after turn completion is a contract
    /// violation; callers racing a freeze should use [`try_add`](Self::try_add).
    pub fn add<I, S>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_add(items) {
            Ok(added) => added,
            Err(frozen) => panic!("{frozen}"),
        }
    }

    /// Merge items into the set unless it has been frozen
    pub fn try_add<I, S>(&self, items: I) -> Result<usize, RedactionSetFrozen>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.try_merge(items, |_| {})
    }

    /// Merge items, then hand the merged contents to `publish` while the write lock is
    /// still held. Observers fed from `publish` therefore see contents in merge order and
    /// never a smaller set after a larger one.
    pub fn try_merge<I, S, F>(&self, items: I, publish: F) -> Result<usize, RedactionSetFrozen>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&BTreeSet<String>),
    {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.frozen {
            return Err(RedactionSetFrozen);
        }

        let mut added = 0;
        for item in items {
            if inner.items.insert(item.into()) {
                added += 1;
            }
        }

        if added > 0 {
            debug!(added, total = inner.items.len(), "Merged redaction items");
        }
        publish(&inner.items);
        Ok(added)
    }

    /// Copy of the current contents; the lock is held only for the clone
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .clone()
    }

    /// Stop accepting items and return the final contents
    pub fn freeze(&self) -> BTreeSet<String> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.frozen = true;
        debug!(total = inner.items.len(), "Redaction set frozen");
        inner.items.clone()
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).frozen
    }

    pub fn contains(&self, item: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .contains(item)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
