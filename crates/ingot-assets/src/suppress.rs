//! Watcher suppression during the manager's own file mutations.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Reference-counted suppression flag.
///
/// While any [`SuppressionGuard`] is alive, batches handed to the manager are
/// discarded, so the manager does not re-import files it just wrote itself.
#[derive(Debug, Default)]
pub(crate) struct Suppression {
    depth: AtomicUsize,
}

impl Suppression {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Suppress until the returned guard is dropped. Guards nest.
    pub(crate) fn enter(&self) -> SuppressionGuard<'_> {
        self.depth.fetch_add(1, Ordering::AcqRel);
        SuppressionGuard { owner: self }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.depth.load(Ordering::Acquire) > 0
    }
}

/// Ends one level of suppression on drop.
#[must_use = "suppression ends as soon as the guard is dropped"]
pub(crate) struct SuppressionGuard<'a> {
    owner: &'a Suppression,
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.owner.depth.fetch_sub(1, Ordering::AcqRel);
    }
}
