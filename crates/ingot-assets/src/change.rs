//! Directory change notifications and their coalescing into batches.

use indexmap::IndexMap;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
    Renamed,
}

/// A single change to a path relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDirectoryChange {
    pub kind: ChangeKind,
    pub path: String,
    /// Previous path, set only for [`ChangeKind::Renamed`].
    pub old_path: Option<String>,
}

impl AssetDirectoryChange {
    pub fn created(path: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Created,
            path: path.into(),
            old_path: None,
        }
    }

    pub fn changed(path: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Changed,
            path: path.into(),
            old_path: None,
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            path: path.into(),
            old_path: None,
        }
    }

    pub fn renamed(old_path: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Renamed,
            path: path.into(),
            old_path: Some(old_path.into()),
        }
    }
}

/// A flushed, ordered set of changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Strictly increasing per coalescer.
    pub version: u64,
    pub changes: Vec<AssetDirectoryChange>,
}

impl ChangeBatch {
    pub fn new(version: u64, changes: Vec<AssetDirectoryChange>) -> Self {
        Self { version, changes }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Created,
    Changed,
    Deleted,
}

#[derive(Debug, Clone)]
struct Entry {
    kind: Pending,
    /// Where the file was before the first rename in this window.
    renamed_from: Option<String>,
}

/// Accumulates changes between flushes, keeping one entry per path.
///
/// Merging rules for a path, in arrival order:
/// - created then changed stays created
/// - created then deleted cancels out
/// - deleted then created becomes changed
/// - changed then deleted becomes deleted
/// - rename chains fold into one rename from the first path, and a rename
///   back to the original path becomes a change
#[derive(Debug, Default)]
pub struct ChangeCoalescer {
    pending: IndexMap<String, Entry>,
    version: u64,
}

impl ChangeCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of paths with pending changes.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Version of the most recently flushed batch, `0` before the first.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn push(&mut self, change: AssetDirectoryChange) {
        match change.kind {
            ChangeKind::Created => self.push_created(change.path),
            ChangeKind::Changed => self.push_changed(change.path),
            ChangeKind::Deleted => self.push_deleted(change.path),
            ChangeKind::Renamed => match change.old_path {
                Some(old_path) => self.push_renamed(old_path, change.path),
                None => self.push_changed(change.path),
            },
        }
    }

    fn push_created(&mut self, path: String) {
        match self.pending.get_mut(&path) {
            Some(entry) if entry.kind == Pending::Deleted => entry.kind = Pending::Changed,
            Some(_) => {}
            None => {
                self.pending.insert(
                    path,
                    Entry {
                        kind: Pending::Created,
                        renamed_from: None,
                    },
                );
            }
        }
    }

    fn push_changed(&mut self, path: String) {
        match self.pending.get_mut(&path) {
            Some(entry) if entry.kind == Pending::Deleted => entry.kind = Pending::Changed,
            Some(_) => {}
            None => {
                self.pending.insert(
                    path,
                    Entry {
                        kind: Pending::Changed,
                        renamed_from: None,
                    },
                );
            }
        }
    }

    fn push_deleted(&mut self, path: String) {
        match self.pending.get(&path).cloned() {
            Some(Entry {
                kind: Pending::Created,
                renamed_from: None,
            }) => {
                self.pending.shift_remove(&path);
            }
            Some(Entry {
                renamed_from: Some(origin),
                ..
            }) => {
                // The file was renamed here and then deleted: it is gone from
                // where it started.
                self.pending.shift_remove(&path);
                self.push_deleted(origin);
            }
            _ => {
                self.pending.insert(
                    path,
                    Entry {
                        kind: Pending::Deleted,
                        renamed_from: None,
                    },
                );
            }
        }
    }

    fn push_renamed(&mut self, old_path: String, path: String) {
        let previous = self.pending.shift_remove(&old_path);
        self.pending.shift_remove(&path);

        let entry = match previous {
            Some(Entry {
                kind: Pending::Created,
                renamed_from: None,
            }) => Entry {
                kind: Pending::Created,
                renamed_from: None,
            },
            Some(Entry {
                renamed_from: Some(origin),
                ..
            }) if origin == path => Entry {
                kind: Pending::Changed,
                renamed_from: None,
            },
            Some(Entry {
                renamed_from: Some(origin),
                ..
            }) => Entry {
                kind: Pending::Changed,
                renamed_from: Some(origin),
            },
            _ => Entry {
                kind: Pending::Changed,
                renamed_from: Some(old_path),
            },
        };
        self.pending.insert(path, entry);
    }

    /// Drain pending changes into a batch, or `None` if nothing is pending.
    pub fn flush(&mut self) -> Option<ChangeBatch> {
        if self.pending.is_empty() {
            return None;
        }

        self.version += 1;
        let changes = self
            .pending
            .drain(..)
            .map(|(path, entry)| match entry.renamed_from {
                Some(old_path) => AssetDirectoryChange::renamed(old_path, path),
                None => match entry.kind {
                    Pending::Created => AssetDirectoryChange::created(path),
                    Pending::Changed => AssetDirectoryChange::changed(path),
                    Pending::Deleted => AssetDirectoryChange::deleted(path),
                },
            })
            .collect();

        Some(ChangeBatch::new(self.version, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flush(coalescer: &mut ChangeCoalescer) -> Vec<AssetDirectoryChange> {
        coalescer.flush().map(|batch| batch.changes).unwrap_or_default()
    }

    #[test]
    fn test_created_then_changed_is_created() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::created("a.png"));
        c.push(AssetDirectoryChange::changed("a.png"));
        c.push(AssetDirectoryChange::changed("a.png"));
        assert_eq!(flush(&mut c), vec![AssetDirectoryChange::created("a.png")]);
    }

    #[test]
    fn test_created_then_deleted_is_dropped() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::created("a.png"));
        c.push(AssetDirectoryChange::deleted("a.png"));
        assert!(c.is_empty());
        assert!(c.flush().is_none());
    }

    #[test]
    fn test_deleted_then_created_is_changed() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::deleted("a.png"));
        c.push(AssetDirectoryChange::created("a.png"));
        assert_eq!(flush(&mut c), vec![AssetDirectoryChange::changed("a.png")]);
    }

    #[test]
    fn test_changed_then_deleted_is_deleted() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::changed("a.png"));
        c.push(AssetDirectoryChange::deleted("a.png"));
        assert_eq!(flush(&mut c), vec![AssetDirectoryChange::deleted("a.png")]);
    }

    #[test]
    fn test_rename_chain_folds() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::renamed("a.png", "b.png"));
        c.push(AssetDirectoryChange::changed("b.png"));
        c.push(AssetDirectoryChange::renamed("b.png", "c.png"));
        assert_eq!(
            flush(&mut c),
            vec![AssetDirectoryChange::renamed("a.png", "c.png")]
        );
    }

    #[test]
    fn test_rename_back_is_changed() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::renamed("a.png", "b.png"));
        c.push(AssetDirectoryChange::renamed("b.png", "a.png"));
        assert_eq!(flush(&mut c), vec![AssetDirectoryChange::changed("a.png")]);
    }

    #[test]
    fn test_created_then_renamed_is_created_at_target() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::created("tmp123"));
        c.push(AssetDirectoryChange::renamed("tmp123", "a.png"));
        assert_eq!(flush(&mut c), vec![AssetDirectoryChange::created("a.png")]);
    }

    #[test]
    fn test_renamed_then_deleted_deletes_origin() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::renamed("a.png", "b.png"));
        c.push(AssetDirectoryChange::deleted("b.png"));
        assert_eq!(flush(&mut c), vec![AssetDirectoryChange::deleted("a.png")]);
    }

    #[test]
    fn test_order_is_preserved_across_paths() {
        let mut c = ChangeCoalescer::new();
        c.push(AssetDirectoryChange::changed("b.png"));
        c.push(AssetDirectoryChange::created("a.png"));
        c.push(AssetDirectoryChange::changed("b.png"));
        assert_eq!(
            flush(&mut c),
            vec![
                AssetDirectoryChange::changed("b.png"),
                AssetDirectoryChange::created("a.png"),
            ]
        );
    }

    #[test]
    fn test_versions_increase() {
        let mut c = ChangeCoalescer::new();
        assert_eq!(c.version(), 0);

        c.push(AssetDirectoryChange::changed("a.png"));
        let first = c.flush().unwrap();
        assert!(c.flush().is_none());

        c.push(AssetDirectoryChange::changed("a.png"));
        let second = c.flush().unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(c.version(), 2);
    }
}
