//! Applying file-system change batches to the registries.

use ingot_core::profiling::profile_function;

use super::AssetManager;
use crate::change::{AssetDirectoryChange, ChangeBatch, ChangeKind};
use crate::error::{AssetError, AssetResult};
use crate::event::AssetEvent;
use crate::path;

impl AssetManager {
    /// Apply a batch of directory changes in order.
    ///
    /// Batches arriving while the manager is mutating files itself are
    /// dropped. Each change is applied independently under the mutation lock;
    /// a failing change is logged and the rest of the batch still runs.
    /// Returns the number of changes that affected the registries.
    pub fn reconcile(&self, batch: &ChangeBatch) -> usize {
        profile_function!();

        if self.suppression.is_active() {
            tracing::debug!(
                "Dropping change batch v{} ({} changes) while suppressed",
                batch.version,
                batch.len()
            );
            return 0;
        }

        tracing::debug!(
            "Reconciling change batch v{} ({} changes)",
            batch.version,
            batch.len()
        );

        let mut applied = 0;
        for change in &batch.changes {
            let _mutation = self.mutation.lock();
            match self.apply_change(change) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        "Failed to apply {:?} for '{}': {}",
                        change.kind,
                        change.path,
                        e
                    );
                    self.push_events([AssetEvent::LoadFailed {
                        path: change.path.clone(),
                        error: e.to_string(),
                    }]);
                }
            }
        }
        applied
    }

    fn apply_change(&self, change: &AssetDirectoryChange) -> AssetResult<bool> {
        let rel = path::normalize(&change.path)?;
        if self.layout.is_sidecar(&rel) {
            return Ok(false);
        }

        match (change.kind, change.old_path.as_deref()) {
            (ChangeKind::Created, _) => self.apply_created(&rel),
            (ChangeKind::Changed, _) | (ChangeKind::Renamed, None) => self.apply_changed(&rel),
            (ChangeKind::Deleted, _) => Ok(self.apply_deleted(&rel)),
            (ChangeKind::Renamed, Some(old)) => {
                let old = path::normalize(old)?;
                self.apply_renamed(&old, &rel)
            }
        }
    }

    fn apply_created(&self, rel: &str) -> AssetResult<bool> {
        if self.registries.lock().id_for_path(rel).is_some() {
            return self.apply_changed(rel);
        }

        if self.sources.is_dir(rel) {
            return self.import_directory(rel);
        }

        let Some(extension) = path::extension(rel) else {
            return Ok(false);
        };
        let Some(loader) = self.loaders.get_by_extension(&extension).cloned() else {
            tracing::trace!("No loader for '{}', ignoring", rel);
            return Ok(false);
        };
        self.load_with(&loader, rel)
    }

    /// Import every loadable file under a directory that appeared at once.
    fn import_directory(&self, dir: &str) -> AssetResult<bool> {
        let mut any = false;
        for child in self.sources.read_dir(dir)? {
            if self.layout.is_sidecar(&child) {
                continue;
            }
            match self.apply_created(&child) {
                Ok(imported) => any |= imported,
                Err(e) => tracing::warn!("Failed to import '{}': {}", child, e),
            }
        }
        Ok(any)
    }

    fn apply_changed(&self, rel: &str) -> AssetResult<bool> {
        let type_id = self
            .registries
            .lock()
            .loaded_at(rel)
            .map(|stored| stored.type_id);

        match type_id {
            Some(type_id) => {
                let loader = self.loader_for(type_id, None, rel)?;
                self.load_with(&loader, rel)
            }
            None => self.apply_created(rel),
        }
    }

    fn apply_deleted(&self, rel: &str) -> bool {
        let events = {
            let mut registries = self.registries.lock();
            match registries.remove_path(rel) {
                Some(event) => vec![event],
                None => registries.remove_within(rel),
            }
        };

        if events.is_empty() {
            return false;
        }
        tracing::debug!("Source '{}' deleted, dropped {} assets", rel, events.len());
        self.push_events(events);
        true
    }

    fn apply_renamed(&self, old: &str, new: &str) -> AssetResult<bool> {
        let registered = self.registries.lock().paths_within(old);
        if registered.is_empty() {
            return self.apply_created(new);
        }

        let is_file = registered.len() == 1 && registered[0] == old;
        {
            let _suppressed = self.suppression.enter();
            if is_file {
                self.move_sidecars(old, new)?;
            } else {
                self.move_bin_dir(old, new)?;
            }
        }

        self.reload_moved(old, new)
    }

    /// Rebase registry entries from `old` to `new` and reload each one at its
    /// new path, which also rewrites the recorded source path in its meta.
    pub(super) fn reload_moved(&self, old: &str, new: &str) -> AssetResult<bool> {
        let (moved, displaced) = self.registries.lock().rebase(old, new);
        self.push_events(displaced);
        let mut any = false;
        let mut first_error = None;

        for (from, to) in moved {
            tracing::debug!("Rebound '{}' to '{}'", from, to);
            match self.apply_changed(&to) {
                Ok(loaded) => any |= loaded,
                Err(e) => {
                    // The entry can no longer be served from its new path.
                    let removed = self.registries.lock().remove_path(&to);
                    self.push_events(removed);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(any),
        }
    }

    /// Move the meta and binary of `old` next to `new`. Sidecars left at
    /// `new` by an asset that no longer lives there are replaced; if `old`
    /// has no meta, whatever sits at `new` was already moved with the source
    /// and is kept.
    pub(super) fn move_sidecars(&self, old: &str, new: &str) -> AssetResult<()> {
        let (old_meta, new_meta) = (self.layout.meta_rel(old), self.layout.meta_rel(new));
        let (old_bin, new_bin) = (self.layout.bin_rel(old), self.layout.bin_rel(new));

        let moving_meta = self.sources.exists(&old_meta);
        if moving_meta {
            if self.sources.remove(&new_meta)? {
                tracing::debug!("Replaced stale '{}'", new_meta);
            }
            self.sources.rename(&old_meta, &new_meta)?;
        }

        if self.binaries.exists(&old_bin) {
            self.binaries.remove(&new_bin)?;
            self.binaries.rename(&old_bin, &new_bin)?;
        } else if moving_meta {
            // A stale binary must not pass for the moved asset's cache.
            self.binaries.remove(&new_bin)?;
        }
        Ok(())
    }

    /// Mirror a directory rename inside a separate bin root.
    pub(super) fn move_bin_dir(&self, old: &str, new: &str) -> AssetResult<()> {
        if self.layout.shared_roots() || !self.binaries.is_dir(old) {
            return Ok(());
        }
        if self.binaries.exists(new) {
            return Err(AssetError::InconsistentState {
                path: new.to_string(),
                reason: "binary directory already exists".to_string(),
            });
        }
        self.binaries.rename(old, new)
    }
}
