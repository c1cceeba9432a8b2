//! Path mutations performed by the manager itself.
//!
//! Each operation runs with the watcher suppressed and updates the
//! registries synchronously, so callers observe the result immediately.

use ingot_core::profiling::profile_function;

use super::AssetManager;
use crate::error::{AssetError, AssetResult};
use crate::path;

impl AssetManager {
    /// Create a directory (and missing parents) under the asset root.
    pub fn create_folder(&self, path: &str) -> bool {
        self.run_path_op("create folder", path, |rel| {
            self.sources.create_dir(rel)?;
            tracing::debug!("Created folder '{}'", rel);
            Ok(())
        })
    }

    /// Delete a source file with its meta and binary, or a whole directory.
    pub fn delete_path(&self, path: &str) -> bool {
        self.run_path_op("delete", path, |rel| self.delete_inner(rel))
    }

    fn delete_inner(&self, rel: &str) -> AssetResult<()> {
        if self.sources.is_dir(rel) {
            self.sources.remove(rel)?;
            if !self.layout.shared_roots() {
                self.binaries.remove(rel)?;
            }
            let events = self.registries.lock().remove_within(rel);
            tracing::info!("Deleted folder '{}' ({} assets)", rel, events.len());
            self.push_events(events);
            return Ok(());
        }

        let registered = self.registries.lock().id_for_path(rel).is_some();
        if !self.sources.exists(rel) && !registered {
            return Err(AssetError::NotFound {
                path: rel.to_string(),
            });
        }

        self.sources.remove(rel)?;
        self.sources.remove(&self.layout.meta_rel(rel))?;
        self.binaries.remove(&self.layout.bin_rel(rel))?;

        let removed = self.registries.lock().remove_path(rel);
        tracing::info!("Deleted '{}'", rel);
        self.push_events(removed);
        Ok(())
    }

    /// Rename a file or directory, keeping the identities of every asset
    /// inside it.
    pub fn rename_path(&self, from: &str, to: &str) -> bool {
        let to = match path::normalize(to) {
            Ok(to) => to,
            Err(e) => {
                tracing::error!("Cannot rename '{}': {}", from, e);
                return false;
            }
        };
        self.run_path_op("rename", from, |rel| self.rename_inner(rel, &to))
    }

    /// Move a file or directory into `dir`, keeping its name.
    pub fn move_path(&self, path: &str, dir: &str) -> bool {
        let (rel, dir) = match (path::normalize(path), normalize_dir(dir)) {
            (Ok(rel), Ok(dir)) => (rel, dir),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Cannot move '{}' into '{}': {}", path, dir, e);
                return false;
            }
        };
        let target = path::join(&dir, path::file_name(&rel));
        self.run_path_op("move", &rel, |rel| self.rename_inner(rel, &target))
    }

    fn rename_inner(&self, from: &str, to: &str) -> AssetResult<()> {
        if from == to || path::is_within(to, from) {
            return Err(AssetError::InvalidPath {
                path: to.to_string(),
            });
        }
        if !self.sources.exists(from) {
            return Err(AssetError::NotFound {
                path: from.to_string(),
            });
        }
        if !self.registries.lock().paths_within(to).is_empty() {
            return Err(AssetError::InconsistentState {
                path: to.to_string(),
                reason: "target holds a registered asset".to_string(),
            });
        }

        if self.sources.is_dir(from) {
            self.sources.rename(from, to)?;
            self.move_bin_dir(from, to)?;
        } else {
            self.sources.rename(from, to)?;
            self.move_sidecars(from, to)?;
        }
        tracing::info!("Renamed '{}' to '{}'", from, to);

        self.reload_moved(from, to)?;
        Ok(())
    }

    /// Normalize `path`, then run `op` under the mutation lock with the
    /// watcher suppressed. Failures are logged and reported as `false`.
    fn run_path_op(
        &self,
        what: &str,
        path: &str,
        op: impl FnOnce(&str) -> AssetResult<()>,
    ) -> bool {
        profile_function!();

        let rel = match path::normalize(path) {
            Ok(rel) => rel,
            Err(e) => {
                tracing::error!("Cannot {} '{}': {}", what, path, e);
                return false;
            }
        };

        let _mutation = self.mutation.lock();
        let _suppressed = self.suppression.enter();
        match op(&rel) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to {} '{}': {}", what, rel, e);
                false
            }
        }
    }
}

/// Normalize a directory path where the empty string means the asset root.
fn normalize_dir(dir: &str) -> AssetResult<String> {
    if dir.split(['/', '\\']).all(|s| s.is_empty() || s == ".") {
        Ok(String::new())
    } else {
        path::normalize(dir)
    }
}
