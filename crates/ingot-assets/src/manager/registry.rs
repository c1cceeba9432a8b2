//! The manager's three caches and the rules that keep them consistent.

use ingot_core::alloc::HashMap;

use crate::asset::StoredAsset;
use crate::event::AssetEvent;
use crate::id::AssetId;
use crate::path;

/// Path index, disk cache and embedded cache.
///
/// Invariants: every path maps to exactly one loaded asset whose
/// `source_path` is that path, and every loaded asset is reachable from
/// exactly one path. A [`Registries::rebase`] suspends the first one until
/// the moved entries are reloaded.
#[derive(Default)]
pub(crate) struct Registries {
    paths: HashMap<String, AssetId>,
    loaded: HashMap<AssetId, StoredAsset>,
    embedded: HashMap<AssetId, StoredAsset>,
}

impl Registries {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn id_for_path(&self, path: &str) -> Option<AssetId> {
        self.paths.get(path).copied()
    }

    pub(crate) fn loaded(&self, id: AssetId) -> Option<&StoredAsset> {
        self.loaded.get(&id)
    }

    pub(crate) fn embedded(&self, id: AssetId) -> Option<&StoredAsset> {
        self.embedded.get(&id)
    }

    pub(crate) fn loaded_at(&self, path: &str) -> Option<&StoredAsset> {
        self.id_for_path(path).and_then(|id| self.loaded.get(&id))
    }

    pub(crate) fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub(crate) fn embedded_count(&self) -> usize {
        self.embedded.len()
    }

    /// Sorted registered paths.
    pub(crate) fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.paths.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Registered paths equal to or underneath `dir`, sorted.
    pub(crate) fn paths_within(&self, dir: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .paths
            .keys()
            .filter(|p| path::is_within(p, dir))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Register a freshly loaded disk asset, replacing whatever held its
    /// identity or its path before.
    pub(crate) fn insert_loaded(&mut self, asset: StoredAsset) -> Vec<AssetEvent> {
        let mut events = Vec::new();
        let id = asset.id();
        let new_path = asset.header.source_path.clone();

        // A different asset previously living at this path is gone.
        if let Some(displaced) = self.paths.get(&new_path).copied()
            && displaced != id
            && let Some(old) = self.loaded.remove(&displaced)
        {
            events.push(AssetEvent::Removed {
                id: displaced,
                type_id: old.type_id,
                path: old.header.source_path,
            });
        }

        let event = match self.loaded.get(&id) {
            Some(previous) if previous.header.source_path != new_path => {
                let old_path = previous.header.source_path.clone();
                if self.paths.get(&old_path) == Some(&id) {
                    self.paths.remove(&old_path);
                }
                AssetEvent::Renamed {
                    id,
                    type_id: asset.type_id,
                    old_path,
                    path: new_path.clone(),
                }
            }
            Some(_) => AssetEvent::Modified {
                id,
                type_id: asset.type_id,
                path: new_path.clone(),
            },
            None => AssetEvent::Created {
                id,
                type_id: asset.type_id,
                path: new_path.clone(),
            },
        };
        events.push(event);

        self.paths.insert(new_path, id);
        self.loaded.insert(id, asset);
        events
    }

    /// Drop the disk asset registered at exactly `path`.
    pub(crate) fn remove_path(&mut self, path: &str) -> Option<AssetEvent> {
        let id = self.paths.remove(path)?;
        let asset = self.loaded.remove(&id)?;
        Some(AssetEvent::Removed {
            id,
            type_id: asset.type_id,
            path: path.to_string(),
        })
    }

    /// Drop every disk asset at or under `dir`.
    pub(crate) fn remove_within(&mut self, dir: &str) -> Vec<AssetEvent> {
        self.paths_within(dir)
            .iter()
            .filter_map(|p| self.remove_path(p))
            .collect()
    }

    /// Move every path entry at or under `from` to the corresponding path
    /// under `to`. Returns the `(old, new)` path pairs and a `Removed` event
    /// for every asset that was registered at one of the targets.
    ///
    /// Stored headers keep their old `source_path` until the entry is
    /// reloaded at its new path, which then reports a rename.
    pub(crate) fn rebase(
        &mut self,
        from: &str,
        to: &str,
    ) -> (Vec<(String, String)>, Vec<AssetEvent>) {
        let mut moved = Vec::new();
        let mut removed = Vec::new();

        for old in self.paths_within(from) {
            let Some(new) = path::rebase(&old, from, to) else {
                continue;
            };
            let Some(id) = self.paths.remove(&old) else {
                continue;
            };
            // A stale entry at the target would break the path bijection.
            if let Some(stale) = self.paths.insert(new.clone(), id)
                && stale != id
                && let Some(asset) = self.loaded.remove(&stale)
            {
                removed.push(AssetEvent::Removed {
                    id: stale,
                    type_id: asset.type_id,
                    path: new.clone(),
                });
            }
            moved.push((old, new));
        }

        (moved, removed)
    }

    /// Register an embedded asset. Returns the matching event.
    pub(crate) fn insert_embedded(&mut self, asset: StoredAsset, name: &str) -> AssetEvent {
        let id = asset.id();
        let type_id = asset.type_id;
        let event = if self.embedded.contains_key(&id) {
            AssetEvent::Modified {
                id,
                type_id,
                path: name.to_string(),
            }
        } else {
            AssetEvent::Created {
                id,
                type_id,
                path: name.to_string(),
            }
        };
        self.embedded.insert(id, asset);
        event
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::asset::{Asset, AssetHeader, LoadedAsset};
    use crate::hash::ContentHash;

    #[derive(Debug, Serialize, Deserialize)]
    struct Blob;

    impl Asset for Blob {
        fn type_name() -> &'static str {
            "Blob"
        }
    }

    fn stored(id: AssetId, path: &str) -> StoredAsset {
        StoredAsset::erase(LoadedAsset::new(
            AssetHeader {
                id,
                source_path: path.to_string(),
                source_hash: ContentHash::from_bytes(path.as_bytes()),
            },
            Vec::new(),
            Blob,
        ))
    }

    #[test]
    fn test_insert_reports_created_then_modified() {
        let mut reg = Registries::new();
        let id = AssetId::new();
        assert!(reg.insert_loaded(stored(id, "a.png"))[0].is_created());
        assert!(reg.insert_loaded(stored(id, "a.png"))[0].is_modified());
        assert_eq!(reg.id_for_path("a.png"), Some(id));
        assert_eq!(reg.loaded_count(), 1);
    }

    #[test]
    fn test_insert_under_new_path_is_rename() {
        let mut reg = Registries::new();
        let id = AssetId::new();
        reg.insert_loaded(stored(id, "a.png"));
        let events = reg.insert_loaded(stored(id, "b.png"));
        assert!(events[0].is_renamed());
        assert_eq!(reg.id_for_path("a.png"), None);
        assert_eq!(reg.id_for_path("b.png"), Some(id));
    }

    #[test]
    fn test_insert_displaces_previous_asset_at_path() {
        let mut reg = Registries::new();
        let first = AssetId::new();
        let second = AssetId::new();
        reg.insert_loaded(stored(first, "a.png"));
        let events = reg.insert_loaded(stored(second, "a.png"));

        assert!(events[0].is_removed());
        assert!(events[1].is_created());
        assert!(reg.loaded(first).is_none());
        assert_eq!(reg.loaded_count(), 1);
    }

    #[test]
    fn test_remove_within_directory() {
        let mut reg = Registries::new();
        reg.insert_loaded(stored(AssetId::new(), "Textures/a.png"));
        reg.insert_loaded(stored(AssetId::new(), "Textures/Sub/b.png"));
        reg.insert_loaded(stored(AssetId::new(), "TexturesOld/c.png"));

        let events = reg.remove_within("Textures");
        assert_eq!(events.len(), 2);
        assert_eq!(reg.paths(), vec!["TexturesOld/c.png"]);
    }

    #[test]
    fn test_rebase_then_reload_reports_rename() {
        let mut reg = Registries::new();
        let id = AssetId::new();
        reg.insert_loaded(stored(id, "Textures/Sub/b.png"));

        let (moved, removed) = reg.rebase("Textures", "Art");
        assert!(removed.is_empty());
        assert_eq!(
            moved,
            vec![("Textures/Sub/b.png".to_string(), "Art/Sub/b.png".to_string())]
        );
        assert_eq!(reg.id_for_path("Art/Sub/b.png"), Some(id));
        assert_eq!(reg.id_for_path("Textures/Sub/b.png"), None);

        let events = reg.insert_loaded(stored(id, "Art/Sub/b.png"));
        assert_eq!(events.len(), 1);
        assert!(events[0].is_renamed());
        assert_eq!(reg.paths(), vec!["Art/Sub/b.png"]);
    }

    #[test]
    fn test_rebase_onto_registered_path_drops_it() {
        let mut reg = Registries::new();
        let moving = AssetId::new();
        let stale = AssetId::new();
        reg.insert_loaded(stored(moving, "a.png"));
        reg.insert_loaded(stored(stale, "b.png"));

        let (moved, removed) = reg.rebase("a.png", "b.png");
        assert_eq!(moved, vec![("a.png".to_string(), "b.png".to_string())]);
        assert_eq!(removed.len(), 1);
        match &removed[0] {
            AssetEvent::Removed { id, path, .. } => {
                assert_eq!(*id, stale);
                assert_eq!(path, "b.png");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(reg.loaded(stale).is_none());
        assert_eq!(reg.id_for_path("b.png"), Some(moving));
        assert_eq!(reg.loaded_count(), 1);
    }

    #[test]
    fn test_embedded_namespace_is_separate() {
        let mut reg = Registries::new();
        let id = AssetId::for_embedded("engine", "white.png");
        assert!(reg.insert_embedded(stored(id, ""), "white.png").is_created());
        assert!(reg.insert_embedded(stored(id, ""), "white.png").is_modified());
        assert!(reg.loaded(id).is_none());
        assert!(reg.embedded(id).is_some());
        assert_eq!(reg.embedded_count(), 1);
    }
}
