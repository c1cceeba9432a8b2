//! Hot reload support for assets during development.
//!
//! [`AssetWatcher`] turns OS file events under the asset root into
//! [`AssetDirectoryChange`]s and coalesces them into batches. The manager
//! drains it from [`AssetManager::process_hot_reload`], either from the host's
//! frame loop or from a [`WatchThread`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, channel};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::change::{AssetDirectoryChange, ChangeBatch, ChangeCoalescer};
use crate::config::{AssetStoreConfig, StoreLayout};
use crate::error::{AssetError, AssetResult};
use crate::manager::AssetManager;
use crate::path;

/// File watcher for the asset root.
pub struct AssetWatcher {
    watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    layout: StoreLayout,
    coalescer: ChangeCoalescer,
    flush_interval: Duration,
    last_event: Option<Instant>,
    /// Source half of a rename reported as two events.
    pending_from: Option<String>,
    /// Last rename emitted from a From/To pair, so the combined event that
    /// some backends send afterwards is not applied twice.
    last_rename: Option<(String, String)>,
}

impl AssetWatcher {
    /// Create a watcher for `config.asset_root`. Nothing is watched until
    /// [`AssetWatcher::start`] is called.
    pub fn new(config: &AssetStoreConfig) -> AssetResult<Self> {
        let (sender, receiver) = channel();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = sender.send(res);
        })
        .map_err(|e| AssetError::Watcher {
            message: e.to_string(),
        })?;

        Ok(Self {
            watcher,
            receiver,
            layout: StoreLayout::new(config),
            coalescer: ChangeCoalescer::new(),
            flush_interval: config.flush_interval(),
            last_event: None,
            pending_from: None,
            last_rename: None,
        })
    }

    /// Begin watching the asset root recursively.
    pub fn start(&mut self) -> AssetResult<()> {
        let root = self.layout.asset_root().to_path_buf();
        self.watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| AssetError::Watcher {
                message: format!("{}: {}", root.display(), e),
            })?;
        tracing::debug!("Watching directory for changes: {}", root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        self.layout.asset_root()
    }

    fn relative(&self, absolute: &Path) -> Option<String> {
        let rel = path::to_relative(self.layout.asset_root(), absolute)?;
        if self.layout.is_sidecar(&rel) {
            None
        } else {
            Some(rel)
        }
    }

    /// Translate one OS event into zero or more changes.
    fn translate(&mut self, event: Event) -> Vec<AssetDirectoryChange> {
        let mut changes = Vec::new();

        match event.kind {
            EventKind::Create(_) => {
                changes.extend(
                    event
                        .paths
                        .iter()
                        .filter_map(|p| self.relative(p))
                        .map(AssetDirectoryChange::created),
                );
            }
            EventKind::Remove(_) => {
                changes.extend(
                    event
                        .paths
                        .iter()
                        .filter_map(|p| self.relative(p))
                        .map(AssetDirectoryChange::deleted),
                );
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [from, to] = event.paths.as_slice() {
                    let pair = (self.relative(from), self.relative(to));
                    if let (Some(from), Some(to)) = &pair
                        && self.last_rename.as_ref() == Some(&(from.clone(), to.clone()))
                    {
                        self.last_rename = None;
                        return changes;
                    }
                    match pair {
                        (Some(from), Some(to)) => {
                            changes.push(AssetDirectoryChange::renamed(from, to))
                        }
                        (Some(from), None) => changes.push(AssetDirectoryChange::deleted(from)),
                        (None, Some(to)) => changes.push(AssetDirectoryChange::created(to)),
                        (None, None) => {}
                    }
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                if let Some(stale) = self.pending_from.take() {
                    changes.push(AssetDirectoryChange::deleted(stale));
                }
                self.pending_from = event.paths.first().and_then(|p| self.relative(p));
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                let to = event.paths.first().and_then(|p| self.relative(p));
                match (self.pending_from.take(), to) {
                    (Some(from), Some(to)) => {
                        self.last_rename = Some((from.clone(), to.clone()));
                        changes.push(AssetDirectoryChange::renamed(from, to));
                    }
                    (Some(from), None) => changes.push(AssetDirectoryChange::deleted(from)),
                    (None, Some(to)) => changes.push(AssetDirectoryChange::created(to)),
                    (None, None) => {}
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                // Backends that cannot pair renames report each side alone.
                for p in &event.paths {
                    if let Some(rel) = self.relative(p) {
                        if p.exists() {
                            changes.push(AssetDirectoryChange::created(rel));
                        } else {
                            changes.push(AssetDirectoryChange::deleted(rel));
                        }
                    }
                }
            }
            EventKind::Modify(_) => {
                changes.extend(
                    event
                        .paths
                        .iter()
                        .filter(|p| !p.is_dir())
                        .filter_map(|p| self.relative(p))
                        .map(AssetDirectoryChange::changed),
                );
            }
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }

        changes
    }

    /// Drain pending OS events, returning the individual changes in arrival
    /// order. The changes are also queued for the next batch.
    pub fn poll_changes(&mut self) -> Vec<AssetDirectoryChange> {
        let mut changes = Vec::new();

        while let Ok(event) = self.receiver.try_recv() {
            match event {
                Ok(event) => changes.extend(self.translate(event)),
                Err(e) => tracing::error!("File watcher error: {}", e),
            }
        }

        if !changes.is_empty() {
            tracing::trace!("Watcher observed {} changes", changes.len());
            self.last_event = Some(Instant::now());
            for change in &changes {
                self.coalescer.push(change.clone());
            }
        }

        changes
    }

    /// Flush the coalesced batch once no event has arrived for the flush
    /// interval.
    pub fn flush_ready(&mut self) -> Option<ChangeBatch> {
        let quiet = self
            .last_event
            .is_none_or(|at| at.elapsed() >= self.flush_interval);
        if quiet { self.flush() } else { None }
    }

    /// Flush the coalesced batch immediately.
    pub fn flush(&mut self) -> Option<ChangeBatch> {
        if let Some(from) = self.pending_from.take() {
            // Moved out of the watched tree.
            self.coalescer.push(AssetDirectoryChange::deleted(from));
        }
        self.last_rename = None;
        self.last_event = None;
        self.coalescer.flush()
    }

    /// Queue a change without an OS event, e.g. from an editor that knows
    /// better than the backend.
    pub fn push(&mut self, change: AssetDirectoryChange) {
        self.last_event = Some(Instant::now());
        self.coalescer.push(change);
    }
}

/// Background thread that drives [`AssetManager::process_hot_reload`].
///
/// The thread stops and is joined when this value is dropped.
pub struct WatchThread {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl WatchThread {
    /// Spawn a thread polling `manager` every `poll_interval`.
    pub fn spawn(manager: Arc<AssetManager>, poll_interval: Duration) -> AssetResult<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("ingot-asset-watch".to_string())
            .spawn(move || {
                tracing::debug!("Asset watch thread started");
                while !thread_stop.load(Ordering::Acquire) {
                    let applied = manager.process_hot_reload();
                    if applied > 0 {
                        tracing::debug!("Hot reload applied {} changes", applied);
                    }
                    thread::sleep(poll_interval);
                }
                tracing::debug!("Asset watch thread stopped");
            })
            .map_err(|e| AssetError::io(PathBuf::from("ingot-asset-watch"), e))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the thread to stop and wait for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("Asset watch thread panicked");
        }
    }
}

impl Drop for WatchThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    fn watcher(dir: &Path) -> AssetWatcher {
        let config = AssetStoreConfig::new(dir);
        AssetWatcher::new(&config).unwrap()
    }

    fn event(kind: EventKind, paths: &[PathBuf]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, p| event.add_path(p.clone()))
    }

    #[test]
    fn test_asset_watcher_creation_and_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path());
        assert!(watcher.start().is_ok());
        assert_eq!(watcher.root(), dir.path());
    }

    #[test]
    fn test_translate_basic_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path());
        let rock = dir.path().join("Textures").join("rock.png");

        assert_eq!(
            watcher.translate(event(EventKind::Create(CreateKind::File), &[rock.clone()])),
            vec![AssetDirectoryChange::created("Textures/rock.png")]
        );
        assert_eq!(
            watcher.translate(event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &[rock.clone()]
            )),
            vec![AssetDirectoryChange::changed("Textures/rock.png")]
        );
        assert_eq!(
            watcher.translate(event(EventKind::Remove(RemoveKind::File), &[rock])),
            vec![AssetDirectoryChange::deleted("Textures/rock.png")]
        );
    }

    #[test]
    fn test_sidecars_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path());
        let changes = watcher.translate(event(
            EventKind::Create(CreateKind::File),
            &[
                dir.path().join("rock.png.meta"),
                dir.path().join("rock.png.bin"),
            ],
        ));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_rename_pair_is_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path());
        let from = dir.path().join("a.png");
        let to = dir.path().join("b.png");

        let mut changes = Vec::new();
        changes.extend(watcher.translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &[from.clone()],
        )));
        changes.extend(watcher.translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &[to.clone()],
        )));
        changes.extend(watcher.translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &[from, to],
        )));

        assert_eq!(changes, vec![AssetDirectoryChange::renamed("a.png", "b.png")]);
    }

    #[test]
    fn test_unpaired_rename_from_becomes_delete_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path());
        watcher.translate(event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &[dir.path().join("gone.png")],
        ));

        let batch = watcher.flush().unwrap();
        assert_eq!(batch.changes, vec![AssetDirectoryChange::deleted("gone.png")]);
    }

    #[test]
    fn test_push_coalesces_and_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path());
        assert!(watcher.flush().is_none());

        watcher.push(AssetDirectoryChange::created("a.png"));
        watcher.push(AssetDirectoryChange::changed("a.png"));
        let batch = watcher.flush().unwrap();
        assert_eq!(batch.version, 1);
        assert_eq!(batch.changes, vec![AssetDirectoryChange::created("a.png")]);
    }

    #[test]
    fn test_flush_ready_waits_for_quiet_period() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssetStoreConfig {
            flush_interval_ms: 60_000,
            ..AssetStoreConfig::new(dir.path())
        };
        let mut watcher = AssetWatcher::new(&config).unwrap();
        watcher.push(AssetDirectoryChange::changed("a.png"));
        assert!(watcher.flush_ready().is_none());
        assert!(watcher.flush().is_some());
    }
}
