//! The asset manager - sole owner and mutator of the asset registries.

mod paths;
mod reconcile;
mod registry;

use std::any::TypeId;
use std::path::Path;
use std::sync::Arc;

use ingot_core::profiling::profile_function;
use parking_lot::Mutex;

use crate::asset::{Asset, LoadedAsset, StoredAsset};
use crate::config::{AssetStoreConfig, StoreLayout};
use crate::embedded::{EmbeddedManifest, EmbeddedModule};
use crate::error::{AssetError, AssetResult};
use crate::event::{AssetEvent, AssetEventBuffer};
use crate::fs::{AssetFileSystem, DiskFileSystem};
use crate::handle::AssetRef;
use crate::id::AssetId;
use crate::loader::{AssetLoader, ErasedAssetLoader, LoaderRegistry};
use crate::path;
use crate::suppress::Suppression;

use registry::Registries;

/// Coordinates importing, caching and synchronizing assets for one store.
///
/// Loaders and embedded modules are registered through `&mut self` at
/// startup; after that the manager is typically shared in an `Arc` and used
/// from any thread.
///
/// # Example
///
/// ```ignore
/// let mut manager = AssetManager::new(AssetStoreConfig::new("assets"));
/// manager.register_loader(TextureLoader);
/// manager.register_embedded(EmbeddedModule::new("engine").with_resource(
///     "white.png",
///     include_bytes!("white.png"),
/// ));
///
/// manager.load::<Texture>("Textures/rock.png");
/// let rock = manager.get::<Texture>("Textures/rock.png");
///
/// if let Some(texture) = rock.resolve(&manager) {
///     // Use the texture
/// }
///
/// for event in manager.drain_events() {
///     match event {
///         AssetEvent::Created { .. } => {}
///         AssetEvent::Modified { .. } => {}
///         _ => {}
///     }
/// }
/// ```
pub struct AssetManager {
    config: AssetStoreConfig,
    layout: StoreLayout,
    loaders: LoaderRegistry,
    manifest: EmbeddedManifest,
    /// File access under the asset root (sources and meta documents).
    sources: Arc<dyn AssetFileSystem>,
    /// File access under the bin root. Same instance as `sources` when the
    /// roots are shared.
    binaries: Arc<dyn AssetFileSystem>,
    registries: Mutex<Registries>,
    /// Serializes mutating operations and reconciliation items.
    mutation: Mutex<()>,
    suppression: Suppression,
    events: Mutex<AssetEventBuffer>,
    #[cfg(feature = "hot-reload")]
    watcher: Mutex<Option<crate::hot_reload::AssetWatcher>>,
}

impl AssetManager {
    /// Create a manager working directly on disk.
    pub fn new(config: AssetStoreConfig) -> Self {
        let sources: Arc<dyn AssetFileSystem> = Arc::new(DiskFileSystem::new(&config.asset_root));
        Self::with_file_system(config, sources)
    }

    /// Create a manager whose path operations go through `sources`, which
    /// must be rooted at `config.asset_root`.
    pub fn with_file_system(config: AssetStoreConfig, sources: Arc<dyn AssetFileSystem>) -> Self {
        let layout = StoreLayout::new(&config);
        let binaries: Arc<dyn AssetFileSystem> = if layout.shared_roots() {
            Arc::clone(&sources)
        } else {
            Arc::new(DiskFileSystem::new(layout.bin_root()))
        };

        tracing::info!(
            "Asset manager initialized (assets: {}, binaries: {})",
            layout.asset_root().display(),
            layout.bin_root().display()
        );

        Self {
            config,
            layout,
            loaders: LoaderRegistry::new(),
            manifest: EmbeddedManifest::new(),
            sources,
            binaries,
            registries: Mutex::new(Registries::new()),
            mutation: Mutex::new(()),
            suppression: Suppression::new(),
            events: Mutex::new(AssetEventBuffer::new()),
            #[cfg(feature = "hot-reload")]
            watcher: Mutex::new(None),
        }
    }

    /// Register an asset loader.
    pub fn register_loader<L: AssetLoader>(&mut self, loader: L) {
        self.loaders.register(loader);
    }

    /// Register a module of build-baked resources.
    pub fn register_embedded(&mut self, module: EmbeddedModule) {
        self.manifest.register(module);
    }

    pub fn config(&self) -> &AssetStoreConfig {
        &self.config
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Check if a loader for `T` handles `extension`.
    pub fn has_loader_for<T: Asset>(&self, extension: &str) -> bool {
        self.loaders.has_loader_for(TypeId::of::<T>(), extension)
    }

    /// Check if any loader handles `extension`, which is what the watcher
    /// needs to pick up a new file.
    pub fn has_loader_for_extension(&self, extension: &str) -> bool {
        self.loaders.has_loader_for_extension(extension)
    }

    /// Import the source at `path` as a `T` and register it.
    ///
    /// Returns `false` when there is nothing to load or the import failed;
    /// failures also emit [`AssetEvent::LoadFailed`].
    pub fn load<T: Asset>(&self, path: &str) -> bool {
        profile_function!();
        match self.try_load::<T>(path) {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("Nothing to load at '{}'", path);
                false
            }
            Err(e) => {
                self.report_failure(path, &e);
                false
            }
        }
    }

    fn try_load<T: Asset>(&self, path: &str) -> AssetResult<bool> {
        let rel = path::normalize(path)?;
        let loader = self.loader_for(TypeId::of::<T>(), Some(T::type_name()), &rel)?;
        let _mutation = self.mutation.lock();
        self.load_with(&loader, &rel)
    }

    /// Run the state machine for `rel` and apply the outcome to the
    /// registries. Callers hold the mutation lock.
    pub(crate) fn load_with(
        &self,
        loader: &Arc<dyn ErasedAssetLoader>,
        rel: &str,
    ) -> AssetResult<bool> {
        match loader.load(&self.layout, rel)? {
            Some(stored) => {
                let events = self.registries.lock().insert_loaded(stored);
                self.push_events(events);
                Ok(true)
            }
            None => {
                let removed = self.registries.lock().remove_path(rel);
                self.push_events(removed);
                Ok(false)
            }
        }
    }

    /// Binarize an embedded resource as a `T` and register it.
    ///
    /// `name` is matched exactly or as an unambiguous suffix, ignoring case.
    pub fn load_embedded<T: Asset>(&self, name: &str) -> bool {
        profile_function!();
        match self.try_load_embedded::<T>(name) {
            Ok(()) => true,
            Err(e) => {
                self.report_failure(name, &e);
                false
            }
        }
    }

    fn try_load_embedded<T: Asset>(&self, name: &str) -> AssetResult<()> {
        let resource = self.manifest.find(name)?;
        let type_id = TypeId::of::<T>();
        let loader = path::extension(resource.name)
            .and_then(|ext| self.loaders.get_for_type_and_extension(type_id, &ext))
            .or_else(|| self.loaders.get_by_type(type_id))
            .ok_or(AssetError::NoLoader {
                type_id,
                type_name: Some(T::type_name()),
            })?;

        let _mutation = self.mutation.lock();
        let stored = loader.load_raw(resource.name, resource.id(), resource.bytes)?;
        tracing::debug!(
            "Loaded embedded '{}:{}' as {}",
            resource.module,
            resource.name,
            stored.id()
        );
        let event = self.registries.lock().insert_embedded(stored, resource.name);
        self.push_events([event]);
        Ok(())
    }

    /// Write `asset` back to its own source path and re-import it.
    pub fn save<T: Asset>(&self, asset: &LoadedAsset<T>) -> bool {
        self.save_to(asset.source_path(), asset)
    }

    /// Write `asset` to the source at `path` and re-import it there, so meta,
    /// binary and hash stay consistent.
    ///
    /// Saving to a path other than the asset's own creates a new asset with
    /// a fresh identity.
    pub fn save_to<T: Asset>(&self, path: &str, asset: &LoadedAsset<T>) -> bool {
        profile_function!();
        match self.try_save::<T>(path, asset) {
            Ok(saved) => saved,
            Err(e) => {
                self.report_failure(path, &e);
                false
            }
        }
    }

    fn try_save<T: Asset>(&self, path: &str, asset: &LoadedAsset<T>) -> AssetResult<bool> {
        let rel = path::normalize(path)?;
        let loader = self.loader_for(TypeId::of::<T>(), Some(T::type_name()), &rel)?;

        let _mutation = self.mutation.lock();
        let _suppressed = self.suppression.enter();
        loader.save_source(&self.layout, &rel, &StoredAsset::erase(asset.clone()))?;
        self.load_with(&loader, &rel)
    }

    /// Reference to the disk asset registered at `path`.
    ///
    /// Returns an invalid reference (and logs) when nothing of type `T` is
    /// registered there.
    pub fn get<T: Asset>(&self, path: &str) -> AssetRef<T> {
        let Ok(rel) = path::normalize(path) else {
            tracing::error!("Invalid asset path '{}'", path);
            return AssetRef::invalid();
        };
        let registries = self.registries.lock();
        match registries.loaded_at(&rel) {
            Some(stored) => Self::typed_ref(stored, false),
            None => {
                tracing::warn!("No asset registered at '{}'", rel);
                AssetRef::invalid()
            }
        }
    }

    /// Reference to the disk asset with identity `id`.
    pub fn get_by_id<T: Asset>(&self, id: AssetId) -> AssetRef<T> {
        let registries = self.registries.lock();
        match registries.loaded(id) {
            Some(stored) => Self::typed_ref(stored, false),
            None => {
                tracing::warn!("No asset registered with id {}", id);
                AssetRef::invalid()
            }
        }
    }

    /// Reference to a loaded embedded asset, matched like
    /// [`AssetManager::load_embedded`].
    pub fn get_embedded<T: Asset>(&self, name: &str) -> AssetRef<T> {
        let id = match self.manifest.find(name) {
            Ok(resource) => resource.id(),
            Err(e) => {
                tracing::error!("{}", e);
                return AssetRef::invalid();
            }
        };
        let registries = self.registries.lock();
        match registries.embedded(id) {
            Some(stored) => Self::typed_ref(stored, true),
            None => {
                tracing::warn!("Embedded asset '{}' is not loaded", name);
                AssetRef::invalid()
            }
        }
    }

    fn typed_ref<T: Asset>(stored: &StoredAsset, embedded: bool) -> AssetRef<T> {
        if stored.type_id != TypeId::of::<T>() {
            let err = AssetError::TypeMismatch {
                id: stored.id(),
                expected: T::type_name(),
                actual: stored.type_name,
            };
            tracing::error!("{}", err);
            return AssetRef::invalid();
        }
        if embedded {
            AssetRef::embedded(stored.id())
        } else {
            AssetRef::new(stored.id())
        }
    }

    /// Current value behind `asset_ref`, looked up afresh on every call.
    pub fn resolve<T: Asset>(&self, asset_ref: &AssetRef<T>) -> Option<LoadedAsset<T>> {
        if !asset_ref.is_valid() {
            return None;
        }
        let registries = self.registries.lock();
        let stored = if asset_ref.is_embedded() {
            registries.embedded(asset_ref.id())
        } else {
            registries.loaded(asset_ref.id())
        };
        stored?.downcast::<T>().ok()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.id_for_path(path).is_some()
    }

    /// Identity registered at `path`, if any.
    pub fn id_for_path(&self, path: &str) -> Option<AssetId> {
        let rel = path::normalize(path).ok()?;
        self.registries.lock().id_for_path(&rel)
    }

    /// Every registered disk path, sorted.
    pub fn registered_paths(&self) -> Vec<String> {
        self.registries.lock().paths()
    }

    pub fn loaded_count(&self) -> usize {
        self.registries.lock().loaded_count()
    }

    pub fn embedded_count(&self) -> usize {
        self.registries.lock().embedded_count()
    }

    /// Returns `true` while the manager is mutating files itself.
    pub fn is_suppressed(&self) -> bool {
        self.suppression.is_active()
    }

    /// Convert an absolute path under the asset root into a registry path.
    pub fn to_relative_path_from_asset_directory(
        &self,
        absolute: impl AsRef<Path>,
    ) -> Option<String> {
        path::to_relative(self.layout.asset_root(), absolute.as_ref())
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&self) -> Vec<AssetEvent> {
        self.events.lock().take()
    }

    pub(crate) fn push_events(&self, events: impl IntoIterator<Item = AssetEvent>) {
        let mut buffer = self.events.lock();
        for event in events {
            buffer.push(event);
        }
    }

    fn report_failure(&self, path: &str, err: &AssetError) {
        if err.is_recoverable() {
            tracing::warn!("Failed to load '{}': {}", path, err);
        } else {
            tracing::error!("Failed to load '{}': {}", path, err);
        }
        self.push_events([AssetEvent::LoadFailed {
            path: path.to_string(),
            error: err.to_string(),
        }]);
    }

    /// Loader producing `type_id` for the extension of `rel`.
    pub(crate) fn loader_for(
        &self,
        type_id: TypeId,
        type_name: Option<&'static str>,
        rel: &str,
    ) -> AssetResult<Arc<dyn ErasedAssetLoader>> {
        let extension = path::extension(rel).ok_or_else(|| AssetError::NoLoaderForExtension {
            extension: String::new(),
        })?;
        self.loaders
            .get_for_type_and_extension(type_id, &extension)
            .cloned()
            .ok_or(AssetError::NoLoader { type_id, type_name })
    }

    /// Start watching the asset root. Calling it again is a no-op.
    #[cfg(feature = "hot-reload")]
    pub fn enable_hot_reload(&self) -> AssetResult<()> {
        use crate::hot_reload::AssetWatcher;

        let mut watcher = self.watcher.lock();
        if watcher.is_none() {
            let mut new_watcher = AssetWatcher::new(&self.config)?;
            new_watcher.start()?;
            *watcher = Some(new_watcher);
            tracing::info!(
                "Hot reload enabled for directory: {}",
                self.layout.asset_root().display()
            );
        }
        Ok(())
    }

    /// Poll the watcher and reconcile a batch once the flush interval has
    /// passed without new events. Returns the number of applied changes.
    #[cfg(feature = "hot-reload")]
    pub fn process_hot_reload(&self) -> usize {
        profile_function!();
        let batch = {
            let mut watcher = self.watcher.lock();
            let Some(watcher) = watcher.as_mut() else {
                return 0;
            };
            watcher.poll_changes();
            watcher.flush_ready()
        };

        match batch {
            Some(batch) => self.reconcile(&batch),
            None => 0,
        }
    }

    /// Enable hot reload and drive it from a background thread.
    #[cfg(feature = "hot-reload")]
    pub fn spawn_watch_thread(self: &Arc<Self>) -> AssetResult<crate::hot_reload::WatchThread> {
        self.enable_hot_reload()?;
        let interval = (self.config.flush_interval() / 4).max(std::time::Duration::from_millis(10));
        crate::hot_reload::WatchThread::spawn(Arc::clone(self), interval)
    }
}

impl std::fmt::Debug for AssetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetManager")
            .field("asset_root", &self.layout.asset_root())
            .field("bin_root", &self.layout.bin_root())
            .field("loaded", &self.loaded_count())
            .field("embedded", &self.embedded_count())
            .finish()
    }
}
