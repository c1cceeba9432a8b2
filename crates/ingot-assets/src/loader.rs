//! Asset loader traits and infrastructure.

use std::any::TypeId;
use std::sync::Arc;

use ingot_core::alloc::HashMap;
use serde::{Deserialize, Serialize};

use crate::asset::{Asset, LoadedAsset, StoredAsset};
use crate::config::StoreLayout;
use crate::error::{AssetError, AssetResult};
use crate::id::AssetId;
use crate::import;

/// Context handed to [`AssetLoader::binarize`].
pub struct LoadContext<'a> {
    /// Relative source path, or the resource name for embedded assets.
    pub name: &'a str,
    /// The raw source bytes.
    pub bytes: &'a [u8],
    /// Lowercase file extension (without the dot), if available.
    pub extension: Option<&'a str>,
}

impl<'a> LoadContext<'a> {
    /// Create a new load context.
    pub fn new(name: &'a str, bytes: &'a [u8], extension: Option<&'a str>) -> Self {
        Self {
            name,
            bytes,
            extension,
        }
    }

    /// Build a [`AssetError::BinarizeFailed`] for this source.
    pub fn error(&self, message: impl Into<String>) -> AssetError {
        AssetError::BinarizeFailed {
            path: self.name.to_string(),
            message: message.into(),
        }
    }
}

/// Output of a successful binarize: the runtime payload and the kind fields
/// that go into the meta document.
#[derive(Debug)]
pub struct Binarized<T> {
    pub binary: Vec<u8>,
    pub asset: T,
}

impl<T> Binarized<T> {
    pub fn new(binary: Vec<u8>, asset: T) -> Self {
        Self { binary, asset }
    }
}

/// Default priority for loaders.
pub const DEFAULT_LOADER_PRIORITY: i32 = 0;

/// Per-kind import logic.
///
/// `binarize` must be deterministic and free of side effects: the same
/// `(name, bytes)` always yields the same payload. Hash-based caching relies
/// on it, since an unchanged source is never binarized twice.
///
/// # Example
///
/// ```ignore
/// struct PngLoader;
///
/// impl AssetLoader for PngLoader {
///     type Asset = Texture;
///
///     fn extensions(&self) -> &[&str] {
///         &["png"]
///     }
///
///     fn binarize(&self, ctx: LoadContext<'_>) -> AssetResult<Binarized<Texture>> {
///         // Decode PNG bytes into a GPU-ready payload...
///     }
/// }
/// ```
pub trait AssetLoader: Send + Sync + 'static {
    /// The kind fields this loader produces.
    type Asset: Asset;

    /// The file extensions this loader handles (without dots).
    fn extensions(&self) -> &[&str];

    /// Turn raw source bytes into a binary payload and kind fields.
    fn binarize(&self, ctx: LoadContext<'_>) -> AssetResult<Binarized<Self::Asset>>;

    /// Encode an asset back into source bytes. Kinds that cannot round-trip
    /// return `None`, which makes saving them an error.
    fn encode_source(&self, asset: &LoadedAsset<Self::Asset>) -> Option<AssetResult<Vec<u8>>> {
        let _ = asset;
        None
    }

    /// Priority for this loader. Higher priority loaders win when several
    /// handle the same extension; on a tie the earlier registration wins.
    fn priority(&self) -> i32 {
        DEFAULT_LOADER_PRIORITY
    }
}

/// Type-erased loader used by the registry and the manager.
pub(crate) trait ErasedAssetLoader: Send + Sync {
    fn asset_type_id(&self) -> TypeId;

    fn asset_type_name(&self) -> &'static str;

    fn extensions(&self) -> &[&str];

    fn priority(&self) -> i32;

    /// Run the import state machine for `rel`.
    fn load(&self, layout: &StoreLayout, rel: &str) -> AssetResult<Option<StoredAsset>>;

    /// Binarize in-memory bytes under a caller-chosen identity.
    fn load_raw(&self, name: &str, id: AssetId, bytes: &[u8]) -> AssetResult<StoredAsset>;

    /// Write `asset` back to its source at `rel`.
    fn save_source(&self, layout: &StoreLayout, rel: &str, asset: &StoredAsset) -> AssetResult<()>;
}

impl<L: AssetLoader> ErasedAssetLoader for L {
    fn asset_type_id(&self) -> TypeId {
        TypeId::of::<L::Asset>()
    }

    fn asset_type_name(&self) -> &'static str {
        <L::Asset as Asset>::type_name()
    }

    fn extensions(&self) -> &[&str] {
        AssetLoader::extensions(self)
    }

    fn priority(&self) -> i32 {
        AssetLoader::priority(self)
    }

    fn load(&self, layout: &StoreLayout, rel: &str) -> AssetResult<Option<StoredAsset>> {
        Ok(import::load(self, layout, rel)?.map(StoredAsset::erase))
    }

    fn load_raw(&self, name: &str, id: AssetId, bytes: &[u8]) -> AssetResult<StoredAsset> {
        import::load_raw(self, name, id, bytes).map(StoredAsset::erase)
    }

    fn save_source(&self, layout: &StoreLayout, rel: &str, asset: &StoredAsset) -> AssetResult<()> {
        let typed = asset
            .downcast::<L::Asset>()
            .map_err(|actual| AssetError::TypeMismatch {
                id: asset.id(),
                expected: <L::Asset as Asset>::type_name(),
                actual,
            })?;
        import::save_source(self, layout, rel, &typed)
    }
}

/// Key for indexing loaders by type and extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LoaderKey {
    type_id: TypeId,
    extension: String,
}

/// Entry in the loader registry with priority.
struct LoaderEntry {
    loader: Arc<dyn ErasedAssetLoader>,
    priority: i32,
}

fn insert_sorted(entries: &mut Vec<LoaderEntry>, entry: LoaderEntry) {
    // Stable position: after every entry with priority >= the new one.
    let at = entries
        .iter()
        .position(|existing| existing.priority < entry.priority)
        .unwrap_or(entries.len());
    entries.insert(at, entry);
}

/// Registry of asset loaders, indexed by asset type and extension.
///
/// Typed loads look up `(TypeId, extension)`. Watcher-originated imports only
/// know the extension and use the extension index.
#[derive(Default)]
pub(crate) struct LoaderRegistry {
    by_type_and_ext: HashMap<LoaderKey, Vec<LoaderEntry>>,
    by_extension: HashMap<String, Vec<LoaderEntry>>,
}

impl LoaderRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a loader for its declared extensions.
    pub(crate) fn register<L: AssetLoader>(&mut self, loader: L) {
        let loader: Arc<dyn ErasedAssetLoader> = Arc::new(loader);
        let type_id = loader.asset_type_id();
        let priority = loader.priority();

        for ext in loader.extensions() {
            let ext_lower = ext.trim_start_matches('.').to_lowercase();

            let key = LoaderKey {
                type_id,
                extension: ext_lower.clone(),
            };
            insert_sorted(
                self.by_type_and_ext.entry(key).or_default(),
                LoaderEntry {
                    loader: Arc::clone(&loader),
                    priority,
                },
            );
            insert_sorted(
                self.by_extension.entry(ext_lower).or_default(),
                LoaderEntry {
                    loader: Arc::clone(&loader),
                    priority,
                },
            );
        }

        tracing::debug!(
            "Registered loader for {} ({})",
            loader.asset_type_name(),
            loader.extensions().join(", ")
        );
    }

    /// Best loader producing `type_id` for `extension`.
    pub(crate) fn get_for_type_and_extension(
        &self,
        type_id: TypeId,
        extension: &str,
    ) -> Option<&Arc<dyn ErasedAssetLoader>> {
        let key = LoaderKey {
            type_id,
            extension: extension.to_lowercase(),
        };
        self.by_type_and_ext
            .get(&key)
            .and_then(|entries| entries.first())
            .map(|entry| &entry.loader)
    }

    /// Best loader of any type for `extension`.
    pub(crate) fn get_by_extension(&self, extension: &str) -> Option<&Arc<dyn ErasedAssetLoader>> {
        self.by_extension
            .get(&extension.to_lowercase())
            .and_then(|entries| entries.first())
            .map(|entry| &entry.loader)
    }

    pub(crate) fn has_loader_for(&self, type_id: TypeId, extension: &str) -> bool {
        self.get_for_type_and_extension(type_id, extension).is_some()
    }

    pub(crate) fn has_loader_for_extension(&self, extension: &str) -> bool {
        self.get_by_extension(extension).is_some()
    }

    /// Any loader producing `type_id`, used for embedded resources whose
    /// names may lack a usable extension.
    pub(crate) fn get_by_type(&self, type_id: TypeId) -> Option<&Arc<dyn ErasedAssetLoader>> {
        self.by_type_and_ext
            .iter()
            .filter(|(key, _)| key.type_id == type_id)
            .filter_map(|(_, entries)| entries.first())
            .max_by_key(|entry| entry.priority)
            .map(|entry| &entry.loader)
    }
}

/// Kind fields of a UTF-8 text asset. The normalized text is the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAsset {
    pub bytes: usize,
    pub lines: usize,
}

impl Asset for TextAsset {
    fn type_name() -> &'static str {
        "Text"
    }
}

impl LoadedAsset<TextAsset> {
    /// The normalized text.
    pub fn text(&self) -> &str {
        std::str::from_utf8(self.binary()).unwrap_or_default()
    }
}

/// Loads UTF-8 text, normalizing line endings to `\n`.
pub struct TextLoader;

impl AssetLoader for TextLoader {
    type Asset = TextAsset;

    fn extensions(&self) -> &[&str] {
        &["txt", "text", "md", "markdown"]
    }

    fn binarize(&self, ctx: LoadContext<'_>) -> AssetResult<Binarized<TextAsset>> {
        let text = std::str::from_utf8(ctx.bytes)
            .map_err(|e| ctx.error(format!("Invalid UTF-8: {}", e)))?;
        let normalized = text.replace("\r\n", "\n");
        let asset = TextAsset {
            bytes: normalized.len(),
            lines: normalized.lines().count(),
        };
        Ok(Binarized::new(normalized.into_bytes(), asset))
    }

    fn encode_source(&self, asset: &LoadedAsset<TextAsset>) -> Option<AssetResult<Vec<u8>>> {
        Some(Ok(asset.binary().to_vec()))
    }
}

/// Kind fields of an opaque byte blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBytes {
    pub len: usize,
}

impl Asset for RawBytes {
    fn type_name() -> &'static str {
        "RawBytes"
    }
}

/// Passes bytes through unchanged.
pub struct BytesLoader;

impl AssetLoader for BytesLoader {
    type Asset = RawBytes;

    fn extensions(&self) -> &[&str] {
        &["bytes", "dat"]
    }

    fn binarize(&self, ctx: LoadContext<'_>) -> AssetResult<Binarized<RawBytes>> {
        Ok(Binarized::new(
            ctx.bytes.to_vec(),
            RawBytes {
                len: ctx.bytes.len(),
            },
        ))
    }

    fn encode_source(&self, asset: &LoadedAsset<RawBytes>) -> Option<AssetResult<Vec<u8>>> {
        Some(Ok(asset.binary().to_vec()))
    }
}
