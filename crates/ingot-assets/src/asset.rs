//! Asset values and their type-erased storage form.

use std::any::{Any, TypeId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::id::AssetId;

/// Kind-specific fields of an asset.
///
/// The fields are persisted in the meta document, so they must round-trip
/// through serde. Bulk runtime data belongs in the binary payload instead.
pub trait Asset: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human-readable name of the asset kind, used in logs and meta documents.
    fn type_name() -> &'static str;
}

/// Identity and provenance shared by every asset kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHeader {
    /// Stable identity.
    pub id: AssetId,
    /// Normalized source path, empty for embedded and virtual assets.
    pub source_path: String,
    /// Digest of the source bytes at the last import or rebuild.
    pub source_hash: ContentHash,
}

/// An imported asset: header, binary payload and decoded kind fields.
///
/// Rebuilding produces a new `LoadedAsset` carrying the same [`AssetId`];
/// existing values are never mutated in place.
pub struct LoadedAsset<T> {
    header: AssetHeader,
    binary: Arc<[u8]>,
    value: Arc<T>,
}

impl<T: Asset> LoadedAsset<T> {
    /// Assemble a loaded asset.
    pub fn new(header: AssetHeader, binary: impl Into<Arc<[u8]>>, value: T) -> Self {
        Self {
            header,
            binary: binary.into(),
            value: Arc::new(value),
        }
    }

    /// The asset header.
    pub fn header(&self) -> &AssetHeader {
        &self.header
    }

    /// The asset identity.
    pub fn id(&self) -> AssetId {
        self.header.id
    }

    /// The normalized source path, empty for embedded assets.
    pub fn source_path(&self) -> &str {
        &self.header.source_path
    }

    /// Digest of the source bytes this asset was built from.
    pub fn source_hash(&self) -> ContentHash {
        self.header.source_hash
    }

    /// The binary payload produced by binarize.
    pub fn binary(&self) -> &[u8] {
        &self.binary
    }

    /// Shared handle to the binary payload.
    pub fn binary_arc(&self) -> Arc<[u8]> {
        Arc::clone(&self.binary)
    }

    /// The decoded kind fields.
    pub fn value(&self) -> &Arc<T> {
        &self.value
    }
}

impl<T> Clone for LoadedAsset<T> {
    fn clone(&self) -> Self {
        Self {
            header: self.header.clone(),
            binary: Arc::clone(&self.binary),
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Deref for LoadedAsset<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: Asset> fmt::Debug for LoadedAsset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedAsset")
            .field("type", &T::type_name())
            .field("id", &self.header.id)
            .field("source_path", &self.header.source_path)
            .field("source_hash", &self.header.source_hash)
            .field("binary_len", &self.binary.len())
            .finish()
    }
}

/// Type-erased asset as held in the manager's caches.
#[derive(Clone)]
pub(crate) struct StoredAsset {
    pub(crate) header: AssetHeader,
    pub(crate) binary: Arc<[u8]>,
    pub(crate) value: Arc<dyn Any + Send + Sync>,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

impl StoredAsset {
    pub(crate) fn erase<T: Asset>(asset: LoadedAsset<T>) -> Self {
        Self {
            header: asset.header,
            binary: asset.binary,
            value: asset.value,
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
        }
    }

    /// Recover the typed asset. Fails with the stored type name on mismatch.
    pub(crate) fn downcast<T: Asset>(&self) -> Result<LoadedAsset<T>, &'static str> {
        let value = Arc::clone(&self.value)
            .downcast::<T>()
            .map_err(|_| self.type_name)?;
        Ok(LoadedAsset {
            header: self.header.clone(),
            binary: Arc::clone(&self.binary),
            value,
        })
    }

    pub(crate) fn id(&self) -> AssetId {
        self.header.id
    }
}

impl fmt::Debug for StoredAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredAsset")
            .field("type", &self.type_name)
            .field("id", &self.header.id)
            .field("source_path", &self.header.source_path)
            .finish()
    }
}
