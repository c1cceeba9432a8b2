//! Typed references to assets.
//!
//! An [`AssetRef`] is just an identity plus a namespace flag. It never holds
//! the asset itself, so it stays valid across rebuilds and renames and always
//! resolves to whatever the manager currently has registered.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, LoadedAsset};
use crate::id::AssetId;
use crate::manager::AssetManager;

/// A typed reference to a disk or embedded asset.
///
/// # Example
///
/// ```ignore
/// let rock: AssetRef<Texture> = manager.get("Textures/rock.png");
///
/// // Every call is a fresh lookup, so a hot-reloaded rebuild shows up here.
/// if let Some(texture) = rock.resolve(&manager) {
///     upload(texture.binary());
/// }
/// ```
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct AssetRef<T> {
    id: AssetId,
    #[serde(default)]
    embedded: bool,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T: Asset> AssetRef<T> {
    /// Reference a disk asset by identity.
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            embedded: false,
            _marker: PhantomData,
        }
    }

    /// Reference an embedded asset by identity.
    pub fn embedded(id: AssetId) -> Self {
        Self {
            id,
            embedded: true,
            _marker: PhantomData,
        }
    }

    /// A reference that never resolves.
    pub fn invalid() -> Self {
        Self::new(AssetId::NIL)
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Returns `true` if this refers to the embedded namespace.
    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// Returns `false` for the nil identity.
    pub fn is_valid(&self) -> bool {
        !self.id.is_nil()
    }

    /// Look the asset up in `manager`.
    pub fn resolve(&self, manager: &AssetManager) -> Option<LoadedAsset<T>> {
        manager.resolve(self)
    }

    pub fn type_name(&self) -> &'static str {
        T::type_name()
    }
}

impl<T: Asset> Default for AssetRef<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<T: Asset> fmt::Debug for AssetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRef")
            .field("type", &T::type_name())
            .field("id", &self.id)
            .field("embedded", &self.embedded)
            .finish()
    }
}

impl<T> Clone for AssetRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AssetRef<T> {}

impl<T> PartialEq for AssetRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.embedded == other.embedded
    }
}

impl<T> Eq for AssetRef<T> {}

impl<T> Hash for AssetRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.embedded.hash(state);
    }
}
