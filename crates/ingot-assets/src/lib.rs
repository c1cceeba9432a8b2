//! Ingot asset pipeline.
//!
//! Turns a human-edited source tree into a persisted, runtime-loadable asset
//! store keyed by stable identity:
//!
//! - **Import**: every source gets a TOML meta document beside it and a
//!   binary payload under the bin root. Identity is minted once and survives
//!   rebuilds and renames.
//! - **Dirty detection**: a rebuild happens only when the SHA-256 of the
//!   source differs from the hash recorded in the meta document.
//! - **Embedded assets**: build-baked resources with identities derived from
//!   module and resource name.
//! - **Synchronization**: batched file-system changes are reconciled into the
//!   registries, optionally driven by a `notify` watcher (`hot-reload`).
//!
//! # Quick Start
//!
//! ```no_run
//! use ingot_assets::prelude::*;
//!
//! let mut manager = AssetManager::new(AssetStoreConfig::new("assets"));
//! manager.register_loader(TextLoader);
//!
//! if manager.load::<TextAsset>("Docs/readme.md") {
//!     let readme = manager.get::<TextAsset>("Docs/readme.md");
//!     if let Some(text) = readme.resolve(&manager) {
//!         println!("{} lines", text.lines);
//!     }
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `hot-reload` (default): [`AssetWatcher`] and [`WatchThread`].
//! - `profiling`: puffin scopes through `ingot-core`.

pub mod asset;
pub mod change;
pub mod config;
pub mod embedded;
pub mod error;
pub mod event;
pub mod fs;
pub mod handle;
pub mod hash;
pub mod id;
mod import;
pub mod loader;
pub mod manager;
pub mod meta;
pub mod path;
mod suppress;

#[cfg(feature = "hot-reload")]
pub mod hot_reload;

pub use asset::{Asset, AssetHeader, LoadedAsset};
pub use change::{AssetDirectoryChange, ChangeBatch, ChangeCoalescer, ChangeKind};
pub use config::{AssetStoreConfig, StoreLayout};
pub use embedded::{EmbeddedManifest, EmbeddedModule, EmbeddedResource};
pub use error::{AssetError, AssetResult};
pub use event::{AssetEvent, AssetEventBuffer};
pub use fs::{AssetFileSystem, DiskFileSystem};
pub use handle::AssetRef;
pub use hash::ContentHash;
pub use id::AssetId;
pub use loader::{
    AssetLoader, Binarized, BytesLoader, DEFAULT_LOADER_PRIORITY, LoadContext, RawBytes,
    TextAsset, TextLoader,
};
pub use manager::AssetManager;
pub use meta::{MetaDocument, MetaSection};

#[cfg(feature = "hot-reload")]
pub use hot_reload::{AssetWatcher, WatchThread};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Asset, AssetDirectoryChange, AssetError, AssetEvent, AssetId, AssetLoader, AssetManager,
        AssetRef, AssetResult, AssetStoreConfig, Binarized, BytesLoader, ChangeBatch, ChangeKind,
        EmbeddedModule, LoadContext, LoadedAsset, RawBytes, TextAsset, TextLoader,
    };

    #[cfg(feature = "hot-reload")]
    pub use crate::{AssetWatcher, WatchThread};
}
