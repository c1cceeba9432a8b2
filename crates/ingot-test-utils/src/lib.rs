//! Test utilities for the Ingot asset pipeline.
//!
//! This crate provides throwaway asset stores and instrumented loaders so
//! tests can observe what the pipeline does on disk.
//!
//! # Overview
//!
//! The main components are:
//!
//! - [`TestStore`] - Temporary asset root (and optional bin root) with
//!   helpers for writing sources and inspecting sidecars
//! - [`MockLoader`] - Loader that counts binarize calls and fails on demand
//! - `RecordingFileSystem` - File system wrapper recording every call
//!   (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! use ingot_assets::AssetManager;
//! use ingot_test_utils::{MockAsset, MockLoader, TestStore};
//!
//! let store = TestStore::new();
//! store.write_source("Textures/rock.mock", b"granite");
//!
//! let loader = MockLoader::new();
//! let counter = loader.counter();
//!
//! let mut manager = AssetManager::new(store.config());
//! manager.register_loader(loader);
//!
//! assert!(manager.load::<MockAsset>("Textures/rock.mock"));
//! assert!(manager.load::<MockAsset>("Textures/rock.mock"));
//!
//! // The second load hit the cached binary
//! assert_eq!(counter.get(), 1);
//! assert!(store.has_meta("Textures/rock.mock"));
//! ```
//!
//! # Design Philosophy
//!
//! ## 1. Real Files
//!
//! Stores live in temporary directories instead of an in-memory fake, so the
//! pipeline runs the same code paths it runs in production.
//!
//! ## 2. Shared Counters
//!
//! Loaders are moved into the manager on registration. Counters are handed
//! out as cloned `Arc` handles so tests keep observing them afterwards.

pub mod mock_loader;
#[cfg(feature = "mock")]
pub mod recording_fs;
pub mod store;

// Re-export main types at crate root
pub use mock_loader::*;
#[cfg(feature = "mock")]
pub use recording_fs::*;
pub use store::*;
