//! Temporary asset stores.

use std::path::{Path, PathBuf};

use ingot_assets::AssetStoreConfig;
use tempfile::TempDir;

/// An asset root in a temporary directory, removed on drop.
///
/// Paths passed to the helpers are root-relative with `/` separators, the
/// same form the manager uses.
///
/// # Example
///
/// ```rust
/// use ingot_test_utils::TestStore;
///
/// let store = TestStore::with_separate_bin_root();
/// store.write_source("Docs/readme.txt", b"hello");
///
/// assert!(store.source_exists("Docs/readme.txt"));
/// assert!(!store.has_bin("Docs/readme.txt"));
/// assert_ne!(store.asset_root(), store.bin_root());
/// ```
pub struct TestStore {
    assets: TempDir,
    bins: Option<TempDir>,
    meta_suffix: String,
    bin_suffix: String,
}

impl TestStore {
    /// Create a store whose binaries live beside their sources.
    pub fn new() -> Self {
        Self {
            assets: temp_dir(),
            bins: None,
            meta_suffix: ".meta".to_string(),
            bin_suffix: ".bin".to_string(),
        }
    }

    /// Create a store with binaries under their own temporary root.
    pub fn with_separate_bin_root() -> Self {
        Self {
            bins: Some(temp_dir()),
            ..Self::new()
        }
    }

    /// Use custom sidecar suffixes.
    pub fn with_suffixes(mut self, meta: &str, bin: &str) -> Self {
        self.meta_suffix = meta.to_string();
        self.bin_suffix = bin.to_string();
        self
    }

    /// Config pointing a manager at this store.
    pub fn config(&self) -> AssetStoreConfig {
        let config = AssetStoreConfig::new(self.asset_root())
            .with_suffixes(self.meta_suffix.clone(), self.bin_suffix.clone());
        match &self.bins {
            Some(bins) => config.with_bin_root(bins.path()),
            None => config,
        }
    }

    pub fn asset_root(&self) -> &Path {
        self.assets.path()
    }

    pub fn bin_root(&self) -> &Path {
        self.bins.as_ref().map_or(self.assets.path(), |b| b.path())
    }

    /// Absolute path of a source.
    pub fn source_path(&self, rel: &str) -> PathBuf {
        self.asset_root().join(rel)
    }

    /// Absolute path of a source's meta document.
    pub fn meta_path(&self, rel: &str) -> PathBuf {
        self.asset_root().join(format!("{}{}", rel, self.meta_suffix))
    }

    /// Absolute path of a source's binary payload.
    pub fn bin_path(&self, rel: &str) -> PathBuf {
        self.bin_root().join(format!("{}{}", rel, self.bin_suffix))
    }

    /// Write a source file, creating parent directories.
    pub fn write_source(&self, rel: &str, bytes: &[u8]) {
        write_file(&self.source_path(rel), bytes);
    }

    /// Overwrite a meta document with raw text.
    pub fn write_meta(&self, rel: &str, text: &str) {
        write_file(&self.meta_path(rel), text.as_bytes());
    }

    pub fn read_source(&self, rel: &str) -> Vec<u8> {
        read_file(&self.source_path(rel))
    }

    pub fn read_meta(&self, rel: &str) -> String {
        String::from_utf8_lossy(&read_file(&self.meta_path(rel))).into_owned()
    }

    pub fn read_bin(&self, rel: &str) -> Vec<u8> {
        read_file(&self.bin_path(rel))
    }

    /// Delete a source file, leaving its sidecars behind.
    pub fn remove_source(&self, rel: &str) {
        let path = self.source_path(rel);
        std::fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("failed to remove {}: {}", path.display(), e));
    }

    pub fn remove_bin(&self, rel: &str) {
        let path = self.bin_path(rel);
        std::fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("failed to remove {}: {}", path.display(), e));
    }

    /// Rename a source file behind the manager's back.
    pub fn rename_source(&self, from: &str, to: &str) {
        let (from, to) = (self.source_path(from), self.source_path(to));
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        std::fs::rename(&from, &to)
            .unwrap_or_else(|e| panic!("failed to rename {}: {}", from.display(), e));
    }

    /// Copy a source together with its meta document, as a user duplicating
    /// a file in an explorer would.
    pub fn copy_with_meta(&self, from: &str, to: &str) {
        write_file(&self.source_path(to), &read_file(&self.source_path(from)));
        write_file(&self.meta_path(to), &read_file(&self.meta_path(from)));
    }

    pub fn source_exists(&self, rel: &str) -> bool {
        self.source_path(rel).exists()
    }

    pub fn has_meta(&self, rel: &str) -> bool {
        self.meta_path(rel).exists()
    }

    pub fn has_bin(&self, rel: &str) -> bool {
        self.bin_path(rel).exists()
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

fn temp_dir() -> TempDir {
    tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {}", e))
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("failed to create {}: {}", parent.display(), e));
    }
    std::fs::write(path, bytes)
        .unwrap_or_else(|e| panic!("failed to write {}: {}", path.display(), e));
}

fn read_file(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}
