//! File system wrapper that records operations for verification.

use std::path::Path;

use ingot_assets::{AssetFileSystem, AssetResult, DiskFileSystem};
use parking_lot::Mutex;

/// Records a file-system call made through [`RecordingFileSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    Read { path: String },
    Write { path: String, len: usize },
    CreateDir { path: String },
    Remove { path: String },
    Rename { from: String, to: String },
    ReadDir { path: String },
}

/// [`AssetFileSystem`] that forwards to disk and records every mutating or
/// reading call. Existence checks are not recorded.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use ingot_assets::AssetManager;
/// use ingot_test_utils::{RecordingFileSystem, TestStore};
///
/// let store = TestStore::new();
/// let fs = Arc::new(RecordingFileSystem::new(store.asset_root()));
/// let manager = AssetManager::with_file_system(store.config(), fs.clone());
///
/// assert!(manager.create_folder("Textures"));
/// assert_eq!(fs.count_create_dirs(), 1);
/// ```
pub struct RecordingFileSystem {
    inner: DiskFileSystem,
    calls: Mutex<Vec<FsCall>>,
}

impl RecordingFileSystem {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            inner: DiskFileSystem::new(root),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<FsCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn count_renames(&self) -> usize {
        self.count(|c| matches!(c, FsCall::Rename { .. }))
    }

    pub fn count_removes(&self) -> usize {
        self.count(|c| matches!(c, FsCall::Remove { .. }))
    }

    pub fn count_create_dirs(&self) -> usize {
        self.count(|c| matches!(c, FsCall::CreateDir { .. }))
    }

    pub fn count_writes(&self) -> usize {
        self.count(|c| matches!(c, FsCall::Write { .. }))
    }

    fn count(&self, pred: impl Fn(&FsCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: FsCall) {
        self.calls.lock().push(call);
    }
}

impl AssetFileSystem for RecordingFileSystem {
    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        self.inner.is_dir(path)
    }

    fn read_dir(&self, path: &str) -> AssetResult<Vec<String>> {
        self.record(FsCall::ReadDir {
            path: path.to_string(),
        });
        self.inner.read_dir(path)
    }

    fn read(&self, path: &str) -> AssetResult<Vec<u8>> {
        self.record(FsCall::Read {
            path: path.to_string(),
        });
        self.inner.read(path)
    }

    fn write(&self, path: &str, bytes: &[u8]) -> AssetResult<()> {
        self.record(FsCall::Write {
            path: path.to_string(),
            len: bytes.len(),
        });
        self.inner.write(path, bytes)
    }

    fn create_dir(&self, path: &str) -> AssetResult<()> {
        self.record(FsCall::CreateDir {
            path: path.to_string(),
        });
        self.inner.create_dir(path)
    }

    fn remove(&self, path: &str) -> AssetResult<bool> {
        self.record(FsCall::Remove {
            path: path.to_string(),
        });
        self.inner.remove(path)
    }

    fn rename(&self, from: &str, to: &str) -> AssetResult<()> {
        self.record(FsCall::Rename {
            from: from.to_string(),
            to: to.to_string(),
        });
        self.inner.rename(from, to)
    }
}
