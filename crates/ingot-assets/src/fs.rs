//! File-system access over root-relative asset paths.

use std::path::{Path, PathBuf};

use crate::error::{AssetError, AssetResult};
use crate::path;

/// Primitive file operations used by the manager's path mutations.
///
/// All paths are normalized relative paths (see [`crate::path::normalize`]).
pub trait AssetFileSystem: Send + Sync {
    /// Absolute root every relative path resolves against.
    fn root(&self) -> &Path;

    /// Check if a file or directory exists.
    fn exists(&self, path: &str) -> bool;

    /// Check if a directory exists.
    fn is_dir(&self, path: &str) -> bool;

    /// Relative paths of a directory's direct children, sorted.
    fn read_dir(&self, path: &str) -> AssetResult<Vec<String>>;

    /// Read a whole file.
    fn read(&self, path: &str) -> AssetResult<Vec<u8>>;

    /// Write a whole file, creating parent directories.
    fn write(&self, path: &str, bytes: &[u8]) -> AssetResult<()>;

    /// Create a directory and any missing parents.
    fn create_dir(&self, path: &str) -> AssetResult<()>;

    /// Remove a file or a directory tree. Returns `false` if nothing existed.
    fn remove(&self, path: &str) -> AssetResult<bool>;

    /// Rename a file or directory. Fails if `to` already exists.
    fn rename(&self, from: &str, to: &str) -> AssetResult<()>;

    /// Move `path` into directory `dir`, keeping its name. Returns the new
    /// relative path.
    fn move_into(&self, path: &str, dir: &str) -> AssetResult<String> {
        let target = path::join(dir, path::file_name(path));
        self.rename(path, &target)?;
        Ok(target)
    }
}

/// [`AssetFileSystem`] backed by `std::fs`.
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    /// Create a file system rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl AssetFileSystem for DiskFileSystem {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).is_dir()
    }

    fn read_dir(&self, path: &str) -> AssetResult<Vec<String>> {
        let full_path = self.resolve(path);
        let entries = std::fs::read_dir(&full_path).map_err(|e| AssetError::io(&full_path, e))?;

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AssetError::io(&full_path, e))?;
            match entry.file_name().to_str() {
                Some(name) => children.push(path::join(path, name)),
                None => tracing::warn!(
                    "Skipping non UTF-8 file name in {}",
                    full_path.display()
                ),
            }
        }
        children.sort();
        Ok(children)
    }

    fn read(&self, path: &str) -> AssetResult<Vec<u8>> {
        let full_path = self.resolve(path);
        std::fs::read(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound {
                    path: path.to_string(),
                }
            } else {
                AssetError::io(&full_path, e)
            }
        })
    }

    fn write(&self, path: &str, bytes: &[u8]) -> AssetResult<()> {
        crate::meta::write_file(&self.resolve(path), bytes)
    }

    fn create_dir(&self, path: &str) -> AssetResult<()> {
        let full_path = self.resolve(path);
        std::fs::create_dir_all(&full_path).map_err(|e| AssetError::io(&full_path, e))
    }

    fn remove(&self, path: &str) -> AssetResult<bool> {
        let full_path = self.resolve(path);
        let result = if full_path.is_dir() {
            std::fs::remove_dir_all(&full_path)
        } else {
            std::fs::remove_file(&full_path)
        };
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AssetError::io(&full_path, e)),
        }
    }

    fn rename(&self, from: &str, to: &str) -> AssetResult<()> {
        let from_path = self.resolve(from);
        let to_path = self.resolve(to);

        if to_path.exists() {
            return Err(AssetError::io(
                &to_path,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "target already exists"),
            ));
        }
        if let Some(parent) = to_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }
        std::fs::rename(&from_path, &to_path).map_err(|e| AssetError::io(&from_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskFileSystem::new(dir.path());

        fs.write("a/b/c.txt", b"hello").unwrap();
        assert!(fs.exists("a/b/c.txt"));
        assert!(fs.is_dir("a/b"));
        assert_eq!(fs.read("a/b/c.txt").unwrap(), b"hello");

        assert!(fs.remove("a").unwrap());
        assert!(!fs.exists("a/b/c.txt"));
        assert!(!fs.remove("a").unwrap());
    }

    #[test]
    fn test_read_dir_lists_children() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskFileSystem::new(dir.path());
        fs.write("Sounds/b.wav", b"b").unwrap();
        fs.write("Sounds/a.wav", b"a").unwrap();
        fs.create_dir("Sounds/Loops").unwrap();

        assert_eq!(
            fs.read_dir("Sounds").unwrap(),
            vec!["Sounds/Loops", "Sounds/a.wav", "Sounds/b.wav"]
        );
        assert!(fs.read_dir("Missing").is_err());
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskFileSystem::new(dir.path());
        assert!(matches!(fs.read("nope.txt"), Err(AssetError::NotFound { .. })));
    }

    #[test]
    fn test_rename_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskFileSystem::new(dir.path());
        fs.write("a.txt", b"a").unwrap();
        fs.write("b.txt", b"b").unwrap();

        assert!(fs.rename("a.txt", "b.txt").is_err());
        assert_eq!(fs.read("b.txt").unwrap(), b"b");

        fs.rename("a.txt", "sub/c.txt").unwrap();
        assert!(!fs.exists("a.txt"));
        assert_eq!(fs.read("sub/c.txt").unwrap(), b"a");
    }

    #[test]
    fn test_move_into() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskFileSystem::new(dir.path());
        fs.write("Textures/rock.png", b"png").unwrap();
        fs.create_dir("Archive").unwrap();

        let moved = fs.move_into("Textures/rock.png", "Archive").unwrap();
        assert_eq!(moved, "Archive/rock.png");
        assert!(fs.exists("Archive/rock.png"));
        assert!(!fs.exists("Textures/rock.png"));
    }
}
