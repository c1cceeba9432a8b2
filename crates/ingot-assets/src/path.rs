//! Relative asset path handling.
//!
//! Every registry key is a normalized relative path: forward slashes only, no
//! empty, `.` or `..` segments, no leading or trailing slash.

use std::path::{Component, Path};

use crate::error::{AssetError, AssetResult};

/// Normalize a user supplied relative path into registry form.
///
/// Backslashes become forward slashes and `.` segments are dropped. `..` may
/// only cancel a preceding segment; escaping the root is an error, as is a
/// path that normalizes to nothing.
pub fn normalize(path: &str) -> AssetResult<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(AssetError::InvalidPath {
                        path: path.to_string(),
                    });
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(AssetError::InvalidPath {
            path: path.to_string(),
        });
    }

    Ok(segments.join("/"))
}

/// Lowercase extension of the last path segment, without the dot.
pub fn extension(path: &str) -> Option<String> {
    Path::new(file_name(path))
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Last segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent directory of a normalized path, `""` for top-level entries.
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Join a directory and a child name. An empty directory means the root.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Returns `true` if `path` is `dir` itself or lies underneath it.
pub fn is_within(path: &str, dir: &str) -> bool {
    path == dir
        || (path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/')
}

/// Rewrite `path` from under `from` to under `to`.
///
/// Returns `None` when `path` is not `from` or a descendant of it.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        Some(to.to_string())
    } else if is_within(path, from) {
        Some(format!("{}{}", to, &path[from.len()..]))
    } else {
        None
    }
}

/// Convert an absolute path into a normalized path relative to `root`.
///
/// Falls back to canonicalized forms so symlinked roots (e.g. `/tmp` on
/// macOS) still match what the OS watcher reports.
pub fn to_relative(root: &Path, absolute: &Path) -> Option<String> {
    let relative = match absolute.strip_prefix(root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => {
            let root = std::fs::canonicalize(root).ok()?;
            let absolute = canonicalize_lenient(absolute)?;
            absolute.strip_prefix(&root).ok()?.to_path_buf()
        }
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Canonicalize a path whose final segment may no longer exist (deleted or
/// renamed-away files), by canonicalizing the parent instead.
fn canonicalize_lenient(path: &Path) -> Option<std::path::PathBuf> {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return Some(canonical);
    }
    let parent = std::fs::canonicalize(path.parent()?).ok()?;
    Some(parent.join(path.file_name()?))
}
