//! Error types for the asset pipeline.

use std::any::TypeId;
use std::fmt;
use std::path::PathBuf;

use crate::id::AssetId;

/// Errors that can occur during asset operations.
#[derive(Debug)]
pub enum AssetError {
    /// The requested asset or source file was not found.
    NotFound {
        /// The path or identifier of the asset.
        path: String,
    },

    /// Failed to read, write or delete a file.
    IoError {
        /// The path the operation targeted.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// No loader registered for this asset type.
    NoLoader {
        /// The type ID of the asset.
        type_id: TypeId,
        /// Human-readable type name if available.
        type_name: Option<&'static str>,
    },

    /// No loader found for the given file extension.
    NoLoaderForExtension {
        /// The file extension.
        extension: String,
    },

    /// An embedded resource query matched more than one resource.
    AmbiguousResource {
        /// The name or suffix that was searched for.
        query: String,
        /// Every resource name the query matched.
        matches: Vec<String>,
    },

    /// Persisted state disagrees with the source tree.
    InconsistentState {
        /// The path being processed.
        path: String,
        /// What was inconsistent.
        reason: String,
    },

    /// The kind-specific binarize step failed.
    BinarizeFailed {
        /// The asset name or path handed to binarize.
        path: String,
        /// Description of the error.
        message: String,
    },

    /// A meta document could not be parsed or written.
    InvalidMeta {
        /// Location of the meta document.
        path: PathBuf,
        /// Description of the error.
        message: String,
    },

    /// Type mismatch when accessing an asset.
    TypeMismatch {
        /// The identity of the asset.
        id: AssetId,
        /// Expected type name.
        expected: &'static str,
        /// Type name of the stored asset.
        actual: &'static str,
    },

    /// The operation is not supported for this asset kind.
    Unsupported {
        /// Type name of the asset kind.
        type_name: &'static str,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// A path could not be used as a relative asset path.
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// The store configuration could not be read.
    Config {
        /// Description of the error.
        message: String,
    },

    /// The file watcher could not be started or failed.
    Watcher {
        /// Description of the error.
        message: String,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound { path } => {
                write!(f, "Asset not found: {}", path)
            }
            AssetError::IoError { path, source } => {
                write!(f, "IO error on '{}': {}", path.display(), source)
            }
            AssetError::NoLoader { type_name, .. } => {
                if let Some(name) = type_name {
                    write!(f, "No loader registered for asset type: {}", name)
                } else {
                    write!(f, "No loader registered for asset type")
                }
            }
            AssetError::NoLoaderForExtension { extension } => {
                write!(f, "No loader registered for extension: .{}", extension)
            }
            AssetError::AmbiguousResource { query, matches } => {
                write!(
                    f,
                    "Embedded resource '{}' is ambiguous, matches: {}",
                    query,
                    matches.join(", ")
                )
            }
            AssetError::InconsistentState { path, reason } => {
                write!(f, "Inconsistent asset state for '{}': {}", path, reason)
            }
            AssetError::BinarizeFailed { path, message } => {
                write!(f, "Failed to binarize '{}': {}", path, message)
            }
            AssetError::InvalidMeta { path, message } => {
                write!(f, "Invalid meta document '{}': {}", path.display(), message)
            }
            AssetError::TypeMismatch {
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Type mismatch for asset {}: expected {}, found {}",
                    id, expected, actual
                )
            }
            AssetError::Unsupported {
                type_name,
                operation,
            } => {
                write!(f, "Asset type {} does not support {}", type_name, operation)
            }
            AssetError::InvalidPath { path } => {
                write!(f, "Invalid asset path: '{}'", path)
            }
            AssetError::Config { message } => {
                write!(f, "Asset store configuration error: {}", message)
            }
            AssetError::Watcher { message } => {
                write!(f, "File watcher error: {}", message)
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::IoError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl AssetError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::IoError {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors that are recovered locally (logged and
    /// surfaced as `false`/`None`) rather than failing the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AssetError::NotFound { .. }
                | AssetError::AmbiguousResource { .. }
                | AssetError::InconsistentState { .. }
        )
    }
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        AssetError::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

/// Result type alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
