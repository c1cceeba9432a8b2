//! Meta documents and binary payload files.
//!
//! A meta document is a TOML sidecar next to its source:
//!
//! ```toml
//! [asset]
//! id = "5f0c2a8e-3b1d-4c5e-9a7f-0e6d2c4b8a10"
//! source_path = "Textures/rock.png"
//! source_hash = "sha256:..."
//! kind = "Texture"
//!
//! [fields]
//! width = 256
//! height = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetHeader};
use crate::error::{AssetError, AssetResult};

/// The `[asset]` table of a meta document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSection {
    #[serde(flatten)]
    pub header: AssetHeader,
    /// Type name of the kind that wrote the document.
    pub kind: String,
}

/// A complete meta document for kind `T`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaDocument<T> {
    pub asset: MetaSection,
    pub fields: T,
}

impl<T: Asset> MetaDocument<T> {
    pub fn new(header: AssetHeader, fields: T) -> Self {
        Self {
            asset: MetaSection {
                header,
                kind: T::type_name().to_string(),
            },
            fields,
        }
    }

    /// Read the meta document at `path`. A missing file yields `Ok(None)`.
    pub fn read(path: &Path) -> AssetResult<Option<Self>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AssetError::io(path, e)),
        };

        let doc: Self = toml::from_str(&text).map_err(|e| AssetError::InvalidMeta {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if doc.asset.kind != T::type_name() {
            return Err(AssetError::InvalidMeta {
                path: path.to_path_buf(),
                message: format!(
                    "written for kind '{}', expected '{}'",
                    doc.asset.kind,
                    T::type_name()
                ),
            });
        }

        Ok(Some(doc))
    }

    /// Write the document, creating parent directories as needed.
    pub fn write(&self, path: &Path) -> AssetResult<()> {
        let text = toml::to_string(self).map_err(|e| AssetError::InvalidMeta {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        write_file(path, text.as_bytes())
    }
}

/// Read a binary payload. A missing file yields `Ok(None)`.
pub fn read_binary(path: &Path) -> AssetResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AssetError::io(path, e)),
    }
}

/// Write a file, creating parent directories as needed.
pub fn write_file(path: &Path, bytes: &[u8]) -> AssetResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| AssetError::io(path, e))
}

/// Delete a file, treating an already-missing file as success.
///
/// Returns `true` if something was removed.
pub fn remove_file_if_exists(path: &Path) -> AssetResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AssetError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ContentHash;
    use crate::id::AssetId;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Texture {
        width: u32,
        height: u32,
        srgb: bool,
    }

    impl Asset for Texture {
        fn type_name() -> &'static str {
            "Texture"
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Mesh {
        vertices: u32,
    }

    impl Asset for Mesh {
        fn type_name() -> &'static str {
            "Mesh"
        }
    }

    fn texture_doc() -> MetaDocument<Texture> {
        MetaDocument::new(
            AssetHeader {
                id: AssetId::new(),
                source_path: "Textures/rock.png".to_string(),
                source_hash: ContentHash::from_bytes(b"rock"),
            },
            Texture {
                width: 256,
                height: 128,
                srgb: true,
            },
        )
    }

    #[test]
    fn test_missing_meta_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let read = MetaDocument::<Texture>::read(&dir.path().join("nope.meta")).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Textures/rock.png.meta");
        let doc = texture_doc();
        doc.write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[asset]"));
        assert!(text.contains("kind = \"Texture\""));
        assert!(text.contains("[fields]"));

        let read = MetaDocument::<Texture>::read(&path).unwrap().unwrap();
        assert_eq!(read.asset, doc.asset);
        assert_eq!(read.fields, doc.fields);
    }

    #[test]
    fn test_kind_mismatch_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rock.png.meta");
        texture_doc().write(&path).unwrap();

        let err = MetaDocument::<Mesh>::read(&path).unwrap_err();
        assert!(matches!(err, AssetError::InvalidMeta { .. }));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rock.png.meta");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(
            MetaDocument::<Texture>::read(&path),
            Err(AssetError::InvalidMeta { .. })
        ));
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        write_file(&path, b"x").unwrap();
        assert!(remove_file_if_exists(&path).unwrap());
        assert!(!remove_file_if_exists(&path).unwrap());
        assert_eq!(read_binary(&path).unwrap(), None);
    }
}
