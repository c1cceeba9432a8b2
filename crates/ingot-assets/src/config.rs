//! Configuration for an asset store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AssetError, AssetResult};

/// Settings fixed when an [`AssetManager`](crate::AssetManager) is created.
///
/// Can be built in code or read from a TOML file:
///
/// ```toml
/// asset_root = "assets"
/// bin_root = "target/asset-cache"
/// meta_suffix = ".meta"
/// bin_suffix = ".bin"
/// flush_interval_ms = 250
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetStoreConfig {
    /// Root of the human-edited source tree. Meta documents live beside
    /// their sources under this root.
    pub asset_root: PathBuf,
    /// Root for binary payloads. Defaults to `asset_root`.
    pub bin_root: Option<PathBuf>,
    /// Suffix appended to a source path to name its meta document.
    pub meta_suffix: String,
    /// Suffix appended to a source path to name its binary payload.
    pub bin_suffix: String,
    /// How long the watcher coalesces changes before flushing a batch.
    pub flush_interval_ms: u64,
}

impl Default for AssetStoreConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            bin_root: None,
            meta_suffix: ".meta".to_string(),
            bin_suffix: ".bin".to_string(),
            flush_interval_ms: 250,
        }
    }
}

impl AssetStoreConfig {
    /// Create a config for the given asset root with default settings.
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Default::default()
        }
    }

    /// Store binary payloads under a separate root.
    pub fn with_bin_root(mut self, bin_root: impl Into<PathBuf>) -> Self {
        self.bin_root = Some(bin_root.into());
        self
    }

    /// Override the meta and binary suffixes.
    pub fn with_suffixes(mut self, meta: impl Into<String>, bin: impl Into<String>) -> Self {
        self.meta_suffix = meta.into();
        self.bin_suffix = bin.into();
        self
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> AssetResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| AssetError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. Relative roots are resolved against the directory
    /// containing the file.
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        let mut config = Self::from_toml_str(&text)?;

        if let Some(base) = path.parent() {
            if config.asset_root.is_relative() {
                config.asset_root = base.join(&config.asset_root);
            }
            if let Some(bin_root) = config.bin_root.as_mut()
                && bin_root.is_relative()
            {
                *bin_root = base.join(&*bin_root);
            }
        }

        tracing::debug!("Loaded asset store config from {}", path.display());
        Ok(config)
    }

    /// Root for binary payloads.
    pub fn bin_root(&self) -> &Path {
        self.bin_root.as_deref().unwrap_or(&self.asset_root)
    }

    /// Flush interval as a [`Duration`].
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    fn validate(&self) -> AssetResult<()> {
        if self.meta_suffix.is_empty() || self.bin_suffix.is_empty() {
            return Err(AssetError::Config {
                message: "meta_suffix and bin_suffix must not be empty".to_string(),
            });
        }
        if self.meta_suffix.eq_ignore_ascii_case(&self.bin_suffix) {
            return Err(AssetError::Config {
                message: format!(
                    "meta_suffix and bin_suffix must differ (both '{}')",
                    self.meta_suffix
                ),
            });
        }
        Ok(())
    }
}

/// Resolved on-disk locations for a store, derived from [`AssetStoreConfig`].
#[derive(Debug, Clone)]
pub struct StoreLayout {
    asset_root: PathBuf,
    bin_root: PathBuf,
    meta_suffix: String,
    bin_suffix: String,
}

impl StoreLayout {
    /// Resolve the layout for a config.
    pub fn new(config: &AssetStoreConfig) -> Self {
        Self {
            asset_root: config.asset_root.clone(),
            bin_root: config.bin_root().to_path_buf(),
            meta_suffix: config.meta_suffix.clone(),
            bin_suffix: config.bin_suffix.clone(),
        }
    }

    /// Root of the source tree.
    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Root of the binary payloads.
    pub fn bin_root(&self) -> &Path {
        &self.bin_root
    }

    /// Returns `true` when binaries share the source tree.
    pub fn shared_roots(&self) -> bool {
        self.asset_root == self.bin_root
    }

    /// Absolute location of a source file.
    pub fn source_path(&self, rel: &str) -> PathBuf {
        self.asset_root.join(rel)
    }

    /// Relative path of a source's meta document.
    pub fn meta_rel(&self, rel: &str) -> String {
        format!("{}{}", rel, self.meta_suffix)
    }

    /// Absolute location of a source's meta document.
    pub fn meta_path(&self, rel: &str) -> PathBuf {
        self.asset_root.join(self.meta_rel(rel))
    }

    /// Relative path of a source's binary payload under the bin root.
    pub fn bin_rel(&self, rel: &str) -> String {
        format!("{}{}", rel, self.bin_suffix)
    }

    /// Absolute location of a source's binary payload.
    pub fn bin_path(&self, rel: &str) -> PathBuf {
        self.bin_root.join(self.bin_rel(rel))
    }

    /// Returns `true` if `rel` names a meta document or binary payload rather
    /// than a source file.
    pub fn is_sidecar(&self, rel: &str) -> bool {
        let lower = rel.to_lowercase();
        lower.ends_with(&self.meta_suffix.to_lowercase())
            || lower.ends_with(&self.bin_suffix.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssetStoreConfig::default();
        assert_eq!(config.meta_suffix, ".meta");
        assert_eq!(config.bin_suffix, ".bin");
        assert_eq!(config.bin_root(), Path::new("assets"));
        assert_eq!(config.flush_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_from_toml() {
        let config = AssetStoreConfig::from_toml_str(
            r#"
asset_root = "content"
bin_root = "cache"
flush_interval_ms = 50
"#,
        )
        .unwrap();
        assert_eq!(config.asset_root, PathBuf::from("content"));
        assert_eq!(config.bin_root(), Path::new("cache"));
        assert_eq!(config.meta_suffix, ".meta");
        assert_eq!(config.flush_interval_ms, 50);
    }

    #[test]
    fn test_from_toml_rejects_unknown_and_clashing() {
        assert!(AssetStoreConfig::from_toml_str("asset_rot = \"x\"").is_err());
        assert!(
            AssetStoreConfig::from_toml_str("meta_suffix = \".x\"\nbin_suffix = \".X\"").is_err()
        );
    }

    #[test]
    fn test_load_resolves_relative_roots() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("assets.toml");
        std::fs::write(&file, "asset_root = \"content\"\nbin_root = \"/abs/cache\"\n").unwrap();

        let config = AssetStoreConfig::load(&file).unwrap();
        assert_eq!(config.asset_root, dir.path().join("content"));
        assert_eq!(config.bin_root(), Path::new("/abs/cache"));
    }

    #[test]
    fn test_layout_paths() {
        let config = AssetStoreConfig::new("/game/assets").with_bin_root("/game/cache");
        let layout = StoreLayout::new(&config);
        assert_eq!(
            layout.meta_path("Textures/rock.png"),
            PathBuf::from("/game/assets/Textures/rock.png.meta")
        );
        assert_eq!(
            layout.bin_path("Textures/rock.png"),
            PathBuf::from("/game/cache/Textures/rock.png.bin")
        );
        assert!(!layout.shared_roots());
        assert!(layout.is_sidecar("Textures/rock.png.meta"));
        assert!(layout.is_sidecar("Textures/rock.png.BIN"));
        assert!(!layout.is_sidecar("Textures/rock.png"));
    }
}
