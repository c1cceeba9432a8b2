//! Build-baked resources.
//!
//! A module registers a manifest of named byte slices, typically produced with
//! `include_bytes!`. Embedded assets are never written to disk and their
//! identity depends only on the module and resource name.

use crate::error::{AssetError, AssetResult};
use crate::id::AssetId;

/// A named collection of build-baked resources.
///
/// # Example
///
/// ```
/// use ingot_assets::EmbeddedModule;
///
/// let module = EmbeddedModule::new("ingot.builtin")
///     .with_resource("shaders/blit.wgsl", b"// blit")
///     .with_resource("fonts/mono.txt", b"mono");
/// assert_eq!(module.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EmbeddedModule {
    id: String,
    resources: Vec<(String, &'static [u8])>,
}

impl EmbeddedModule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resources: Vec::new(),
        }
    }

    /// Add a resource. Backslashes in `name` are stored as forward slashes.
    pub fn with_resource(mut self, name: impl Into<String>, bytes: &'static [u8]) -> Self {
        self.add_resource(name, bytes);
        self
    }

    pub fn add_resource(&mut self, name: impl Into<String>, bytes: &'static [u8]) {
        let name = name.into().replace('\\', "/");
        self.resources.push((name, bytes));
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource names in registration order.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|(name, _)| name.as_str())
    }
}

/// A resource found by [`EmbeddedManifest::find`].
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedResource<'a> {
    pub module: &'a str,
    pub name: &'a str,
    pub bytes: &'static [u8],
}

impl EmbeddedResource<'_> {
    /// Deterministic identity of this resource.
    pub fn id(&self) -> AssetId {
        AssetId::for_embedded(self.module, self.name)
    }
}

/// All registered embedded modules.
#[derive(Debug, Default)]
pub struct EmbeddedManifest {
    modules: Vec<EmbeddedModule>,
}

impl EmbeddedManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: EmbeddedModule) {
        tracing::debug!(
            "Registered embedded module '{}' ({} resources)",
            module.id,
            module.len()
        );
        self.modules.push(module);
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    fn resources(&self) -> impl Iterator<Item = EmbeddedResource<'_>> {
        self.modules.iter().flat_map(|module| {
            module.resources.iter().map(move |(name, bytes)| EmbeddedResource {
                module: module.id.as_str(),
                name: name.as_str(),
                bytes: *bytes,
            })
        })
    }

    /// Find a resource by exact name or by unambiguous suffix, both compared
    /// case-insensitively across every module.
    ///
    /// An exact match wins over suffix matches. More than one match at the
    /// winning level is [`AssetError::AmbiguousResource`].
    pub fn find(&self, query: &str) -> AssetResult<EmbeddedResource<'_>> {
        let needle = query.replace('\\', "/").to_lowercase();
        if needle.is_empty() {
            return Err(AssetError::NotFound {
                path: query.to_string(),
            });
        }

        let exact: Vec<_> = self
            .resources()
            .filter(|res| res.name.to_lowercase() == needle)
            .collect();
        let candidates = if exact.is_empty() {
            self.resources()
                .filter(|res| res.name.to_lowercase().ends_with(&needle))
                .collect()
        } else {
            exact
        };

        match candidates.as_slice() {
            [] => Err(AssetError::NotFound {
                path: query.to_string(),
            }),
            [single] => Ok(*single),
            many => Err(AssetError::AmbiguousResource {
                query: query.to_string(),
                matches: many
                    .iter()
                    .map(|res| format!("{}:{}", res.module, res.name))
                    .collect(),
            }),
        }
    }
}
