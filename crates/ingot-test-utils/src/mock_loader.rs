//! Instrumented loader for observing rebuilds.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ingot_assets::{
    Asset, AssetLoader, AssetResult, Binarized, DEFAULT_LOADER_PRIORITY, LoadContext,
    LoadedAsset,
};
use serde::{Deserialize, Serialize};

/// Sources starting with this prefix make [`MockLoader`] fail.
pub const FAIL_MARKER: &[u8] = b"FAIL";

/// Kind fields produced by [`MockLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockAsset {
    pub len: usize,
    pub checksum: u32,
}

impl Asset for MockAsset {
    fn type_name() -> &'static str {
        "Mock"
    }
}

/// Shared view of how many times a loader binarized something.
#[derive(Debug, Clone, Default)]
pub struct BinarizeCounter(Arc<AtomicUsize>);

impl BinarizeCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Loader for `.mock` files that counts binarize calls.
///
/// The payload is the source bytes reversed, so tests can tell a binary
/// apart from its source. Sources starting with [`FAIL_MARKER`] fail to
/// binarize.
pub struct MockLoader {
    counter: BinarizeCounter,
    extensions: Vec<&'static str>,
    priority: i32,
}

impl MockLoader {
    pub fn new() -> Self {
        Self {
            counter: BinarizeCounter::default(),
            extensions: vec!["mock"],
            priority: DEFAULT_LOADER_PRIORITY,
        }
    }

    /// Handle to this loader's binarize counter.
    pub fn counter(&self) -> BinarizeCounter {
        self.counter.clone()
    }

    /// Claim additional extensions.
    pub fn with_extensions(mut self, extensions: &[&'static str]) -> Self {
        self.extensions.extend_from_slice(extensions);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for MockLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader for MockLoader {
    type Asset = MockAsset;

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn binarize(&self, ctx: LoadContext<'_>) -> AssetResult<Binarized<MockAsset>> {
        self.counter.bump();
        if ctx.bytes.starts_with(FAIL_MARKER) {
            return Err(ctx.error("source is marked as failing"));
        }

        let checksum = ctx
            .bytes
            .iter()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(*b)));
        let binary: Vec<u8> = ctx.bytes.iter().rev().copied().collect();
        Ok(Binarized::new(
            binary,
            MockAsset {
                len: ctx.bytes.len(),
                checksum,
            },
        ))
    }

    fn encode_source(&self, asset: &LoadedAsset<MockAsset>) -> Option<AssetResult<Vec<u8>>> {
        Some(Ok(asset.binary().iter().rev().copied().collect()))
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
