//! The per-kind import state machine.
//!
//! `load` decides, from the meta document, the source file and the binary
//! payload, whether an asset can be served as-is, needs its binary
//! regenerated, or needs a full rebuild. Identity is minted only when no meta
//! document exists; every later rebuild carries it over.
//!
//! Nothing is written until binarize has succeeded, so a failing rebuild
//! leaves the previous meta and binary untouched.

use std::path::Path;

use crate::asset::{Asset, AssetHeader, LoadedAsset};
use crate::config::StoreLayout;
use crate::error::{AssetError, AssetResult};
use crate::hash::ContentHash;
use crate::id::AssetId;
use crate::loader::{AssetLoader, Binarized, LoadContext};
use crate::meta::{self, MetaDocument};
use crate::path;

fn read_source(path: &Path) -> AssetResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| AssetError::io(path, e))
}

fn binarize<L: AssetLoader>(
    loader: &L,
    name: &str,
    bytes: &[u8],
) -> AssetResult<Binarized<L::Asset>> {
    ingot_core::profiling::profile_scope!("binarize");
    let extension = path::extension(name);
    loader.binarize(LoadContext::new(name, bytes, extension.as_deref()))
}

/// Persist binary then meta for a freshly binarized asset.
fn persist<L: AssetLoader>(
    layout: &StoreLayout,
    rel: &str,
    header: AssetHeader,
    binarized: Binarized<L::Asset>,
) -> AssetResult<LoadedAsset<L::Asset>> {
    meta::write_file(&layout.bin_path(rel), &binarized.binary)?;
    let doc = MetaDocument::new(header, binarized.asset);
    doc.write(&layout.meta_path(rel))?;
    Ok(LoadedAsset::new(doc.asset.header, binarized.binary, doc.fields))
}

/// Delete the meta and binary at `rel` whose source has vanished.
fn remove_orphan(layout: &StoreLayout, rel: &str, recorded: &str) -> AssetResult<()> {
    let err = AssetError::InconsistentState {
        path: rel.to_string(),
        reason: format!("meta references missing source '{}'", recorded),
    };
    tracing::warn!("{}; removing orphaned meta and binary", err);
    meta::remove_file_if_exists(&layout.meta_path(rel))?;
    meta::remove_file_if_exists(&layout.bin_path(rel))?;
    Ok(())
}

/// Import the source at `rel`, reusing persisted state where it is current.
///
/// Returns `Ok(None)` when there is nothing to load at `rel`.
pub(crate) fn load<L: AssetLoader>(
    loader: &L,
    layout: &StoreLayout,
    rel: &str,
) -> AssetResult<Option<LoadedAsset<L::Asset>>> {
    ingot_core::profiling::profile_function!();

    let source_path = layout.source_path(rel);
    let source_exists = source_path.is_file();

    let Some(doc) = MetaDocument::<L::Asset>::read(&layout.meta_path(rel))? else {
        if !source_exists {
            return Ok(None);
        }
        return import_fresh(loader, layout, rel, &source_path).map(Some);
    };

    let MetaDocument { asset, fields } = doc;
    let mut header = asset.header;
    let mut rebound = false;

    if header.source_path != rel {
        let recorded_exists =
            !header.source_path.is_empty() && layout.source_path(&header.source_path).is_file();

        match (source_exists, recorded_exists) {
            (true, false) => {
                tracing::debug!(
                    "Rebinding {} from '{}' to '{}'",
                    header.id,
                    header.source_path,
                    rel
                );
                header.source_path = rel.to_string();
                rebound = true;
            }
            (true, true) => {
                // The sidecar was copied along with its source. The original
                // keeps the identity; the copy becomes a new asset.
                tracing::warn!(
                    "Meta for '{}' duplicates '{}', importing as a new asset",
                    rel,
                    header.source_path
                );
                return import_fresh(loader, layout, rel, &source_path).map(Some);
            }
            (false, true) => {
                tracing::debug!(
                    "Meta at '{}' belongs to '{}', which still exists",
                    rel,
                    header.source_path
                );
                return Ok(None);
            }
            (false, false) => {
                remove_orphan(layout, rel, &header.source_path)?;
                return Ok(None);
            }
        }
    } else if !source_exists {
        remove_orphan(layout, rel, rel)?;
        return Ok(None);
    }

    let bytes = read_source(&source_path)?;
    let hash = ContentHash::from_bytes(&bytes);

    if hash != header.source_hash {
        tracing::debug!(
            "Source hash changed for '{}' ({} -> {}), rebuilding",
            rel,
            header.source_hash,
            hash
        );
        let binarized = binarize(loader, rel, &bytes)?;
        header.source_hash = hash;
        return persist::<L>(layout, rel, header, binarized).map(Some);
    }

    let bin_path = layout.bin_path(rel);
    let binary = match meta::read_binary(&bin_path)? {
        Some(binary) => {
            tracing::trace!("Serving '{}' from persisted binary", rel);
            binary
        }
        None => {
            tracing::debug!("Binary missing for '{}', regenerating", rel);
            let binarized = binarize(loader, rel, &bytes)?;
            meta::write_file(&bin_path, &binarized.binary)?;
            binarized.binary
        }
    };

    let doc = MetaDocument::new(header, fields);
    if rebound {
        doc.write(&layout.meta_path(rel))?;
    }

    Ok(Some(LoadedAsset::new(doc.asset.header, binary, doc.fields)))
}

fn import_fresh<L: AssetLoader>(
    loader: &L,
    layout: &StoreLayout,
    rel: &str,
    source_path: &Path,
) -> AssetResult<LoadedAsset<L::Asset>> {
    let bytes = read_source(source_path)?;
    let binarized = binarize(loader, rel, &bytes)?;
    let header = AssetHeader {
        id: AssetId::new(),
        source_path: rel.to_string(),
        source_hash: ContentHash::from_bytes(&bytes),
    };
    tracing::info!(
        "Imported '{}' as {} ({})",
        rel,
        header.id,
        <L::Asset as Asset>::type_name()
    );
    persist::<L>(layout, rel, header, binarized)
}

/// Binarize in-memory bytes. Nothing is persisted and the source path is
/// left empty.
pub(crate) fn load_raw<L: AssetLoader>(
    loader: &L,
    name: &str,
    id: AssetId,
    bytes: &[u8],
) -> AssetResult<LoadedAsset<L::Asset>> {
    ingot_core::profiling::profile_function!();
    let binarized = binarize(loader, name, bytes)?;
    let header = AssetHeader {
        id,
        source_path: String::new(),
        source_hash: ContentHash::from_bytes(bytes),
    };
    Ok(LoadedAsset::new(header, binarized.binary, binarized.asset))
}

/// Write an asset's encoded source bytes to `rel`.
pub(crate) fn save_source<L: AssetLoader>(
    loader: &L,
    layout: &StoreLayout,
    rel: &str,
    asset: &LoadedAsset<L::Asset>,
) -> AssetResult<()> {
    let bytes = loader
        .encode_source(asset)
        .ok_or_else(|| AssetError::Unsupported {
            type_name: <L::Asset as Asset>::type_name(),
            operation: "save",
        })??;
    meta::write_file(&layout.source_path(rel), &bytes)?;
    tracing::debug!("Wrote {} bytes of source to '{}'", bytes.len(), rel);
    Ok(())
}
