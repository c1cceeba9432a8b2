//! Asset events for change detection.

use std::any::TypeId;

use crate::id::AssetId;

/// Events emitted by the asset manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// An asset was imported or registered for the first time.
    Created {
        id: AssetId,
        type_id: TypeId,
        /// Source path, empty for embedded assets.
        path: String,
    },

    /// An already registered asset was reloaded or rebuilt.
    Modified {
        id: AssetId,
        type_id: TypeId,
        path: String,
    },

    /// An asset was dropped from the registry.
    Removed {
        id: AssetId,
        type_id: TypeId,
        path: String,
    },

    /// An asset moved to a new path, keeping its identity.
    Renamed {
        id: AssetId,
        type_id: TypeId,
        old_path: String,
        path: String,
    },

    /// Loading an asset failed.
    LoadFailed {
        /// Requested path or embedded resource name.
        path: String,
        /// Error message.
        error: String,
    },
}

impl AssetEvent {
    /// Identity of the asset, unavailable for failed loads.
    pub fn id(&self) -> Option<AssetId> {
        match self {
            AssetEvent::Created { id, .. }
            | AssetEvent::Modified { id, .. }
            | AssetEvent::Removed { id, .. }
            | AssetEvent::Renamed { id, .. } => Some(*id),
            AssetEvent::LoadFailed { .. } => None,
        }
    }

    /// Type of the asset, unavailable for failed loads.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            AssetEvent::Created { type_id, .. }
            | AssetEvent::Modified { type_id, .. }
            | AssetEvent::Removed { type_id, .. }
            | AssetEvent::Renamed { type_id, .. } => Some(*type_id),
            AssetEvent::LoadFailed { .. } => None,
        }
    }

    /// The path the event refers to (the new path for renames).
    pub fn path(&self) -> &str {
        match self {
            AssetEvent::Created { path, .. }
            | AssetEvent::Modified { path, .. }
            | AssetEvent::Removed { path, .. }
            | AssetEvent::Renamed { path, .. }
            | AssetEvent::LoadFailed { path, .. } => path,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, AssetEvent::Created { .. })
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, AssetEvent::Modified { .. })
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, AssetEvent::Removed { .. })
    }

    pub fn is_renamed(&self) -> bool {
        matches!(self, AssetEvent::Renamed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AssetEvent::LoadFailed { .. })
    }
}

/// A buffer of asset events that can be drained each frame.
#[derive(Debug, Default)]
pub struct AssetEventBuffer {
    events: Vec<AssetEvent>,
}

impl AssetEventBuffer {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: AssetEvent) {
        self.events.push(event);
    }

    /// Take every buffered event, oldest first.
    pub fn take(&mut self) -> Vec<AssetEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
