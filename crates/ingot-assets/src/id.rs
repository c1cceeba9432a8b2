//! Stable 128-bit asset identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A stable identifier naming one asset across its lifetime, independent of
/// its current path.
///
/// Disk assets receive a random identity on first import which is then
/// persisted in the meta document. Embedded assets derive theirs from the
/// owning module and resource name, so no persisted state is needed.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct AssetId(u128);

impl AssetId {
    /// The nil identity. References holding it are invalid.
    pub const NIL: AssetId = AssetId(0);

    /// Mint a fresh random identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    /// Create an identity from a raw value.
    pub const fn from_u128(raw: u128) -> Self {
        Self(raw)
    }

    /// Deterministic identity of an embedded resource: the leading 128 bits
    /// of SHA-256 over `"<module>|<resource>"`.
    pub fn for_embedded(module: &str, resource: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(module.as_bytes());
        hasher.update(b"|");
        hasher.update(resource.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(u128::from_be_bytes(bytes))
    }

    /// Get the raw value.
    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    /// Returns `true` for [`AssetId::NIL`].
    pub const fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", Uuid::from_u128(self.0).hyphenated())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from_u128(self.0).hyphenated())
    }
}

impl FromStr for AssetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(|uuid| Self(uuid.as_u128()))
    }
}

impl Serialize for AssetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
