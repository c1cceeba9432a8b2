//! Collection types used across Ingot.
//!
//! Registries are keyed by short strings and 128-bit identities and use
//! AHash throughout.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

/// Build an empty [`HashMap`] with room for `capacity` entries.
pub fn map_with_capacity<K, V>(capacity: usize) -> HashMap<K, V> {
    HashMap::with_capacity(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_string_keys() {
        let mut map: HashMap<String, u128> = map_with_capacity(4);
        map.insert("Textures/rock.png".to_string(), 7);
        assert_eq!(map.get("Textures/rock.png"), Some(&7));
        assert!(map.capacity() >= 4);
    }

    #[test]
    fn test_hashset_dedup() {
        let mut set = HashSet::new();
        assert!(set.insert(42u128));
        assert!(!set.insert(42u128));
        assert_eq!(set.len(), 1);
    }
}
