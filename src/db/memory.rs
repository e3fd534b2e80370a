//! Unbounded ordered in-memory implementation of [`KeyValueStore`].

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::db::{KeyValueStore, SnapshotIterator};
use crate::error::{KvError, Result};

/// BTreeMap-backed keyed store with no capacity limit and no durability.
///
/// Keys are kept ordered so prefix scans are a single range walk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of keys across every prefix.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copies every raw key currently stored. Useful when inspecting namespaces.
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn insert(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }
        self.data.write().insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| KvError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn size(&self, prefix: &str) -> Result<usize> {
        let data = self.data.read();
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .count())
    }

    fn iterator(&self, prefix: &str) -> Result<SnapshotIterator> {
        let data = self.data.read();
        let entries = data
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key[prefix.len()..].to_string(), value.clone()))
            .collect();
        Ok(SnapshotIterator::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_scoped_size_and_iterator() {
        let store = MemoryStore::new();
        store.insert("user_a", vec![1]).unwrap();
        store.insert("user_b", vec![2]).unwrap();
        store.insert("users", vec![3]).unwrap();
        store.insert("zzz", vec![4]).unwrap();

        assert_eq!(store.size("user_").unwrap(), 2);
        assert_eq!(store.size("").unwrap(), 4);

        let mut keys: Vec<String> = store
            .iterator("user_")
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("missing"), Err(KvError::NotFound(_))));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.insert("k", vec![1]).unwrap();

        store.delete("k").unwrap();
        store.delete("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_iterator_is_detached_from_store() {
        let store = MemoryStore::new();
        store.insert("p_1", vec![1]).unwrap();

        let mut iter = store.iterator("p_").unwrap();
        store.insert("p_2", vec![2]).unwrap();
        store.delete("p_1").unwrap();

        assert!(iter.next());
        assert_eq!(iter.key().unwrap(), "1");
        assert!(!iter.next());
    }
}
