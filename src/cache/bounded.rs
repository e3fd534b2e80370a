//! Bounded Store Module
//!
//! Fixed-capacity associative store with random-replacement eviction.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::Rng;
use tracing::trace;

use crate::cache::stats::{StatsCounters, StoreStats};
use crate::db::{KeyValueStore, SnapshotIterator, Table};
use crate::error::{KvError, Result};

// == Slots ==
/// Dense key list plus an index into it, so a random victim is one
/// `swap_remove` away instead of a walk over the map.
#[derive(Debug, Default)]
struct Slots {
    /// Every live key, in no particular order
    keys: Vec<String>,
    /// Key to (position in `keys`, value)
    index: HashMap<String, (usize, Vec<u8>)>,
}

impl Slots {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    /// Removes the key at `position`, moving the last key into its place.
    fn remove_at(&mut self, position: usize) -> String {
        let removed = self.keys.swap_remove(position);
        self.index.remove(&removed);
        if let Some(moved) = self.keys.get(position) {
            if let Some(entry) = self.index.get_mut(moved) {
                entry.0 = position;
            }
        }
        removed
    }

    fn remove(&mut self, key: &str) {
        if let Some(&(position, _)) = self.index.get(key) {
            self.remove_at(position);
        }
    }

    fn push(&mut self, key: &str, value: Vec<u8>) {
        self.index.insert(key.to_string(), (self.keys.len(), value));
        self.keys.push(key.to_string());
    }
}

// == Bounded Store ==
/// In-memory store holding at most `capacity` entries.
///
/// When full, an insert first evicts one existing entry picked uniformly at
/// random from the current keys. There is no recency or insertion-order
/// tracking: this is neither LRU nor FIFO, and callers must not rely on which
/// entry survives. Overwriting a key that is already present replaces it in
/// place and evicts nothing, so the size is unchanged. Eviction is O(1).
///
/// A single reader/writer lock guards the map. `insert` and `delete` take it
/// exclusively; `get`, `size` and `iterator` share it.
#[derive(Debug)]
pub struct BoundedStore {
    capacity: usize,
    slots: RwLock<Slots>,
    stats: StatsCounters,
}

impl BoundedStore {
    // == Constructor ==
    /// Creates an empty store that holds at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(KvError::InvalidCapacity);
        }

        Ok(Self {
            capacity,
            slots: RwLock::new(Slots::with_capacity(capacity)),
            stats: StatsCounters::default(),
        })
    }

    // == Insert ==
    /// Stores a key-value pair, evicting a random entry first if the store is
    /// full and `key` is new.
    pub fn insert(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }

        let mut slots = self.slots.write();

        if let Some(entry) = slots.index.get_mut(key) {
            entry.1 = value;
            return Ok(());
        }

        if slots.len() >= self.capacity {
            let position = rand::rng().random_range(0..slots.len());
            let victim = slots.remove_at(position);
            trace!(key = %victim, "evicting entry");
            self.stats.record_eviction();
        }

        slots.push(key, value);
        Ok(())
    }

    // == Get ==
    /// Retrieves a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        match self.slots.read().index.get(key) {
            Some((_, value)) => {
                self.stats.record_hit();
                Ok(value.clone())
            }
            None => {
                self.stats.record_miss();
                Err(KvError::NotFound(key.to_string()))
            }
        }
    }

    // == Delete ==
    /// Removes an entry. Missing keys are ignored.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.slots.write().remove(key);
        Ok(())
    }

    // == Size ==
    /// Returns the current number of entries. Never exceeds the capacity.
    pub fn size(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Iterator ==
    /// Copies every entry under the shared lock and returns a detached cursor.
    pub fn iterator(&self) -> SnapshotIterator {
        self.iterator_with_prefix("")
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> StoreStats {
        self.stats.snapshot(self.size(), self.capacity)
    }

    fn size_with_prefix(&self, prefix: &str) -> usize {
        self.slots
            .read()
            .keys
            .iter()
            .filter(|key| key.starts_with(prefix))
            .count()
    }

    fn iterator_with_prefix(&self, prefix: &str) -> SnapshotIterator {
        let slots = self.slots.read();
        let snapshot = slots
            .index
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (_, value))| (key[prefix.len()..].to_string(), value.clone()))
            .collect();
        SnapshotIterator::new(snapshot)
    }

    /// Panics if the key list and its index disagree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let slots = self.slots.read();
        assert_eq!(slots.keys.len(), slots.index.len());
        for (position, key) in slots.keys.iter().enumerate() {
            let (indexed, _) = slots.index.get(key).expect("key missing from index");
            assert_eq!(*indexed, position, "stale position for {}", key);
        }
    }
}

impl Table for BoundedStore {
    fn insert(&self, key: &str, value: Vec<u8>) -> Result<()> {
        BoundedStore::insert(self, key, value)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        BoundedStore::get(self, key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        BoundedStore::delete(self, key)
    }

    fn size(&self) -> Result<usize> {
        Ok(BoundedStore::size(self))
    }

    fn iterator(&self) -> Result<SnapshotIterator> {
        Ok(BoundedStore::iterator(self))
    }
}

/// Lets a TTL table sit on top of a bounded store. Capacity pressure may then
/// evict slot markers or the prune pointer along with values.
impl KeyValueStore for BoundedStore {
    fn insert(&self, key: &str, value: Vec<u8>) -> Result<()> {
        BoundedStore::insert(self, key, value)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        BoundedStore::get(self, key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        BoundedStore::delete(self, key)
    }

    fn size(&self, prefix: &str) -> Result<usize> {
        Ok(self.size_with_prefix(prefix))
    }

    fn iterator(&self, prefix: &str) -> Result<SnapshotIterator> {
        Ok(self.iterator_with_prefix(prefix))
    }
}
