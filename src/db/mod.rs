//! Store Contracts Module
//!
//! Defines the generic keyed-store contract consumed by the TTL layer, the
//! prefix-free table contract exposed by this crate's stores, and the value
//! codec both rely on.
//!
//! # Contracts
//! - [`KeyValueStore`]: prefix-scoped store, the durable engine's interface
//! - [`Table`]: the same operations without prefixes, implemented by
//!   [`BoundedStore`](crate::cache::BoundedStore) and [`TtlTable`](crate::ttl::TtlTable)

mod codec;
mod iter;
mod memory;

pub use codec::{Json, Marshal};
pub use iter::SnapshotIterator;
pub use memory::MemoryStore;

use crate::error::Result;

// == Key Value Store ==
/// Generic keyed store shared by any number of TTL tables.
///
/// Implementations are expected to be internally synchronized: each call is
/// atomic on its own, but no atomicity is promised across calls.
pub trait KeyValueStore: Send + Sync {
    /// Writes `value` under `key`, replacing any previous value.
    fn insert(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Reads the value under `key`, failing with `NotFound` when absent.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Removes `key`. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Counts keys starting with `prefix`.
    fn size(&self, prefix: &str) -> Result<usize>;

    /// Snapshot of every entry whose key starts with `prefix`. Yielded keys
    /// have the prefix stripped.
    fn iterator(&self, prefix: &str) -> Result<SnapshotIterator>;
}

// == Table ==
/// Prefix-free store contract.
pub trait Table: Send + Sync {
    fn insert(&self, key: &str, value: Vec<u8>) -> Result<()>;
    fn get(&self, key: &str) -> Result<Vec<u8>>;
    fn delete(&self, key: &str) -> Result<()>;
    fn size(&self) -> Result<usize>;
    fn iterator(&self) -> Result<SnapshotIterator>;
}

/// Typed access to a [`KeyValueStore`] through [`Marshal`].
pub trait KeyValueStoreExt: KeyValueStore {
    fn insert_marshal<V: Marshal>(&self, key: &str, value: &V) -> Result<()> {
        self.insert(key, value.marshal_binary()?)
    }

    fn get_marshal<V: Marshal>(&self, key: &str) -> Result<V> {
        V::unmarshal_binary(&self.get(key)?)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Typed access to a [`Table`] through [`Marshal`].
pub trait TableExt: Table {
    fn insert_marshal<V: Marshal>(&self, key: &str, value: &V) -> Result<()> {
        self.insert(key, value.marshal_binary()?)
    }

    fn get_marshal<V: Marshal>(&self, key: &str) -> Result<V> {
        V::unmarshal_binary(&self.get(key)?)
    }
}

impl<T: Table + ?Sized> TableExt for T {}
