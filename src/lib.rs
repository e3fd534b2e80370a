//! TTL KV - composable in-memory key/value caching primitives
//!
//! Provides a fixed-capacity store with random-replacement eviction and a
//! TTL decorator that adds bucketed expiry to any keyed store.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod tasks;
pub mod ttl;

pub use cache::BoundedStore;
pub use config::Config;
pub use db::{KeyValueStore, MemoryStore, SnapshotIterator, Table};
pub use error::{KvError, Result};
pub use tasks::{PruneHandle, PruneScheduler};
pub use ttl::TtlTable;
