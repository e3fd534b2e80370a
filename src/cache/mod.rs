//! Cache Module
//!
//! Provides a fixed-capacity in-memory store with random-replacement eviction.

mod bounded;
mod stats;


// Re-export public types
pub use bounded::BoundedStore;
pub use stats::StoreStats;
