//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the stores.
//!
//! # Tasks
//! - TTL Prune: sweeps expired slots of one TTL table at its interval

mod prune;

pub use prune::{PruneHandle, PruneScheduler};
