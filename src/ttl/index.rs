//! TTL Index Module
//!
//! Maps timestamps to slots and derives the physical keys a TTL table writes.
//!
//! # Key Layout
//! - value: `ttlDataTable_{key}`
//! - slot marker: `{name_hash}_slot{slot}_{key}`
//! - prune pointer: `{name_hash}_slot0_prunePointer`

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{KvError, Result};
use crate::ttl::clock::unix_nanos;

/// Prefix shared by every value written through a TTL table.
pub const VALUE_PREFIX: &str = "ttlDataTable_";

/// Reserved logical key holding the prune pointer at slot 0.
pub const PRUNE_POINTER_KEY: &str = "prunePointer";

// == Slot Number ==
/// Slot containing `timestamp_nanos` for buckets `interval_nanos` wide.
///
/// Integer floor division, so boundaries are exact and timestamps before the
/// epoch still round down. `interval_nanos` must be positive.
pub fn slot_number(timestamp_nanos: i64, interval_nanos: i64) -> i64 {
    timestamp_nanos.div_euclid(interval_nanos)
}

// == TTL Index ==
/// Key derivation for one named TTL table.
#[derive(Debug, Clone)]
pub struct TtlIndex {
    name_hash: String,
    interval: Duration,
    interval_nanos: i64,
}

impl TtlIndex {
    /// Builds the index for table `name`. The interval is both the slot width
    /// and the minimum lifetime of an entry.
    pub fn new(name: &str, interval: Duration) -> Result<Self> {
        let interval_nanos =
            i64::try_from(interval.as_nanos()).map_err(|_| KvError::InvalidInterval)?;
        if interval_nanos <= 0 {
            return Err(KvError::InvalidInterval);
        }

        Ok(Self {
            name_hash: blake3::hash(name.as_bytes()).to_hex().to_string(),
            interval,
            interval_nanos,
        })
    }

    pub fn name_hash(&self) -> &str {
        &self.name_hash
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Slot containing `moment`.
    pub fn slot_at(&self, moment: DateTime<Utc>) -> i64 {
        slot_number(unix_nanos(moment), self.interval_nanos)
    }

    /// Newest slot old enough to sweep at `now`: the slot of `now - interval`.
    pub fn cutoff_at(&self, now: DateTime<Utc>) -> i64 {
        slot_number(
            unix_nanos(now).saturating_sub(self.interval_nanos),
            self.interval_nanos,
        )
    }

    pub fn value_key(&self, key: &str) -> String {
        format!("{}{}", VALUE_PREFIX, key)
    }

    /// Prefix shared by every marker of this table, across all slots.
    pub fn marker_prefix(&self) -> String {
        format!("{}_slot", self.name_hash)
    }

    pub fn slot_prefix(&self, slot: i64) -> String {
        format!("{}{}_", self.marker_prefix(), slot)
    }

    pub fn slot_key(&self, key: &str, slot: i64) -> String {
        format!("{}{}", self.slot_prefix(slot), key)
    }

    pub fn pointer_key(&self) -> String {
        self.slot_key(PRUNE_POINTER_KEY, 0)
    }
}
