//! TTL Table Module
//!
//! Decorates a generic keyed store with expiry. Every insert writes the value
//! plus an empty slot marker for the current time bucket; sweeps walk the
//! buckets between the persisted prune pointer and the cutoff and delete the
//! (value, marker) pairs registered there.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::db::{KeyValueStore, KeyValueStoreExt, SnapshotIterator, Table};
use crate::error::{KvError, Result};
use crate::tasks::{PruneHandle, PruneScheduler};
use crate::ttl::clock::{Clock, SystemClock};
use crate::ttl::index::{TtlIndex, PRUNE_POINTER_KEY, VALUE_PREFIX};
use crate::ttl::pointer::Pointer;

// == Sweep Report ==
/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Pointer read at the start of the sweep
    pub from: i64,
    /// Pointer after the sweep
    pub cutoff: i64,
    /// Number of slots walked
    pub slots_swept: u64,
    /// Number of (value, marker) pairs deleted
    pub keys_removed: u64,
}

// == TTL Table ==
/// Expiring view over a shared [`KeyValueStore`].
///
/// An entry lives for at least one interval and is removed by the first sweep
/// that runs after its slot falls a full interval behind the clock.
///
/// # Consistency
/// `insert` is two independent writes, value first and marker second. A
/// failure between them leaves a value with no marker, which never expires.
/// Concurrent `delete` or sweeps can leave a marker with no value, which the
/// next sweep of that slot removes harmlessly. Neither case is repaired.
///
/// # Key sharing
/// Markers and the prune pointer are namespaced by a hash of the table name.
/// Values all live under the same `ttlDataTable_` prefix, so tables sharing a
/// store must not share logical keys.
///
/// # Sweeps
/// Sweeps on one `TtlTable` run one at a time. Two handles built over the
/// same store and name do not share that guard and must not sweep at once.
pub struct TtlTable {
    store: Arc<dyn KeyValueStore>,
    index: TtlIndex,
    clock: Arc<dyn Clock>,
    /// Held for a whole sweep so pointer read and write cannot interleave
    sweep_lock: Mutex<()>,
}

impl std::fmt::Debug for TtlTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlTable")
            .field("index", &self.index)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl TtlTable {
    // == Constructors ==
    /// Wraps `store` as the TTL table `name`, using wall-clock time.
    pub fn new(store: Arc<dyn KeyValueStore>, name: &str, interval: Duration) -> Result<Self> {
        Self::with_clock(store, name, interval, Arc::new(SystemClock))
    }

    /// Wraps `store` as the TTL table `name` with an explicit time source.
    ///
    /// Reads the persisted prune pointer, creating it one slot behind the
    /// current one when the table is new.
    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        name: &str,
        interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let table = Self {
            store,
            index: TtlIndex::new(name, interval)?,
            clock,
            sweep_lock: Mutex::new(()),
        };

        let pointer = table.prune_pointer()?;
        info!(
            table = name,
            interval_ms = interval.as_millis() as u64,
            pointer = pointer.0,
            "TTL table ready"
        );
        Ok(table)
    }

    /// Builds the table and starts its prune task on the current tokio runtime.
    ///
    /// The returned handle must be cancelled by the owner; dropping it leaves
    /// the task running until `cancel` fires.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        name: &str,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Result<(Arc<Self>, PruneHandle)> {
        let table = Arc::new(Self::new(store, name, interval)?);
        let handle = PruneScheduler::spawn(Arc::clone(&table), cancel);
        Ok((table, handle))
    }

    pub fn index(&self) -> &TtlIndex {
        &self.index
    }

    pub fn interval(&self) -> Duration {
        self.index.interval()
    }

    // == Prune Pointer ==
    /// Current prune pointer. Every slot at or below it has been swept.
    ///
    /// A missing pointer is initialized to the slot before the current one, so
    /// a fresh table starts with no backlog. If markers already exist the
    /// pointer was lost (for example evicted by a bounded store); markers in
    /// slots at or below the new pointer are never swept, and that is logged
    /// at `warn`.
    pub fn prune_pointer(&self) -> Result<Pointer> {
        let key = self.index.pointer_key();
        match self.store.get_marshal::<Pointer>(&key) {
            Ok(pointer) => Ok(pointer),
            Err(e) if e.is_not_found() => {
                let markers = self.marker_count()?;
                let pointer = Pointer(self.index.slot_at(self.clock.now()) - 1);
                self.store
                    .insert_marshal(&key, &pointer)
                    .map_err(|e| KvError::underlying("initialize prune pointer", e))?;
                if markers > 0 {
                    warn!(
                        pointer = pointer.0,
                        markers,
                        "prune pointer was missing for a table with markers; \
                         entries in older slots will not expire"
                    );
                } else {
                    debug!(pointer = pointer.0, "initialized prune pointer");
                }
                Ok(pointer)
            }
            Err(e) => Err(KvError::underlying("read prune pointer", e)),
        }
    }

    /// Number of slot markers this table has in the store, plus the pointer
    /// if it is present.
    pub fn marker_count(&self) -> Result<usize> {
        self.store
            .size(&self.index.marker_prefix())
            .map_err(|e| KvError::underlying("count slot markers", e))
    }

    // == Sweep ==
    /// Deletes every entry registered in slots `(pointer, cutoff]` and moves the
    /// pointer to the cutoff.
    ///
    /// A failure part way leaves the pointer where it was; the next sweep
    /// repeats the same slots, and the repeated deletes are no-ops. If the
    /// clock has moved behind the pointer nothing is deleted and the pointer
    /// is left untouched.
    ///
    /// Concurrent calls on the same table are serialized, so a slower sweep
    /// can never write back an older pointer over a newer one.
    pub fn sweep(&self) -> Result<SweepReport> {
        let _guard = self.sweep_lock.lock();
        let from = self.prune_pointer()?.0;
        let cutoff = self.index.cutoff_at(self.clock.now());

        if cutoff < from {
            debug!(pointer = from, cutoff, "clock behind prune pointer, skipping sweep");
            return Ok(SweepReport {
                from,
                cutoff: from,
                slots_swept: 0,
                keys_removed: 0,
            });
        }

        let mut keys_removed = 0;
        for slot in (from + 1)..=cutoff {
            keys_removed += self.sweep_slot(slot)?;
        }

        self.store
            .insert_marshal(&self.index.pointer_key(), &Pointer(cutoff))
            .map_err(|e| KvError::underlying("persist prune pointer", e))?;

        Ok(SweepReport {
            from,
            cutoff,
            slots_swept: (cutoff - from) as u64,
            keys_removed,
        })
    }

    fn sweep_slot(&self, slot: i64) -> Result<u64> {
        let mut markers = self
            .store
            .iterator(&self.index.slot_prefix(slot))
            .map_err(|e| KvError::underlying("scan slot markers", e))?;

        let mut removed = 0;
        while markers.next() {
            let key = markers.key()?;
            if slot == 0 && key == PRUNE_POINTER_KEY {
                continue;
            }

            self.store
                .delete(&self.index.value_key(key))
                .map_err(|e| KvError::underlying("delete expired value", e))?;
            self.store
                .delete(&self.index.slot_key(key, slot))
                .map_err(|e| KvError::underlying("delete slot marker", e))?;
            removed += 1;
        }

        if removed > 0 {
            debug!(slot, removed, "swept slot");
        }
        Ok(removed)
    }
}

impl Table for TtlTable {
    fn insert(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }

        self.store
            .insert(&self.index.value_key(key), value)
            .map_err(|e| KvError::underlying("insert ttl value", e))?;

        let slot = self.index.slot_at(self.clock.now());
        self.store
            .insert(&self.index.slot_key(key, slot), Vec::new())
            .map_err(|e| KvError::underlying("insert slot marker", e))
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }

        self.store
            .get(&self.index.value_key(key))
            .map_err(|e| match e {
                KvError::NotFound(_) => KvError::NotFound(key.to_string()),
                e => KvError::underlying("read ttl value", e),
            })
    }

    /// Deletes the value only. Its marker stays until the sweep reaches its slot.
    fn delete(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::EmptyKey);
        }

        self.store
            .delete(&self.index.value_key(key))
            .map_err(|e| KvError::underlying("delete ttl value", e))
    }

    fn size(&self) -> Result<usize> {
        self.store
            .size(VALUE_PREFIX)
            .map_err(|e| KvError::underlying("count ttl values", e))
    }

    fn iterator(&self) -> Result<SnapshotIterator> {
        self.store
            .iterator(VALUE_PREFIX)
            .map_err(|e| KvError::underlying("scan ttl values", e))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, TableExt};
    use crate::ttl::clock::ManualClock;
    use chrono::DateTime;

    const INTERVAL: Duration = Duration::from_secs(1);

    fn setup() -> (Arc<MemoryStore>, Arc<ManualClock>, TtlTable) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap(),
        ));
        let table = TtlTable::with_clock(store.clone(), "sessions", INTERVAL, clock.clone()).unwrap();
        (store, clock, table)
    }

    #[test]
    fn test_new_table_pointer_is_one_behind() {
        let (_, clock, table) = setup();

        let current = table.index().slot_at(clock.now());
        assert_eq!(table.prune_pointer().unwrap(), Pointer(current - 1));
    }

    #[test]
    fn test_insert_writes_value_and_marker() {
        let (store, clock, table) = setup();

        table.insert("k", vec![7]).unwrap();

        let slot = table.index().slot_at(clock.now());
        assert_eq!(store.get("ttlDataTable_k").unwrap(), vec![7]);
        assert_eq!(store.get(&table.index().slot_key("k", slot)).unwrap(), Vec::<u8>::new());
        assert_eq!(table.get("k").unwrap(), vec![7]);
        assert_eq!(Table::size(&table).unwrap(), 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let (store, _, table) = setup();
        let before = store.len();

        assert!(matches!(table.insert("", vec![1]), Err(KvError::EmptyKey)));
        assert!(matches!(table.get(""), Err(KvError::EmptyKey)));
        assert!(matches!(table.delete(""), Err(KvError::EmptyKey)));
        assert_eq!(store.len(), before);
    }

    #[test]
    fn test_get_missing_reports_logical_key() {
        let (_, _, table) = setup();

        match table.get("absent") {
            Err(KvError::NotFound(key)) => assert_eq!(key, "absent"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_sweep_expires_after_one_interval() {
        let (store, clock, table) = setup();
        table.insert("k", vec![1]).unwrap();
        let slot = table.index().slot_at(clock.now());

        // Same slot: nothing is old enough yet.
        let report = table.sweep().unwrap();
        assert_eq!(report.keys_removed, 0);
        assert!(table.get("k").is_ok());

        clock.advance(INTERVAL / 2);
        table.sweep().unwrap();
        assert!(table.get("k").is_ok(), "entry must live a full interval");

        clock.advance(INTERVAL / 2);
        let report = table.sweep().unwrap();
        assert_eq!(report.keys_removed, 1);
        assert_eq!(report.cutoff, slot);
        assert!(matches!(table.get("k"), Err(KvError::NotFound(_))));
        assert!(store.get(&table.index().slot_key("k", slot)).is_err());
        assert_eq!(table.prune_pointer().unwrap(), Pointer(slot));
    }

    #[test]
    fn test_sweep_keeps_newer_slots() {
        let (_, clock, table) = setup();
        table.insert("old", vec![1]).unwrap();
        clock.advance(INTERVAL * 2);
        table.insert("new", vec![2]).unwrap();

        let report = table.sweep().unwrap();

        assert_eq!(report.keys_removed, 1);
        assert!(table.get("old").is_err());
        assert_eq!(table.get("new").unwrap(), vec![2]);
    }

    #[test]
    fn test_delete_leaves_marker_for_sweep() {
        let (store, clock, table) = setup();
        table.insert("k", vec![1]).unwrap();
        let marker = table.index().slot_key("k", table.index().slot_at(clock.now()));

        table.delete("k").unwrap();
        assert!(table.get("k").is_err());
        assert!(store.get(&marker).is_ok());

        clock.advance(INTERVAL * 2);
        table.sweep().unwrap();
        assert!(store.get(&marker).is_err());
    }

    #[test]
    fn test_sweep_with_no_backlog_still_persists_pointer() {
        let (_, _, table) = setup();
        let before = table.prune_pointer().unwrap();

        let report = table.sweep().unwrap();

        assert_eq!(report.slots_swept, 0);
        assert_eq!(table.prune_pointer().unwrap(), before);
    }

    #[test]
    fn test_clock_going_backwards_never_lowers_pointer() {
        let (_, clock, table) = setup();
        clock.advance(INTERVAL * 5);
        table.sweep().unwrap();
        let high = table.prune_pointer().unwrap();

        clock.set(DateTime::from_timestamp(1_699_999_000, 0).unwrap());
        let report = table.sweep().unwrap();

        assert_eq!(report.slots_swept, 0);
        assert_eq!(table.prune_pointer().unwrap(), high);
    }

    #[test]
    fn test_pointer_survives_reconstruction() {
        let (store, clock, table) = setup();
        clock.advance(INTERVAL * 3);
        let report = table.sweep().unwrap();
        drop(table);

        let reopened =
            TtlTable::with_clock(store.clone(), "sessions", INTERVAL, clock.clone()).unwrap();
        assert_eq!(reopened.prune_pointer().unwrap(), Pointer(report.cutoff));

        clock.advance(INTERVAL);
        let next = reopened.sweep().unwrap();
        assert_eq!(next.from, report.cutoff);
        assert_eq!(next.slots_swept, 1);
    }

    #[test]
    fn test_lost_pointer_is_reinitialized_and_counted() {
        let (store, clock, table) = setup();
        table.insert("k", vec![1]).unwrap();
        let slot = table.index().slot_at(clock.now());
        assert_eq!(table.marker_count().unwrap(), 2, "marker plus pointer");

        clock.advance(INTERVAL * 3);
        store.delete(&table.index().pointer_key()).unwrap();
        assert_eq!(table.marker_count().unwrap(), 1);

        let pointer = table.prune_pointer().unwrap();
        assert_eq!(pointer, Pointer(table.index().slot_at(clock.now()) - 1));
        assert!(pointer.0 > slot);

        // The marker now sits behind the pointer and is never revisited.
        clock.advance(INTERVAL);
        table.sweep().unwrap();
        assert_eq!(table.get("k").unwrap(), vec![1]);
        assert!(store.get(&table.index().slot_key("k", slot)).is_ok());
    }

    #[test]
    fn test_iterator_yields_logical_keys() {
        let (_, _, table) = setup();
        table.insert_marshal("a", &"one".to_string()).unwrap();
        table.insert_marshal("b", &"two".to_string()).unwrap();

        let mut keys: Vec<String> = table.iterator().unwrap().into_iter().map(|(k, _)| k).collect();
        keys.sort();

        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(table.get_marshal::<String>("b").unwrap(), "two");
    }
}
