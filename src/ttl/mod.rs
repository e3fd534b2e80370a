//! TTL Module
//!
//! Expiry for any [`KeyValueStore`](crate::db::KeyValueStore) through
//! time-bucketed slot markers and a persisted prune pointer.
//!
//! # Sweeping
//! Keys are grouped into slots `interval` wide. A sweep deletes everything
//! registered in the slots between the prune pointer and the slot one interval
//! behind now, so its cost follows the number of expiring keys rather than
//! the size of the table.

mod clock;
mod index;
mod pointer;
mod table;

pub use clock::{unix_nanos, Clock, ManualClock, SystemClock};
pub use index::{slot_number, TtlIndex, PRUNE_POINTER_KEY, VALUE_PREFIX};
pub use pointer::Pointer;
pub use table::{SweepReport, TtlTable};
