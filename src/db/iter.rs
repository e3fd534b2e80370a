//! Snapshot Iterator Module
//!
//! Single-pass cursor over a point-in-time copy of a store's entries.

use crate::error::{KvError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Unstarted,
    Positioned(usize),
    Exhausted,
}

// == Snapshot Iterator ==
/// Cursor over an owned copy of `(key, value)` pairs.
///
/// The snapshot is taken when the iterator is created and never reflects
/// later mutations of the source store. Entry order is unspecified.
///
/// `key()` and `value()` only succeed after `next()` has returned `true`;
/// before the first `next()` or once `next()` has returned `false` they fail
/// with [`KvError::IndexOutOfRange`].
#[derive(Debug, Clone)]
pub struct SnapshotIterator {
    entries: Vec<(String, Vec<u8>)>,
    cursor: Cursor,
}

impl SnapshotIterator {
    /// Creates an iterator that owns the given entries.
    pub fn new(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            entries,
            cursor: Cursor::Unstarted,
        }
    }

    /// Creates an iterator with nothing to yield.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    // == Next ==
    /// Advances to the next entry. Returns `false` once the snapshot is exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let next_index = match self.cursor {
            Cursor::Unstarted => 0,
            Cursor::Positioned(i) => i + 1,
            Cursor::Exhausted => return false,
        };

        if next_index < self.entries.len() {
            self.cursor = Cursor::Positioned(next_index);
            true
        } else {
            self.cursor = Cursor::Exhausted;
            false
        }
    }

    // == Key ==
    /// Key of the current entry.
    pub fn key(&self) -> Result<&str> {
        self.current().map(|(key, _)| key.as_str())
    }

    // == Value ==
    /// Value of the current entry.
    pub fn value(&self) -> Result<&[u8]> {
        self.current().map(|(_, value)| value.as_slice())
    }

    /// Number of entries captured in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn current(&self) -> Result<&(String, Vec<u8>)> {
        match self.cursor {
            Cursor::Positioned(i) => self.entries.get(i).ok_or(KvError::IndexOutOfRange),
            Cursor::Unstarted | Cursor::Exhausted => Err(KvError::IndexOutOfRange),
        }
    }
}

impl IntoIterator for SnapshotIterator {
    type Item = (String, Vec<u8>);
    type IntoIter = std::vec::IntoIter<(String, Vec<u8>)>;

    /// Consumes the whole snapshot, ignoring the cursor position.
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
