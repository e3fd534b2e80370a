//! Error types for the key/value stores
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == KV Error Enum ==
/// Unified error type for every store in the crate.
#[derive(Error, Debug)]
pub enum KvError {
    /// Empty keys are rejected before any state is touched
    #[error("Key cannot be empty")]
    EmptyKey,

    /// Key not found in the store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Iterator accessed before `next()` or after exhaustion
    #[error("Iterator index out of range")]
    IndexOutOfRange,

    /// Failure from the wrapped keyed store, tagged with the operation that failed
    #[error("{context}: {source}")]
    Underlying {
        context: &'static str,
        #[source]
        source: Box<KvError>,
    },

    /// Value could not be marshalled or unmarshalled
    #[error("Codec error: {0}")]
    Codec(String),

    /// Bounded stores need room for at least one entry
    #[error("Capacity must be at least 1")]
    InvalidCapacity,

    /// Prune intervals must be a positive duration
    #[error("Prune interval must be positive")]
    InvalidInterval,

    /// Backend is unreachable or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl KvError {
    /// Wraps an error from an underlying store with operation context.
    pub fn underlying(context: &'static str, source: KvError) -> Self {
        KvError::Underlying {
            context,
            source: Box::new(source),
        }
    }

    /// Returns true for lookup misses, including wrapped ones.
    pub fn is_not_found(&self) -> bool {
        match self {
            KvError::NotFound(_) => true,
            KvError::Underlying { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for store operations.
pub type Result<T> = std::result::Result<T, KvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underlying_keeps_context_and_source() {
        let err = KvError::underlying("insert slot marker", KvError::Unavailable("down".into()));

        assert_eq!(err.to_string(), "insert slot marker: Store unavailable: down");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_not_found_sees_through_wrapping() {
        assert!(KvError::NotFound("k".into()).is_not_found());
        assert!(KvError::underlying("read", KvError::NotFound("k".into())).is_not_found());
        assert!(!KvError::EmptyKey.is_not_found());
    }
}
