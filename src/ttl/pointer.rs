//! Persisted prune pointer.

use crate::db::Marshal;
use crate::error::{KvError, Result};

/// Highest slot whose members are known to be deleted.
///
/// Stored as 8 little-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pointer(pub i64);

impl Marshal for Pointer {
    fn marshal_binary(&self) -> Result<Vec<u8>> {
        Ok(self.0.to_le_bytes().to_vec())
    }

    fn unmarshal_binary(data: &[u8]) -> Result<Self> {
        let bytes: [u8; 8] = data.try_into().map_err(|_| {
            KvError::Codec(format!("cannot read pointer: expected 8 bytes, got {}", data.len()))
        })?;
        Ok(Pointer(i64::from_le_bytes(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let bytes = Pointer(0x0102).marshal_binary().unwrap();
        assert_eq!(bytes, vec![0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Pointer::unmarshal_binary(&bytes).unwrap(), Pointer(0x0102));
    }

    #[test]
    fn test_negative_pointer() {
        let bytes = Pointer(-1).marshal_binary().unwrap();
        assert_eq!(Pointer::unmarshal_binary(&bytes).unwrap(), Pointer(-1));
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(matches!(Pointer::unmarshal_binary(&[1, 2, 3]), Err(KvError::Codec(_))));
    }
}
