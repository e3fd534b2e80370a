//! Binary codec contract for stored values.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{KvError, Result};

/// Symmetric binary encoding for values written through a store.
///
/// `unmarshal_binary(&v.marshal_binary()?)` must reproduce `v`.
pub trait Marshal: Sized {
    fn marshal_binary(&self) -> Result<Vec<u8>>;
    fn unmarshal_binary(data: &[u8]) -> Result<Self>;
}

impl Marshal for Vec<u8> {
    fn marshal_binary(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }

    fn unmarshal_binary(data: &[u8]) -> Result<Self> {
        Ok(data.to_vec())
    }
}

impl Marshal for String {
    fn marshal_binary(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn unmarshal_binary(data: &[u8]) -> Result<Self> {
        String::from_utf8(data.to_vec()).map_err(|e| KvError::Codec(e.to_string()))
    }
}

// == JSON Wrapper ==
/// Stores any serde type as JSON bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize + DeserializeOwned> Marshal for Json<T> {
    fn marshal_binary(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(|e| KvError::Codec(e.to_string()))
    }

    fn unmarshal_binary(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map(Json)
            .map_err(|e| KvError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        hits: u32,
    }

    #[test]
    fn test_json_wrapper_roundtrip() {
        let session = Json(Session {
            user: "ada".to_string(),
            hits: 3,
        });

        let bytes = session.marshal_binary().unwrap();
        assert_eq!(Json::<Session>::unmarshal_binary(&bytes).unwrap(), session);
    }

    #[test]
    fn test_json_rejects_garbage() {
        let result = Json::<Session>::unmarshal_binary(b"not json");
        assert!(matches!(result, Err(KvError::Codec(_))));
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        assert!(matches!(String::unmarshal_binary(&[0xff, 0xfe]), Err(KvError::Codec(_))));
    }
}
