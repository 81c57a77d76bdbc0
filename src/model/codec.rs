//! Byte encoding of envelopes and argument snapshots.

use serde_json::Value;

use super::CacheWrapper;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Serializer seam shared by the store (envelopes) and the registry (argument snapshots).
pub trait Codec: Send + Sync {
    fn encode(&self, wrapper: &CacheWrapper) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<CacheWrapper, CodecError>;

    /// Produces a copy of `args` that shares nothing with the input.
    fn deep_clone(&self, args: &[Value]) -> Result<Vec<Value>, CodecError>;
}

/// JSON codec; deep clones go through a full serialize/deserialize round trip.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, wrapper: &CacheWrapper) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(wrapper).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheWrapper, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn deep_clone(&self, args: &[Value]) -> Result<Vec<Value>, CodecError> {
        let bytes = serde_json::to_vec(args).map_err(|e| CodecError::Encode(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
