use serde_json::Value;

use crate::model::{CacheWrapper, Codec, CodecError, JsonCodec};

/// Codec whose argument snapshots always fail.
pub struct FailingCloneCodec;

impl Codec for FailingCloneCodec {
    fn encode(&self, wrapper: &CacheWrapper) -> Result<Vec<u8>, CodecError> {
        JsonCodec.encode(wrapper)
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheWrapper, CodecError> {
        JsonCodec.decode(bytes)
    }

    fn deep_clone(&self, _args: &[Value]) -> Result<Vec<Value>, CodecError> {
        Err(CodecError::Encode("argument is not serializable".to_string()))
    }
}
