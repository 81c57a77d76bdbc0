// Package model provides cache keys, stored envelopes and autoload entries.

pub mod codec;
pub mod entry;
pub mod invocation;
pub mod keys;
pub mod policy;
pub mod wrapper;

#[cfg(test)]
mod entry_test;
#[cfg(test)]
mod keys_test;

// Re-export main types
pub use codec::{Codec, CodecError, JsonCodec};
pub use entry::{AutoLoadEntry, LoadGuard};
pub use invocation::{Invocation, Loader};
pub use keys::CacheKey;
pub use policy::CachePolicy;
pub use wrapper::CacheWrapper;
