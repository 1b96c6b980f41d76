//! Outbound Ports (Driven Ports)
//!
//! The bit store the filter depends on. The filter never owns the bit array; it only
//! issues independent point operations against a shared store.

use async_trait::async_trait;

use crate::domain::DEFAULT_MAX_BITS;
use crate::error::StoreError;

/// Remote key-addressable bit store (Driven Port)
///
/// Each individual call must be atomic at the store level. Arrays grow on write: setting
/// an offset past the end extends the array with zero bits, and reading past the end
/// returns `false`.
#[async_trait]
pub trait BitStore: Send + Sync {
    /// Whether an array exists under `key`
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove the array under `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Set a single bit
    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<(), StoreError>;

    /// Read a single bit
    async fn get_bit(&self, key: &str, offset: u64) -> Result<bool, StoreError>;

    /// Size of the array under `key` in bytes, when the backend can report it
    async fn byte_len(&self, _key: &str) -> Result<Option<u64>, StoreError> {
        Ok(None)
    }

    /// Number of addressable bits per key. Offsets must be strictly below this.
    fn max_bits(&self) -> u64 {
        DEFAULT_MAX_BITS
    }
}

/// Reject offsets at or beyond `max_bits`
pub fn check_offset(offset: u64, max_bits: u64) -> Result<(), StoreError> {
    if offset >= max_bits {
        return Err(StoreError::OffsetOutOfRange {
            offset,
            max: max_bits,
        });
    }
    Ok(())
}
