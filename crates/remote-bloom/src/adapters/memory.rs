use std::collections::HashMap;

use async_trait::async_trait;
use bitvec::prelude::*;
use tokio::sync::RwLock;

use crate::domain::DEFAULT_MAX_BITS;
use crate::error::StoreError;
use crate::ports::{check_offset, BitStore};

/// In-memory bit store for tests and single-process use.
///
/// Behaves like a string-backed bit store: arrays are byte-granular, grow with zero
/// bits on write, and number bits from the most significant bit of each byte.
pub struct InMemoryBitStore {
    arrays: RwLock<HashMap<String, BitVec<u8, Msb0>>>,
    max_bits: u64,
}

impl Default for InMemoryBitStore {
    fn default() -> Self {
        Self::with_max_bits(DEFAULT_MAX_BITS)
    }
}

impl InMemoryBitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a custom per-key ceiling
    pub fn with_max_bits(max_bits: u64) -> Self {
        Self {
            arrays: RwLock::new(HashMap::new()),
            max_bits,
        }
    }

    /// Raw bytes of the array under `key`
    pub async fn raw_bytes(&self, key: &str) -> Option<Vec<u8>> {
        let arrays = self.arrays.read().await;
        arrays.get(key).map(|bits| bits.as_raw_slice().to_vec())
    }

    /// Number of set bits under `key` (0 for a missing key)
    pub async fn count_ones(&self, key: &str) -> usize {
        let arrays = self.arrays.read().await;
        arrays.get(key).map_or(0, |bits| bits.count_ones())
    }
}

#[async_trait]
impl BitStore for InMemoryBitStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.arrays.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.arrays.write().await.remove(key);
        Ok(())
    }

    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<(), StoreError> {
        check_offset(offset, self.max_bits)?;
        let offset = offset as usize;

        let mut arrays = self.arrays.write().await;
        let bits = arrays.entry(key.to_string()).or_default();
        if offset >= bits.len() {
            bits.resize((offset / 8 + 1) * 8, false);
        }
        bits.set(offset, value);
        Ok(())
    }

    async fn get_bit(&self, key: &str, offset: u64) -> Result<bool, StoreError> {
        check_offset(offset, self.max_bits)?;

        let arrays = self.arrays.read().await;
        Ok(arrays
            .get(key)
            .and_then(|bits| bits.get(offset as usize).map(|bit| *bit))
            .unwrap_or(false))
    }

    async fn byte_len(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let arrays = self.arrays.read().await;
        Ok(Some(arrays.get(key).map_or(0, |bits| (bits.len() / 8) as u64)))
    }

    fn max_bits(&self) -> u64 {
        self.max_bits
    }
}
