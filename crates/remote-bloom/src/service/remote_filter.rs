//! Remote Bloom filter controller
//!
//! Derives parameters, manages the lifecycle of the named bit array in the store, and
//! runs the add/lookup protocol.
//!
//! An `add` is a sequence of independent bit writes with no atomicity across them. A
//! failure part way through leaves some probe bits set, which can only raise the
//! false positive rate; it never causes a false negative for an add that completed.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::{compute_bit_offsets, FilterConfig, FilterParams, FilterSummary};
use crate::error::{FilterError, StoreError};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{BitStore, MembershipFilter};

/// Bloom filter whose bit array lives in a shared [`BitStore`]
///
/// Handles are cheap: any number of processes may open the same name concurrently.
/// See [`FilterConfig`] for the contract on matching parameters.
pub struct RemoteBloomFilter<S: BitStore + ?Sized> {
    store: Arc<S>,
    config: FilterConfig,
    params: FilterParams,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<S: BitStore + ?Sized> RemoteBloomFilter<S> {
    /// Open the filter `name`, optionally deleting any existing array first
    pub async fn new(
        name: impl Into<String>,
        capacity: u64,
        error_rate: f64,
        store: Arc<S>,
        reset: bool,
    ) -> Result<Self, FilterError> {
        let config = FilterConfig::new(name, capacity, error_rate)?.with_reset(reset);
        Self::open(config, store).await
    }

    /// Open a filter from a prepared configuration
    pub async fn open(config: FilterConfig, store: Arc<S>) -> Result<Self, FilterError> {
        Self::open_with_metrics(config, store, Arc::new(NoOpMetrics)).await
    }

    /// Open a filter, reporting to the given metrics recorder
    ///
    /// 1. Validate and derive (k, m); reject arrays larger than the store ceiling
    /// 2. If `reset`, delete the existing array
    /// 3. If no array exists, write bit `m - 1` so the store allocates the full range
    /// 4. Otherwise, if `verify_existing`, compare the stored size against `m`
    pub async fn open_with_metrics(
        config: FilterConfig,
        store: Arc<S>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Result<Self, FilterError> {
        let params = config.params()?;
        params.ensure_fits(store.max_bits())?;

        let name = config.name.as_str();

        if config.reset {
            store
                .delete(name)
                .await
                .map_err(|e| store_failure(metrics.as_ref(), name, "delete", e))?;
            info!(filter = name, "Deleted existing filter array");
        }

        let exists = store
            .exists(name)
            .await
            .map_err(|e| store_failure(metrics.as_ref(), name, "exists", e))?;

        if !exists {
            // Sizing side effect only
            store
                .set_bit(name, params.bit_count - 1, false)
                .await
                .map_err(|e| store_failure(metrics.as_ref(), name, "set_bit", e))?;
            debug!(
                filter = name,
                bit_count = params.bit_count,
                "Reserved storage for filter array"
            );
        } else if config.verify_existing {
            verify_existing_size(store.as_ref(), metrics.as_ref(), name, &params).await?;
        }

        metrics.record_filter_opened(params.bit_count, config.reset);
        info!(
            filter = name,
            capacity = config.capacity,
            error_rate = config.error_rate,
            bit_count = params.bit_count,
            hash_count = params.hash_count,
            created = !exists,
            "Opened remote Bloom filter"
        );

        Ok(Self {
            store,
            config,
            params,
            metrics,
        })
    }

    /// Set every probe bit of `item`
    ///
    /// Stops at the first failing write and returns `StoreUnavailable`.
    pub async fn add(&self, item: &[u8]) -> Result<(), FilterError> {
        let start = Instant::now();

        for offset in self.bit_offsets(item) {
            self.store
                .set_bit(&self.config.name, offset, true)
                .await
                .map_err(|e| self.store_failure("set_bit", e))?;
        }

        self.metrics
            .record_add(start.elapsed(), self.params.hash_count as u64);
        Ok(())
    }

    /// Add every item in order, returning how many were added
    pub async fn add_many<I, T>(&self, items: I) -> Result<usize, FilterError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut added = 0;
        for item in items {
            self.add(item.as_ref()).await?;
            added += 1;
        }
        Ok(added)
    }

    /// Test whether `item` might be in the filter
    ///
    /// Returns `false` at the first probe bit that reads 0. `true` means possibly
    /// present.
    pub async fn lookup(&self, item: &[u8]) -> Result<bool, FilterError> {
        let start = Instant::now();
        let mut bits_read = 0;
        let mut found = true;

        for offset in self.bit_offsets(item) {
            bits_read += 1;
            let bit = self
                .store
                .get_bit(&self.config.name, offset)
                .await
                .map_err(|e| self.store_failure("get_bit", e))?;
            if !bit {
                found = false;
                break;
            }
        }

        self.metrics.record_lookup(start.elapsed(), found, bits_read);
        Ok(found)
    }

    /// Probe offsets for `item` under this filter's parameters
    pub fn bit_offsets(&self, item: &[u8]) -> Vec<u64> {
        compute_bit_offsets(item, self.params.hash_count, self.params.bit_count)
    }

    pub fn describe(&self) -> FilterSummary {
        FilterSummary::new(&self.config, &self.params)
    }

    /// Emit the summary as a structured log event
    pub fn log_summary(&self) {
        let summary = self.describe();
        info!(
            filter = %summary.name,
            error_rate = summary.error_rate,
            capacity = summary.capacity,
            memory_mb = summary.memory_mb,
            bit_count = summary.bit_count,
            hash_count = summary.hash_count,
            expected_fpr = summary.expected_fpr,
            "Filter summary"
        );
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    fn store_failure(&self, op: &'static str, err: StoreError) -> FilterError {
        store_failure(self.metrics.as_ref(), &self.config.name, op, err)
    }
}

#[async_trait]
impl<S: BitStore + ?Sized + 'static> MembershipFilter for RemoteBloomFilter<S> {
    async fn add(&self, item: &[u8]) -> Result<(), FilterError> {
        RemoteBloomFilter::add(self, item).await
    }

    async fn lookup(&self, item: &[u8]) -> Result<bool, FilterError> {
        RemoteBloomFilter::lookup(self, item).await
    }

    fn describe(&self) -> FilterSummary {
        RemoteBloomFilter::describe(self)
    }
}

/// Byte-granular: bit counts within the same byte length are indistinguishable
async fn verify_existing_size<S: BitStore + ?Sized>(
    store: &S,
    metrics: &dyn MetricsRecorder,
    name: &str,
    params: &FilterParams,
) -> Result<(), FilterError> {
    let actual = store
        .byte_len(name)
        .await
        .map_err(|e| store_failure(metrics, name, "byte_len", e))?;

    match actual {
        Some(actual_bytes) if actual_bytes != params.storage_bytes() => {
            Err(FilterError::SizeMismatch {
                name: name.to_string(),
                expected_bytes: params.storage_bytes(),
                actual_bytes,
            })
        }
        Some(_) => Ok(()),
        None => {
            debug!(
                filter = name,
                "Store cannot report array size, skipping verification"
            );
            Ok(())
        }
    }
}

fn store_failure(
    metrics: &dyn MetricsRecorder,
    name: &str,
    op: &'static str,
    err: StoreError,
) -> FilterError {
    metrics.record_store_error();
    warn!(filter = name, op, error = %err, "Bit store operation failed");
    FilterError::StoreUnavailable(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryBitStore;
    use crate::metrics::Metrics;

    fn store() -> Arc<InMemoryBitStore> {
        Arc::new(InMemoryBitStore::new())
    }

    #[tokio::test]
    async fn test_open_reserves_full_array() {
        let store = store();
        let filter = RemoteBloomFilter::new("reserve", 100, 0.01, store.clone(), false)
            .await
            .unwrap();

        assert!(store.exists("reserve").await.unwrap());
        assert_eq!(
            store.byte_len("reserve").await.unwrap(),
            Some(filter.params().storage_bytes())
        );
        assert_eq!(store.count_ones("reserve").await, 0);
    }

    #[tokio::test]
    async fn test_add_then_lookup() {
        let filter = RemoteBloomFilter::new("basic", 100, 0.01, store(), false)
            .await
            .unwrap();

        filter.add(b"0xABCD1234567890ABCDEF").await.unwrap();

        assert!(filter.lookup(b"0xABCD1234567890ABCDEF").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_sets_at_most_k_bits() {
        let store = store();
        let filter = RemoteBloomFilter::new("bits", 1000, 0.01, store.clone(), false)
            .await
            .unwrap();

        filter.add(b"single").await.unwrap();

        let ones = store.count_ones("bits").await;
        assert!(ones > 0 && ones <= filter.params().hash_count as usize);
    }

    #[tokio::test]
    async fn test_lookup_short_circuits_on_empty_filter() {
        let metrics = Arc::new(Metrics::new());
        let config = FilterConfig::new("short", 100, 0.01).unwrap();
        let filter = RemoteBloomFilter::open_with_metrics(config, store(), metrics.clone())
            .await
            .unwrap();

        assert!(!filter.lookup(b"absent").await.unwrap());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lookups_performed, 1);
        assert_eq!(snapshot.bits_read, 1);
        assert_eq!(snapshot.lookups_positive, 0);
    }

    #[tokio::test]
    async fn test_lookup_reads_every_probe_when_present() {
        let metrics = Arc::new(Metrics::new());
        let config = FilterConfig::new("full", 100, 0.01).unwrap();
        let filter = RemoteBloomFilter::open_with_metrics(config, store(), metrics.clone())
            .await
            .unwrap();

        filter.add(b"present").await.unwrap();
        assert!(filter.lookup(b"present").await.unwrap());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.bits_read, 7);
        assert_eq!(snapshot.bits_written, 7);
        assert_eq!(snapshot.filters_opened, 1);
        assert_eq!(snapshot.bytes_reserved, 120);
    }

    #[tokio::test]
    async fn test_add_many_counts_items() {
        let filter = RemoteBloomFilter::new("many", 100, 0.01, store(), false)
            .await
            .unwrap();

        let added = filter.add_many(["a", "b", "c"]).await.unwrap();

        assert_eq!(added, 3);
        for item in ["a", "b", "c"] {
            assert!(filter.lookup(item.as_bytes()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_reopen_keeps_bits() {
        let store = store();
        let first = RemoteBloomFilter::new("persist", 100, 0.01, store.clone(), false)
            .await
            .unwrap();
        first.add(b"kept").await.unwrap();

        let second = RemoteBloomFilter::new("persist", 100, 0.01, store, false)
            .await
            .unwrap();

        assert!(second.lookup(b"kept").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_clears_bits() {
        let store = store();
        let first = RemoteBloomFilter::new("wipe", 100, 0.01, store.clone(), false)
            .await
            .unwrap();
        first.add(b"old").await.unwrap();

        let metrics = Arc::new(Metrics::new());
        let config = FilterConfig::new("wipe", 100, 0.01).unwrap().with_reset(true);
        let second = RemoteBloomFilter::open_with_metrics(config, store.clone(), metrics.clone())
            .await
            .unwrap();

        assert!(!second.lookup(b"old").await.unwrap());
        assert_eq!(store.count_ones("wipe").await, 0);
        assert_eq!(metrics.snapshot().filters_reset, 1);
    }

    #[tokio::test]
    async fn test_capacity_exceeded_against_store_ceiling() {
        let store = Arc::new(InMemoryBitStore::with_max_bits(1024));

        let result = RemoteBloomFilter::new("small", 200, 0.01, store.clone(), false).await;

        assert!(matches!(result, Err(FilterError::CapacityExceeded { .. })));
        assert!(!store.exists("small").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_existing_detects_mismatch() {
        let store = store();
        RemoteBloomFilter::new("sized", 100, 0.01, store.clone(), false)
            .await
            .unwrap();

        let config = FilterConfig::new("sized", 10_000, 0.01)
            .unwrap()
            .with_verify_existing(true);
        let result = RemoteBloomFilter::open(config, store).await;

        assert!(matches!(
            result,
            Err(FilterError::SizeMismatch {
                expected_bytes: _,
                actual_bytes: 120,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_verify_existing_accepts_matching_size() {
        let store = store();
        let first = RemoteBloomFilter::new("same", 100, 0.01, store.clone(), false)
            .await
            .unwrap();
        first.add(b"x").await.unwrap();

        let config = FilterConfig::new("same", 100, 0.01)
            .unwrap()
            .with_verify_existing(true);

        assert!(RemoteBloomFilter::open(config, store).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_existing_is_byte_granular() {
        let store = store();
        let created = RemoteBloomFilter::new("granular", 100, 0.01, store.clone(), false)
            .await
            .unwrap();

        let config = FilterConfig::new("granular", 117, 0.02)
            .unwrap()
            .with_verify_existing(true);
        let params = config.params().unwrap();
        assert_eq!(params.bit_count, 954);
        assert_ne!(params.bit_count, created.params().bit_count);
        assert_eq!(params.storage_bytes(), created.params().storage_bytes());

        assert!(RemoteBloomFilter::open(config, store).await.is_ok());
    }

    #[tokio::test]
    async fn test_mismatch_ignored_without_verification() {
        let store = store();
        RemoteBloomFilter::new("lenient", 100, 0.01, store.clone(), false)
            .await
            .unwrap();

        let result = RemoteBloomFilter::new("lenient", 10_000, 0.01, store, false).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_describe_is_pure() {
        let store = store();
        let filter = RemoteBloomFilter::new("describe", 100, 0.01, store.clone(), false)
            .await
            .unwrap();

        let summary = filter.describe();

        assert_eq!(summary.bit_count, 959);
        assert_eq!(summary.hash_count, 7);
        assert_eq!(summary.memory_bytes, 959 / 8);
        assert_eq!(store.count_ones("describe").await, 0);
    }

    #[tokio::test]
    async fn test_usable_through_trait_object() {
        let filter: Box<dyn MembershipFilter> = Box::new(
            RemoteBloomFilter::new("dyn", 100, 0.01, store(), false)
                .await
                .unwrap(),
        );

        filter.add(b"via-trait").await.unwrap();
        assert!(filter.lookup(b"via-trait").await.unwrap());
        assert_eq!(filter.describe().name, "dyn");
    }

    #[tokio::test]
    async fn test_dyn_store() {
        let store: Arc<dyn BitStore> = Arc::new(InMemoryBitStore::new());
        let filter = RemoteBloomFilter::new("dyn-store", 100, 0.01, store, false)
            .await
            .unwrap();

        filter.add(b"item").await.unwrap();
        assert!(filter.lookup(b"item").await.unwrap());
    }
}
