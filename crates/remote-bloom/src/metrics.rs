//! Metrics hooks for remote filter operations
//!
//! Counts store traffic and operation latencies. Every `add` and `lookup` is a round
//! trip per probe, so `bits_written` / `bits_read` are the numbers to watch.
//!
//! ## Usage
//!
//! ```ignore
//! use remote_bloom::{Metrics, RemoteBloomFilter};
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(Metrics::new());
//! let filter = RemoteBloomFilter::open_with_metrics(config, store, metrics.clone()).await?;
//! filter.add(b"alice").await?;
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics collector for remote filter operations
#[derive(Default)]
pub struct Metrics {
    /// Filter handles opened
    pub filters_opened: AtomicU64,
    /// Destructive resets performed on open
    pub filters_reset: AtomicU64,
    /// Store bytes addressed by opened filters
    pub bytes_reserved: AtomicU64,
    /// Completed `add` calls
    pub items_added: AtomicU64,
    /// Bits written by `add`
    pub bits_written: AtomicU64,
    /// Completed `lookup` calls
    pub lookups_performed: AtomicU64,
    /// Lookups that returned "possibly present"
    pub lookups_positive: AtomicU64,
    /// Bits read by `lookup`
    pub bits_read: AtomicU64,
    /// Store calls that failed
    pub store_errors: AtomicU64,
    /// Cumulative add time in nanoseconds
    pub add_time_ns: AtomicU64,
    /// Cumulative lookup time in nanoseconds
    pub lookup_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a filter handle being opened
    ///
    /// # Arguments
    /// * `bit_count` - Size of the remote array in bits
    /// * `reset` - Whether the existing array was deleted first
    pub fn record_filter_opened(&self, bit_count: u64, reset: bool) {
        self.filters_opened.fetch_add(1, Ordering::Relaxed);
        // Stores allocate whole bytes
        self.bytes_reserved
            .fetch_add(bit_count.div_ceil(8), Ordering::Relaxed);
        if reset {
            self.filters_reset.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_add(&self, duration: Duration, bits_written: u64) {
        self.items_added.fetch_add(1, Ordering::Relaxed);
        self.bits_written.fetch_add(bits_written, Ordering::Relaxed);
        self.add_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record lookup operation
    ///
    /// # Arguments
    /// * `duration` - Time taken for lookup
    /// * `found` - Whether the item was reported present (possibly false positive)
    /// * `bits_read` - Probes read before the answer was known
    pub fn record_lookup(&self, duration: Duration, found: bool, bits_read: u64) {
        self.lookups_performed.fetch_add(1, Ordering::Relaxed);
        self.bits_read.fetch_add(bits_read, Ordering::Relaxed);
        self.lookup_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if found {
            self.lookups_positive.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            filters_opened: self.filters_opened.load(Ordering::Relaxed),
            filters_reset: self.filters_reset.load(Ordering::Relaxed),
            bytes_reserved: self.bytes_reserved.load(Ordering::Relaxed),
            items_added: self.items_added.load(Ordering::Relaxed),
            bits_written: self.bits_written.load(Ordering::Relaxed),
            lookups_performed: self.lookups_performed.load(Ordering::Relaxed),
            lookups_positive: self.lookups_positive.load(Ordering::Relaxed),
            bits_read: self.bits_read.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            avg_add_ns: self.avg_add_time_ns(),
            avg_lookup_ns: self.avg_lookup_time_ns(),
        }
    }

    pub fn avg_add_time_ns(&self) -> u64 {
        let total = self.add_time_ns.load(Ordering::Relaxed);
        let count = self.items_added.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    pub fn avg_lookup_time_ns(&self) -> u64 {
        let total = self.lookup_time_ns.load(Ordering::Relaxed);
        let count = self.lookups_performed.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Ratio of positive lookups to total lookups
    ///
    /// Includes true positives. When only absent items are looked up this is the
    /// observed false positive rate.
    pub fn observed_positive_rate(&self) -> f64 {
        let total = self.lookups_performed.load(Ordering::Relaxed);
        let positive = self.lookups_positive.load(Ordering::Relaxed);
        if total > 0 {
            positive as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.filters_opened,
            &self.filters_reset,
            &self.bytes_reserved,
            &self.items_added,
            &self.bits_written,
            &self.lookups_performed,
            &self.lookups_positive,
            &self.bits_read,
            &self.store_errors,
            &self.add_time_ns,
            &self.lookup_time_ns,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub filters_opened: u64,
    pub filters_reset: u64,
    pub bytes_reserved: u64,
    pub items_added: u64,
    pub bits_written: u64,
    pub lookups_performed: u64,
    pub lookups_positive: u64,
    pub bits_read: u64,
    pub store_errors: u64,
    pub avg_add_ns: u64,
    pub avg_lookup_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to forward filter metrics to Prometheus, StatsD or
/// OpenTelemetry.
pub trait MetricsRecorder: Send + Sync {
    fn record_filter_opened(&self, bit_count: u64, reset: bool);

    fn record_add(&self, duration: Duration, bits_written: u64);

    fn record_lookup(&self, duration: Duration, found: bool, bits_read: u64);

    fn record_store_error(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_filter_opened(&self, _: u64, _: bool) {}
    fn record_add(&self, _: Duration, _: u64) {}
    fn record_lookup(&self, _: Duration, _: bool, _: u64) {}
    fn record_store_error(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_filter_opened(&self, bit_count: u64, reset: bool) {
        Metrics::record_filter_opened(self, bit_count, reset);
    }

    fn record_add(&self, duration: Duration, bits_written: u64) {
        Metrics::record_add(self, duration, bits_written);
    }

    fn record_lookup(&self, duration: Duration, found: bool, bits_read: u64) {
        Metrics::record_lookup(self, duration, found, bits_read);
    }

    fn record_store_error(&self) {
        Metrics::record_store_error(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_record_filter_opened() {
        let metrics = Metrics::new();

        metrics.record_filter_opened(959, false);
        metrics.record_filter_opened(64, true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.filters_opened, 2);
        assert_eq!(snapshot.filters_reset, 1);
        assert_eq!(snapshot.bytes_reserved, 120 + 8);
    }

    #[test]
    fn test_record_adds() {
        let metrics = Metrics::new();

        metrics.record_add(Duration::from_nanos(100), 7);
        metrics.record_add(Duration::from_nanos(300), 7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.items_added, 2);
        assert_eq!(snapshot.bits_written, 14);
        assert_eq!(snapshot.avg_add_ns, 200);
    }

    #[test]
    fn test_record_lookups() {
        let metrics = Metrics::new();

        metrics.record_lookup(Duration::from_nanos(100), true, 7);
        metrics.record_lookup(Duration::from_nanos(150), false, 1);
        metrics.record_lookup(Duration::from_nanos(120), true, 7);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.lookups_performed, 3);
        assert_eq!(snapshot.lookups_positive, 2);
        assert_eq!(snapshot.bits_read, 15);
        assert_eq!(snapshot.avg_lookup_ns, 123); // (100 + 150 + 120) / 3
    }

    #[test]
    fn test_observed_positive_rate() {
        let metrics = Metrics::new();

        for _ in 0..100 {
            metrics.record_lookup(Duration::from_nanos(100), false, 1);
        }
        for _ in 0..10 {
            metrics.record_lookup(Duration::from_nanos(100), true, 7);
        }

        let rate = metrics.observed_positive_rate();
        assert!((rate - 0.0909).abs() < 0.01); // 10/110
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();

        metrics.record_filter_opened(959, true);
        metrics.record_lookup(Duration::from_nanos(100), true, 7);
        metrics.record_add(Duration::from_nanos(50), 7);
        metrics.record_store_error();

        metrics.reset();

        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_filter_opened(959, false);
        metrics.record_add(Duration::from_nanos(100), 7);
        metrics.record_lookup(Duration::from_nanos(100), true, 7);
        metrics.record_store_error();
    }
}
