//! False positive verification harness.
//!
//! Fills a filter with `capacity` random UUIDs, then runs a number of experiments,
//! each looking up `capacity` fresh UUIDs that were never added. Every positive answer
//! is a false positive.

use remote_bloom::{BitStore, FilterError, RemoteBloomFilter};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Outcome of a harness run
#[derive(Clone, Debug, Serialize)]
pub struct SelftestReport {
    pub capacity: u64,
    pub experiments: usize,
    pub total_lookups: u64,
    pub false_positives: u64,
    /// Mean false positives per experiment
    pub average_false_positives: f64,
    /// Observed false positive rate
    pub false_positive_rate: f64,
    /// Configured target rate
    pub target_error_rate: f64,
}

pub async fn run_selftest<S: BitStore + ?Sized>(
    filter: &RemoteBloomFilter<S>,
    experiments: usize,
) -> Result<SelftestReport, FilterError> {
    let capacity = filter.config().capacity;

    for _ in 0..capacity {
        filter.add(Uuid::new_v4().to_string().as_bytes()).await?;
    }

    let mut false_positives = 0u64;
    for experiment in 0..experiments {
        let mut hits = 0u64;
        for _ in 0..capacity {
            if filter.lookup(Uuid::new_v4().to_string().as_bytes()).await? {
                hits += 1;
            }
        }
        debug!(experiment, hits, "Selftest experiment finished");
        false_positives += hits;
    }

    let total_lookups = capacity * experiments as u64;
    let average_false_positives = if experiments > 0 {
        false_positives as f64 / experiments as f64
    } else {
        0.0
    };
    let false_positive_rate = if total_lookups > 0 {
        false_positives as f64 / total_lookups as f64
    } else {
        0.0
    };

    Ok(SelftestReport {
        capacity,
        experiments,
        total_lookups,
        false_positives,
        average_false_positives,
        false_positive_rate,
        target_error_rate: filter.config().error_rate,
    })
}
