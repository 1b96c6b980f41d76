//! Bloom filter parameter derivation
//!
//! Formulas:
//! - k = ceil(log2(1 / error_rate))
//! - m = k * ceil((n * |ln(error_rate)|) / (k * ln(2)^2))
//!
//! The order of floating-point operations is fixed. Every process sharing a filter
//! must derive the same (m, k) or lookups silently start missing items.

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Largest bit offset range a single key can address in common bit-store backends
/// (a 512MB string).
pub const DEFAULT_MAX_BITS: u64 = 1 << 32;

/// Derived filter parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Number of hash probes per operation (k)
    pub hash_count: u32,
    /// Total bits in the remote array (m)
    pub bit_count: u64,
}

impl FilterParams {
    /// Bits covered by each probe
    pub fn bits_per_slice(&self) -> u64 {
        self.bit_count / self.hash_count as u64
    }

    /// Estimated memory footprint in bytes
    pub fn memory_bytes(&self) -> u64 {
        self.bit_count / 8
    }

    /// Estimated memory footprint in megabytes
    pub fn memory_mb(&self) -> f64 {
        self.bit_count as f64 / 1024.0 / 1024.0 / 8.0
    }

    /// Bytes a store allocates once the last bit has been written
    pub fn storage_bytes(&self) -> u64 {
        self.bit_count.div_ceil(8)
    }

    /// Expected false positive rate after `n` distinct insertions
    pub fn expected_fpr(&self, n: u64) -> f64 {
        calculate_fpr(self.bit_count, n, self.hash_count)
    }

    /// Fail with `CapacityExceeded` if the array does not fit under `max_bits`
    pub fn ensure_fits(&self, max_bits: u64) -> Result<(), FilterError> {
        if self.bit_count > max_bits {
            return Err(FilterError::CapacityExceeded {
                bit_count: self.bit_count,
                max_bits,
                size_mb: self.memory_mb() as u64,
            });
        }
        Ok(())
    }
}

/// Validate `capacity` and `error_rate`
pub fn validate_parameters(capacity: u64, error_rate: f64) -> Result<(), FilterError> {
    // Written so that NaN is rejected too
    if !(error_rate > 0.0 && error_rate < 1.0) {
        return Err(FilterError::InvalidParameter(format!(
            "error_rate must be between 0 and 1 (exclusive), got {error_rate}"
        )));
    }
    if capacity == 0 {
        return Err(FilterError::InvalidParameter(
            "capacity must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Number of hash probes for a target error rate
///
/// Fails for error rates so small that `1 / error_rate` overflows, instead of letting
/// the cast saturate to `u32::MAX` probes.
pub fn hash_count_for(error_rate: f64) -> Result<u32, FilterError> {
    let k = ((1.0 / error_rate).ln() / LN_2).ceil();
    if !k.is_finite() || k > u32::MAX as f64 {
        return Err(FilterError::InvalidParameter(format!(
            "error_rate {error_rate} is too small to derive a hash count"
        )));
    }
    Ok((k as u32).max(1))
}

/// Derive (k, m) for the given capacity and target error rate
pub fn derive_parameters(capacity: u64, error_rate: f64) -> Result<FilterParams, FilterError> {
    validate_parameters(capacity, error_rate)?;

    let hash_count = hash_count_for(error_rate)?;
    let bits_per_slice = ((capacity as f64 * error_rate.ln().abs())
        / (hash_count as f64 * (LN_2 * LN_2)))
        .ceil();
    if !bits_per_slice.is_finite() {
        return Err(FilterError::InvalidParameter(format!(
            "capacity {capacity} with error_rate {error_rate} does not derive a finite bit count"
        )));
    }

    // Float-to-int casts saturate, so oversized inputs land on u64::MAX
    // and are rejected by `ensure_fits` rather than wrapping.
    let bit_count = (bits_per_slice as u64).saturating_mul(hash_count as u64);

    Ok(FilterParams {
        hash_count,
        bit_count,
    })
}

/// False positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn calculate_fpr(m: u64, n: u64, k: u32) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}
