//! Filter configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use remote_bloom::domain::FilterConfigBuilder;
//!
//! let config = FilterConfigBuilder::new("signups")
//!     .capacity(1_000_000)
//!     .error_rate(0.001)
//!     .build()
//!     .expect("Valid config");
//! ```

use serde::{Deserialize, Serialize};

use super::parameters::{derive_parameters, validate_parameters, FilterParams};
use crate::error::FilterError;

/// Default target false positive rate (1%)
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

/// Configuration of one named remote filter
///
/// CONTRACT: once a filter exists in the store, every handle opened on the same
/// `name` must use the same `capacity` and `error_rate`. Different values derive a
/// different bit count, offsets are reduced modulo the wrong size, and lookups
/// silently return false negatives. Enable `verify_existing` to catch this when the
/// store can report key sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Key of the bit array in the store
    pub name: String,
    /// Expected maximum number of distinct items
    pub capacity: u64,
    /// Target false positive rate, in (0, 1)
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,
    /// Delete any existing array under `name` before opening (destructive)
    #[serde(default)]
    pub reset: bool,
    /// Compare the size of an existing array against the derived bit count
    ///
    /// Stores report sizes in whole bytes, so the check only catches bit counts that
    /// round up to a different byte length. For example 954 and 959 bits both occupy
    /// 120 bytes and pass.
    #[serde(default)]
    pub verify_existing: bool,
}

fn default_error_rate() -> f64 {
    DEFAULT_ERROR_RATE
}

impl FilterConfig {
    /// Create a new configuration with validation
    pub fn new(name: impl Into<String>, capacity: u64, error_rate: f64) -> Result<Self, FilterError> {
        let config = Self {
            name: name.into(),
            capacity,
            error_rate,
            reset: false,
            verify_existing: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate name, capacity and error rate
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.name.is_empty() {
            return Err(FilterError::InvalidParameter(
                "filter name cannot be empty".to_string(),
            ));
        }
        validate_parameters(self.capacity, self.error_rate)
    }

    /// Derive (k, m) for this configuration
    pub fn params(&self) -> Result<FilterParams, FilterError> {
        self.validate()?;
        derive_parameters(self.capacity, self.error_rate)
    }

    /// Builder-style method to request a destructive reset
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Builder-style method to enable existing-array size verification
    pub fn with_verify_existing(mut self, verify: bool) -> Self {
        self.verify_existing = verify;
        self
    }
}

/// Builder for FilterConfig with validation
#[derive(Debug)]
pub struct FilterConfigBuilder {
    name: String,
    capacity: Option<u64>,
    error_rate: Option<f64>,
    reset: bool,
    verify_existing: bool,
}

impl FilterConfigBuilder {
    /// Start a builder for the filter stored under `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: None,
            error_rate: None,
            reset: false,
            verify_existing: false,
        }
    }

    /// Set expected number of items (required)
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set target false positive rate (default 0.01)
    pub fn error_rate(mut self, error_rate: f64) -> Self {
        self.error_rate = Some(error_rate);
        self
    }

    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    pub fn verify_existing(mut self, verify: bool) -> Self {
        self.verify_existing = verify;
        self
    }

    /// Build the FilterConfig, validating all parameters
    ///
    /// A missing capacity is reported as an invalid capacity of 0.
    pub fn build(self) -> Result<FilterConfig, FilterError> {
        let config = FilterConfig {
            name: self.name,
            capacity: self.capacity.unwrap_or(0),
            error_rate: self.error_rate.unwrap_or(DEFAULT_ERROR_RATE),
            reset: self.reset,
            verify_existing: self.verify_existing,
        };

        config.validate()?;
        Ok(config)
    }
}
