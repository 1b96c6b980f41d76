//! Diagnostic summary of a filter's derived parameters

use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::FilterConfig;
use super::parameters::FilterParams;

/// Point-in-time description of a filter, for logs and operator output
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub name: String,
    pub error_rate: f64,
    pub capacity: u64,
    pub bit_count: u64,
    pub hash_count: u32,
    /// bit_count / 8
    pub memory_bytes: u64,
    pub memory_mb: f64,
    /// Theoretical false positive rate once `capacity` items are added
    pub expected_fpr: f64,
}

impl FilterSummary {
    pub fn new(config: &FilterConfig, params: &FilterParams) -> Self {
        Self {
            name: config.name.clone(),
            error_rate: config.error_rate,
            capacity: config.capacity,
            bit_count: params.bit_count,
            hash_count: params.hash_count,
            memory_bytes: params.memory_bytes(),
            memory_mb: params.memory_mb(),
            expected_fpr: params.expected_fpr(config.capacity),
        }
    }
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filter name is {}", self.name)?;
        writeln!(
            f,
            "Error rate is {} ({}% of 100%)",
            self.error_rate,
            self.error_rate * 100.0
        )?;
        writeln!(f, "Capacity is {}", self.capacity)?;
        writeln!(
            f,
            "Size of RAM is {:.2}Mb ({} bits)",
            self.memory_mb, self.bit_count
        )?;
        write!(f, "Number of hashes is {}", self.hash_count)
    }
}
