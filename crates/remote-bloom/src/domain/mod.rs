//! Domain Layer - Pure filter logic
//!
//! This layer contains:
//! - Hash functions (seeded MurmurHash3 probes)
//! - Parameter derivation
//! - Configuration
//! - Diagnostic summary
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod config;
pub mod hash_functions;
pub mod parameters;
pub mod summary;

pub use config::{FilterConfig, FilterConfigBuilder, DEFAULT_ERROR_RATE};
pub use hash_functions::{bit_offset, compute_bit_offsets, murmur_hash};
pub use parameters::{
    calculate_fpr, derive_parameters, hash_count_for, validate_parameters, FilterParams,
    DEFAULT_MAX_BITS,
};
pub use summary::FilterSummary;
