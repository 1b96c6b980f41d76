//! Error types for the remote Bloom filter

use thiserror::Error;

/// Errors surfaced by filter construction, `add` and `lookup`
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid filter parameter: {0}")]
    InvalidParameter(String),

    #[error(
        "Bitmap limit is {max_bits} bits, current is {bit_count} bits ({size_mb}MB). \
         Try to decrease the capacity or to increase the error_rate"
    )]
    CapacityExceeded {
        bit_count: u64,
        max_bits: u64,
        size_mb: u64,
    },

    #[error("Bit store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error(
        "Filter '{name}' exists with {actual_bytes} bytes, expected {expected_bytes} \
         (capacity or error_rate differ from the ones it was created with)"
    )]
    SizeMismatch {
        name: String,
        expected_bytes: u64,
        actual_bytes: u64,
    },
}

/// Errors from bit store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout")]
    Timeout,

    #[error("Bit offset {offset} is out of range (max {max})")]
    OffsetOutOfRange { offset: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt store data: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
