//! Service Layer
//!
//! Orchestrates domain logic against the injected bit store.

pub mod remote_filter;

pub use remote_filter::RemoteBloomFilter;
