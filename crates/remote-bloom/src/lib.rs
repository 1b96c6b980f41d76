//! # Remote Bloom
//!
//! Bloom filter whose bit array lives in a shared, persistent, key-addressable bit
//! store. Independent processes add to and query one logical filter by name without
//! sharing memory; only the store is shared.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `FilterConfig` / `FilterConfigBuilder`: validated configuration
//!   - `FilterParams`: derived hash count and bit count
//!   - `compute_bit_offsets`: seeded MurmurHash3 probes
//!   - `FilterSummary`: diagnostic description
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `MembershipFilter`: Driving port (add / lookup / describe)
//!   - `BitStore`: Driven port (exists / delete / set_bit / get_bit)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `RemoteBloomFilter`: lifecycle and add/lookup protocol
//!
//! - **Adapters Layer** (`adapters/`): Store implementations
//!   - `InMemoryBitStore`, `FileBackedBitStore`
//!
//! ## Invariants
//!
//! - No false negatives: once `add(x)` returns `Ok`, `lookup(x)` returns `true`.
//! - Adds commute: the final array is the OR of all probe bits ever set.
//! - All handles on one name must use the same capacity and error rate.
//!
//! ## Usage Example
//!
//! ```ignore
//! use remote_bloom::{InMemoryBitStore, RemoteBloomFilter};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryBitStore::new());
//! let filter = RemoteBloomFilter::new("seen-urls", 100_000, 0.01, store, false).await?;
//!
//! filter.add(b"https://example.com").await?;
//! assert!(filter.lookup(b"https://example.com").await?);
//! filter.log_summary();
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{FileBackedBitStore, InMemoryBitStore};
pub use domain::{FilterConfig, FilterConfigBuilder, FilterParams, FilterSummary};
pub use error::{FilterError, StoreError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{BitStore, MembershipFilter};
pub use service::RemoteBloomFilter;
