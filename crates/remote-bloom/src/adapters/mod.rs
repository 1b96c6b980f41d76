//! Adapters Layer (Driven Adapters)
//!
//! Implementations of the `BitStore` port.
//!
//! ## Adapters
//!
//! - `InMemoryBitStore` - process-local arrays, for tests and one-shot runs
//! - `FileBackedBitStore` - single-file persistent store shared across processes

mod file;
mod memory;

pub use file::FileBackedBitStore;
pub use memory::InMemoryBitStore;
