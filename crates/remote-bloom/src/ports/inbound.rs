//! Inbound Ports (Driving Ports)
//!
//! The API callers use to interact with a named filter.

use async_trait::async_trait;

use crate::domain::FilterSummary;
use crate::error::FilterError;

/// Probabilistic set-membership API (Driving Port)
///
/// `lookup` never returns `false` for an item whose `add` completed. It may return
/// `true` for items never added (false positive).
#[async_trait]
pub trait MembershipFilter: Send + Sync {
    /// Add an item by setting all of its probe bits
    async fn add(&self, item: &[u8]) -> Result<(), FilterError>;

    /// Test whether an item might be present
    async fn lookup(&self, item: &[u8]) -> Result<bool, FilterError>;

    /// Derived parameters for diagnostics. Does not touch the store.
    fn describe(&self) -> FilterSummary;
}
