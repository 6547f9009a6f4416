//! Source adapter trait definitions

use clustermap_api::{SourceFact, SourceKind};

use crate::StoreResult;

/// A read-only view of one upstream store.
///
/// Implementations block on their store, so async callers should run
/// `fetch` on a blocking thread.
pub trait SourceAdapter: Send + Sync {
    /// Which source this adapter reads
    fn kind(&self) -> SourceKind;

    /// Fetch the currently relevant rows as facts
    fn fetch(&self) -> StoreResult<Vec<SourceFact>>;

    /// Check if the backing store is reachable
    fn is_healthy(&self) -> bool {
        true
    }
}
