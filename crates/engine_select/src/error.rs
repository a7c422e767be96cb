//! Selector-layer error types.

/// Errors raised while setting up a selection.
///
/// Scans themselves never fail: a row that does not match is skipped and an
/// exhausted domain ends the scan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// The store refused to create another join cache.
    #[error("the store could not create a join cache over {keys} key(s)")]
    CacheUnavailable {
        /// Number of keys the cache was requested over.
        keys: usize,
    },
}
