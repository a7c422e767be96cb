//! Store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Rows reserved up front in the identity array and in each new column.
    pub entity_capacity: usize,
    /// Maximum number of join caches alive at the same time.
    pub max_caches: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            max_caches: 64,
        }
    }
}

impl StoreConfig {
    /// Override the number of rows reserved up front.
    #[must_use]
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Override the live join cache limit.
    #[must_use]
    pub fn with_max_caches(mut self, max_caches: usize) -> Self {
        self.max_caches = max_caches;
        self
    }
}
