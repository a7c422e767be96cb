//! Store-level error types.

use engine_component::{Entity, RegistryError};

/// Errors raised by fallible setup operations on the reference store.
///
/// The [`EntityStore`](crate::EntityStore) contract itself never returns
/// errors: misses are `None` and empty results are zero counts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Registering a component type failed.
    #[error("component registration failed: {0}")]
    Registry(#[from] RegistryError),

    /// A spawn bundle listed the same component twice.
    #[error("component `{0}` appears twice in one bundle")]
    DuplicateComponent(&'static str),

    /// A spawn bundle listed the identity pseudo-component.
    #[error("the identity pseudo-component cannot be spawned as a value")]
    IdentityInBundle,

    /// The column registered under a component's id stores another type.
    #[error("the column for `{0}` holds a different type")]
    ColumnType(&'static str),

    /// A freshly spawned entity already had a row in a column.
    #[error("entity {entity} already has a `{component}` row")]
    RowExists {
        /// The component whose column already held the row.
        component: &'static str,
        /// The entity being spawned.
        entity: Entity,
    },
}
