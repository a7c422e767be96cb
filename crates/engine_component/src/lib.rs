//! # engine_component
//!
//! Component identity and query declarations, shared by the store and the
//! selector layer.
//!
//! - [`Component`] trait: the contract all column data must satisfy, with
//!   [`Payload`] and [`Tag`] markers and the [`component!`] / [`tag!`] macros.
//! - [`Entity`]: lightweight `u64` entity identifiers, also usable as the
//!   identity pseudo-component inside queries.
//! - [`EntityAllocator`]: hands out ids in creation order.
//! - [`ComponentRegistry`]: id → descriptor lookup, validated once.
//! - [`Query`] / [`Absent`]: statically declared query key lists.

pub mod component;
pub mod entity;
pub mod query;
pub mod registry;

pub use component::{
    Component, ComponentDescriptor, ComponentKind, ComponentTypeId, Payload, Tag,
};
pub use entity::{Entity, EntityAllocator};
pub use query::{Absent, MAX_KEYS, Presence, Query, QueryKey, QueryTerm};
pub use registry::{ComponentRegistry, RegistryError};
