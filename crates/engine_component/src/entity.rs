//! Entity ids and the identity pseudo-component.
//!
//! An [`Entity`] owns no data. Inside a query it stands for "the entity of
//! the row being visited": it is present for every live entity and never
//! backed by a column of its own.

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentKind, ComponentTypeId};

/// Entity id, also usable as the identity key of a query.
///
/// Ids grow with creation order, so sorting by entity sorts by age.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Entity(pub u64);

impl Entity {
    /// Id 0; never handed out by an allocator.
    pub const INVALID: Entity = Entity(0);

    /// Wrap a raw id.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// `false` only for [`Entity::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Component for Entity {
    const NAME: &'static str = "Entity";
    const KIND: ComponentKind = ComponentKind::Identity;
    const ID: ComponentTypeId = ComponentTypeId::EID;
}

/// Hands out entity ids in strictly increasing order, starting at 1.
///
/// Ids are not reused. Stores rely on this to append new entities to the
/// end of every entity-sorted column.
#[derive(Debug)]
pub struct EntityAllocator {
    last: u64,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Entity::INVALID.0,
        }
    }

    /// The next id.
    pub fn allocate(&mut self) -> Entity {
        self.last += 1;
        Entity(self.last)
    }

    /// The id the next call to [`EntityAllocator::allocate`] returns.
    #[must_use]
    pub fn peek(&self) -> Entity {
        Entity(self.last + 1)
    }

    /// How many ids were handed out.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.last
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
