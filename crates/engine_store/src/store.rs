//! The entity store contract.
//!
//! Everything the selector layer needs from storage goes through
//! [`EntityStore`]. The contract is exception-free: a miss is `None`, an
//! empty domain is a zero count, and operations on unknown components or
//! stale handles are no-ops.

use engine_component::{Component, ComponentRegistry, ComponentTypeId, Entity};

use crate::cache::CacheHandle;

/// A position the store handed out for a present component.
///
/// For a payload or tag component this is the row within that component's
/// column; for the identity pseudo-component it is the position in the
/// identity array. A slot is only meaningful for the component it was
/// returned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(usize);

impl Slot {
    /// Presence-only slot for answers that carry no position.
    pub const PRESENT: Slot = Slot(usize::MAX);

    /// Wrap a row position.
    #[must_use]
    pub const fn new(row: usize) -> Self {
        Self(row)
    }

    /// Returns the row position.
    #[must_use]
    pub const fn row(self) -> usize {
        self.0
    }
}

/// Columnar entity-component storage as seen by contexts and views.
///
/// Row indices address a component's column in its own order (entity order).
/// For [`ComponentTypeId::EID`] the "column" is the identity array holding
/// every live entity.
pub trait EntityStore {
    /// The registry resolving ids to descriptors.
    fn registry(&self) -> &ComponentRegistry;

    /// Array access: the slot of row `index` in `id`'s column, if it exists.
    ///
    /// `None` marks the end of the column. A store may keep vacated rows in
    /// place; those still answer here but miss every [`EntityStore::sibling`]
    /// lookup, themselves included.
    fn iter(&self, id: ComponentTypeId, index: usize) -> Option<Slot>;

    /// Sibling lookup: component `id` of the entity at row `index` of `main`.
    fn sibling(&self, main: ComponentTypeId, index: usize, id: ComponentTypeId) -> Option<Slot>;

    /// Number of entities holding `id`.
    fn count(&self, id: ComponentTypeId) -> usize;

    /// Create a new entity holding a default `id` component.
    ///
    /// Returns the new row in `id`'s column.
    fn create(&mut self, id: ComponentTypeId) -> Option<usize>;

    /// Remove the entity owning row `index` of `main`.
    fn remove(&mut self, main: ComponentTypeId, index: usize);

    /// Position of `entity` in the identity array.
    fn index_of(&self, entity: Entity) -> Option<usize>;

    /// Drop every row of component `id`.
    fn clear(&mut self, id: ComponentTypeId);

    /// Set tag `tag` on the entity at row `index` of `main`.
    fn enable_tag(&mut self, main: ComponentTypeId, index: usize, tag: ComponentTypeId);

    /// Clear tag `tag` on the entity at row `index` of `main`.
    fn disable_tag(&mut self, main: ComponentTypeId, index: usize, tag: ComponentTypeId);

    /// Set tag `tag` on every listed entity.
    fn group_enable(&mut self, tag: ComponentTypeId, entities: &[Entity]);

    /// Create a join cache over `keys` (main key first).
    fn cache_create(&mut self, keys: &[ComponentTypeId]) -> Option<CacheHandle>;

    /// Slot of key `id` in matched row `index` as of the last sync.
    fn cache_fetch(&self, cache: CacheHandle, index: usize, id: ComponentTypeId) -> Option<Slot>;

    /// The entity matched at row `index` as of the last sync.
    fn cache_entity(&self, cache: CacheHandle, index: usize) -> Option<Entity>;

    /// Recompute the join; returns the matched row count.
    fn cache_sync(&mut self, cache: CacheHandle) -> usize;

    /// Release a cache. The handle is dead afterwards.
    fn cache_release(&mut self, cache: CacheHandle);

    /// The value of component `T` at `slot`.
    fn get<T: Component>(&self, slot: Slot) -> Option<&T>;

    /// The mutable value of component `T` at `slot`.
    fn get_mut<T: Component>(&mut self, slot: Slot) -> Option<&mut T>;

    /// The entity at `slot` of the identity array.
    fn entity_at(&self, slot: Slot) -> Option<Entity>;

    /// Every value of component `T`, in row order.
    fn values<T: Component>(&self) -> &[T];

    /// Every value of component `T`, in row order, mutably.
    fn values_mut<T: Component>(&mut self) -> &mut [T];
}
