//! The in-memory reference store.
//!
//! [`World`] keeps one entity-sorted [`Column`] per registered component, an
//! identity array of every live entity, and a slab of join caches. Entity ids
//! only grow, so spawning appends to every column it touches.
//!
//! ## Tags
//!
//! Enabling a tag inserts its row in entity order, or takes back the row the
//! entity vacated earlier. Disabling vacates the row in place: the entity
//! stops holding the tag at once, but no other row of the tag moves. A scan
//! over a tag may therefore clear it on the entity it is visiting. Enabling
//! a tag on some other entity inserts a row and may shift later rows.
//!
//! ## Removal
//!
//! Removal is deferred. [`EntityStore::remove`] only marks the entity; its
//! rows stay visible and every row index stays stable until
//! [`World::update`] compacts the columns, dropping vacated tag rows as
//! well. Scans may therefore remove the row they are visiting without
//! disturbing their own iteration. Join caches must be synced again after an
//! update.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace, warn};

use engine_component::{
    Component, ComponentDescriptor, ComponentKind, ComponentRegistry, ComponentTypeId, Entity,
    EntityAllocator,
};

use crate::bundle::Bundle;
use crate::cache::{CacheHandle, CacheSlab, JoinCache, KeyRows};
use crate::column::{AnyColumn, Column};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::{EntityStore, Slot};

/// The reference entity store.
#[derive(Debug)]
pub struct World {
    /// Store configuration.
    config: StoreConfig,
    /// Component descriptors.
    registry: ComponentRegistry,
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Every live entity, sorted; the identity "column".
    entities: Vec<Entity>,
    /// One column per registered non-identity component.
    columns: HashMap<ComponentTypeId, Box<dyn AnyColumn>>,
    /// Entities marked for removal at the next update.
    pending: BTreeSet<Entity>,
    /// Live join caches.
    caches: CacheSlab,
}

impl World {
    /// Create an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty world.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            registry: ComponentRegistry::new(),
            allocator: EntityAllocator::new(),
            entities: Vec::with_capacity(config.entity_capacity),
            columns: HashMap::new(),
            pending: BTreeSet::new(),
            caches: CacheSlab::new(config.max_caches),
            config,
        }
    }

    /// Returns the configuration the world was built with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Register component type `T` and create its column.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Registry`] if the registry rejects `T`.
    pub fn register<T: Component>(&mut self) -> Result<ComponentDescriptor, StoreError> {
        let descriptor = self.registry.register::<T>()?;
        if !descriptor.is_identity() {
            let capacity = self.config.entity_capacity;
            self.columns
                .entry(descriptor.id)
                .or_insert_with(|| Box::new(Column::<T>::with_capacity(capacity)));
        }
        Ok(descriptor)
    }

    /// Create an entity holding every component of `bundle`.
    ///
    /// Component types are registered on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle names a component twice, names the
    /// identity pseudo-component, or a type fails to register. Nothing is
    /// created in that case.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Result<Entity, StoreError> {
        B::register(self)?;
        let entity = self.allocator.allocate();
        self.entities.push(entity);
        bundle.insert(self, entity)?;
        trace!(%entity, "spawned entity");
        Ok(entity)
    }

    /// Fail unless `T`'s column exists and stores `T`.
    pub(crate) fn check_column<T: Component>(&self) -> Result<(), StoreError> {
        match self.column::<T>() {
            Some(_) => Ok(()),
            None => Err(StoreError::ColumnType(T::NAME)),
        }
    }

    /// Append `value` to `T`'s column for `entity`.
    pub(crate) fn push_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<(), StoreError> {
        let column = self
            .column_mut::<T>()
            .ok_or(StoreError::ColumnType(T::NAME))?;
        match column.insert(entity, value) {
            Ok(_) => Ok(()),
            Err(_) => Err(StoreError::RowExists {
                component: T::NAME,
                entity,
            }),
        }
    }

    /// The typed column of `T`.
    #[must_use]
    pub fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns.get(&T::ID)?.as_any().downcast_ref()
    }

    /// The typed column of `T`, mutably.
    #[must_use]
    pub fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns.get_mut(&T::ID)?.as_any_mut().downcast_mut()
    }

    /// Every live entity, in creation order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns `true` if `entity` is live (pending removal included).
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.binary_search(&entity).is_ok()
    }

    /// Returns `true` if `entity` is marked for removal at the next update.
    #[must_use]
    pub fn is_pending_removal(&self, entity: Entity) -> bool {
        self.pending.contains(&entity)
    }

    /// Number of live join caches.
    #[must_use]
    pub fn live_caches(&self) -> usize {
        self.caches.live()
    }

    /// Apply pending removals and drop vacated tag rows; returns the number
    /// of entities purged.
    ///
    /// Row indices shift afterwards, so join caches must be synced again.
    pub fn update(&mut self) -> usize {
        let removed: Vec<Entity> = std::mem::take(&mut self.pending).into_iter().collect();
        let mut rows = 0;
        for column in self.columns.values_mut() {
            rows += column.purge(&removed);
        }
        if removed.is_empty() {
            if rows > 0 {
                trace!(rows, "dropped vacated tag rows");
            }
            return 0;
        }
        let before = self.entities.len();
        self.entities
            .retain(|entity| removed.binary_search(entity).is_err());
        let purged = before - self.entities.len();
        debug!(
            purged,
            rows,
            remaining = self.entities.len(),
            "applied pending removals"
        );
        purged
    }

    /// The entity owning row `index` of `main`; `None` for a vacated row.
    fn entity_of(&self, main: ComponentTypeId, index: usize) -> Option<Entity> {
        if main.is_eid() {
            return self.entities.get(index).copied();
        }
        self.columns.get(&main)?.entity_at(index)
    }

    /// Rows of `id`'s column, vacated ones included.
    fn rows(&self, id: ComponentTypeId) -> usize {
        if id.is_eid() {
            return self.entities.len();
        }
        self.columns.get(&id).map_or(0, |column| column.len())
    }

    /// The tag column `tag`, if `tag` is a registered tag.
    fn tag_column_mut(&mut self, tag: ComponentTypeId) -> Option<&mut Box<dyn AnyColumn>> {
        if self.registry.kind(tag) != Some(ComponentKind::Tag) {
            return None;
        }
        self.columns.get_mut(&tag)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for World {
    fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    fn iter(&self, id: ComponentTypeId, index: usize) -> Option<Slot> {
        (index < self.rows(id)).then_some(Slot::new(index))
    }

    fn sibling(&self, main: ComponentTypeId, index: usize, id: ComponentTypeId) -> Option<Slot> {
        let entity = self.entity_of(main, index)?;
        if id == main {
            return Some(Slot::new(index));
        }
        if id.is_eid() {
            return self.index_of(entity).map(Slot::new);
        }
        self.columns.get(&id)?.position(entity).map(Slot::new)
    }

    fn count(&self, id: ComponentTypeId) -> usize {
        if id.is_eid() {
            return self.entities.len();
        }
        self.columns.get(&id).map_or(0, |column| column.occupied())
    }

    fn create(&mut self, id: ComponentTypeId) -> Option<usize> {
        let kind = self.registry.kind(id)?;
        if kind != ComponentKind::Identity && !self.columns.contains_key(&id) {
            return None;
        }
        let entity = self.allocator.allocate();
        self.entities.push(entity);
        trace!(%entity, component = %id, "created entity");
        match kind {
            ComponentKind::Identity => Some(self.entities.len() - 1),
            ComponentKind::Normal | ComponentKind::Tag => self
                .columns
                .get_mut(&id)
                .map(|column| column.insert_default(entity)),
        }
    }

    fn remove(&mut self, main: ComponentTypeId, index: usize) {
        if let Some(entity) = self.entity_of(main, index) {
            self.pending.insert(entity);
        }
    }

    fn index_of(&self, entity: Entity) -> Option<usize> {
        self.entities.binary_search(&entity).ok()
    }

    fn clear(&mut self, id: ComponentTypeId) {
        if let Some(column) = self.columns.get_mut(&id) {
            debug!(component = column.descriptor().name, rows = column.len(), "cleared component");
            column.clear();
        }
    }

    fn enable_tag(&mut self, main: ComponentTypeId, index: usize, tag: ComponentTypeId) {
        let Some(entity) = self.entity_of(main, index) else {
            return;
        };
        if let Some(column) = self.tag_column_mut(tag) {
            column.insert_default(entity);
        }
    }

    fn disable_tag(&mut self, main: ComponentTypeId, index: usize, tag: ComponentTypeId) {
        let Some(entity) = self.entity_of(main, index) else {
            return;
        };
        if let Some(column) = self.tag_column_mut(tag) {
            column.vacate(entity);
        }
    }

    fn group_enable(&mut self, tag: ComponentTypeId, entities: &[Entity]) {
        let Self {
            registry,
            entities: live,
            columns,
            ..
        } = self;
        if registry.kind(tag) != Some(ComponentKind::Tag) {
            return;
        }
        let Some(column) = columns.get_mut(&tag) else {
            return;
        };
        for entity in entities {
            if live.binary_search(entity).is_ok() {
                column.insert_default(*entity);
            }
        }
    }

    fn cache_create(&mut self, keys: &[ComponentTypeId]) -> Option<CacheHandle> {
        if keys.is_empty() {
            return None;
        }
        let Some(handle) = self.caches.insert(JoinCache::new(keys)) else {
            warn!(limit = self.config.max_caches, "join cache limit reached");
            return None;
        };
        debug!(?handle, keys = keys.len(), "created join cache");
        Some(handle)
    }

    fn cache_fetch(&self, cache: CacheHandle, index: usize, id: ComponentTypeId) -> Option<Slot> {
        self.caches.get(cache)?.fetch(index, id).map(Slot::new)
    }

    fn cache_entity(&self, cache: CacheHandle, index: usize) -> Option<Entity> {
        self.caches.get(cache)?.entity(index)
    }

    fn cache_sync(&mut self, cache: CacheHandle) -> usize {
        let Self {
            entities,
            columns,
            caches,
            ..
        } = self;
        let Some(join) = caches.get_mut(cache) else {
            return 0;
        };
        let (entities, columns) = (entities.as_slice(), &*columns);
        let lists: Vec<KeyRows<'_>> = join
            .keys()
            .iter()
            .map(|id| match columns.get(id) {
                _ if id.is_eid() => KeyRows::new(entities),
                Some(column) => KeyRows {
                    entities: column.entities(),
                    vacant: column.vacant(),
                },
                None => KeyRows::new(&[]),
            })
            .collect();
        let matched = join.rebuild(&lists);
        trace!(?cache, matched, "synced join cache");
        matched
    }

    fn cache_release(&mut self, cache: CacheHandle) {
        if self.caches.remove(cache) {
            debug!(?cache, "released join cache");
        }
    }

    fn get<T: Component>(&self, slot: Slot) -> Option<&T> {
        self.column::<T>()?.get(slot.row())
    }

    fn get_mut<T: Component>(&mut self, slot: Slot) -> Option<&mut T> {
        self.column_mut::<T>()?.get_mut(slot.row())
    }

    fn entity_at(&self, slot: Slot) -> Option<Entity> {
        self.entities.get(slot.row()).copied()
    }

    fn values<T: Component>(&self) -> &[T] {
        match self.column::<T>() {
            Some(column) => column.values(),
            None => &[],
        }
    }

    fn values_mut<T: Component>(&mut self) -> &mut [T] {
        match self.column_mut::<T>() {
            Some(column) => column.values_mut(),
            None => &mut [],
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_component::RegistryError;

    use super::*;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Position(i32);

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    struct Velocity(i32);

    #[derive(Debug, Default)]
    struct Dead;

    engine_component::component!(Position, Velocity);
    engine_component::tag!(Dead);

    fn world_with_rows() -> (World, Vec<Entity>) {
        let mut world = World::new();
        let a = world.spawn((Position(0), Velocity(10))).unwrap();
        let b = world.spawn((Position(1),)).unwrap();
        let c = world.spawn((Position(2), Velocity(12), Dead)).unwrap();
        (world, vec![a, b, c])
    }

    #[test]
    fn test_spawn_appends_rows() {
        let (world, entities) = world_with_rows();
        assert_eq!(world.count(Position::ID), 3);
        assert_eq!(world.count(Velocity::ID), 2);
        assert_eq!(world.count(Dead::ID), 1);
        assert_eq!(world.count(ComponentTypeId::EID), 3);
        assert_eq!(world.entities(), entities.as_slice());
        assert_eq!(world.values::<Position>(), &[Position(0), Position(1), Position(2)]);
    }

    #[test]
    fn test_spawn_rejects_duplicate_component() {
        let mut world = World::new();
        let err = world.spawn((Position(0), Position(1))).unwrap_err();
        assert_eq!(err, StoreError::DuplicateComponent("Position"));
        assert!(world.entities().is_empty());
    }

    #[test]
    fn test_spawn_rejects_identity() {
        let mut world = World::new();
        assert_eq!(
            world.spawn((Position(0), Entity::INVALID)).unwrap_err(),
            StoreError::IdentityInBundle
        );
    }

    mod land {
        #[derive(Debug, Default, PartialEq)]
        pub struct Speed(pub u32);
        engine_component::component!(Speed);
    }

    mod sea {
        #[derive(Debug, Default, PartialEq)]
        pub struct Speed(pub f32);
        engine_component::component!(Speed);
    }

    #[derive(Debug, Default)]
    struct Impostor;

    impl Component for Impostor {
        const NAME: &'static str = "Position";
        const KIND: ComponentKind = ComponentKind::Normal;
        const ID: ComponentTypeId = Position::ID;
    }

    #[test]
    fn test_same_short_name_gets_own_column() {
        let mut world = World::new();
        let walker = world.spawn((land::Speed(1),)).unwrap();
        let sailor = world.spawn((sea::Speed(2.5),)).unwrap();
        assert_eq!(world.values::<land::Speed>(), &[land::Speed(1)]);
        assert_eq!(world.values::<sea::Speed>(), &[sea::Speed(2.5)]);
        assert_eq!(world.sibling(ComponentTypeId::EID, 0, sea::Speed::ID), None);
        assert!(world.contains(walker) && world.contains(sailor));
    }

    #[test]
    fn test_spawn_rejects_second_type_on_taken_id() {
        let mut world = World::new();
        world.spawn((Position(0),)).unwrap();
        let err = world.spawn((Velocity(1), Impostor)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Registry(RegistryError::TypeCollision { .. })
        ));
        assert_eq!(world.entities().len(), 1);
        assert_eq!(world.count(Velocity::ID), 0);
    }

    #[test]
    fn test_push_into_occupied_row_fails() {
        let (mut world, entities) = world_with_rows();
        assert_eq!(
            world.push_component(entities[0], Position(9)),
            Err(StoreError::RowExists {
                component: "Position",
                entity: entities[0],
            })
        );
        assert_eq!(
            world.push_component(entities[1], Impostor),
            Err(StoreError::ColumnType("Position"))
        );
        assert_eq!(world.values::<Position>()[0], Position(0));
    }

    #[test]
    fn test_disable_keeps_rows_until_update() {
        let (mut world, entities) = world_with_rows();
        world.group_enable(Dead::ID, &entities);
        world.disable_tag(ComponentTypeId::EID, 0, Dead::ID);
        assert_eq!(world.count(Dead::ID), 2);
        assert_eq!(world.iter(Dead::ID, 2), Some(Slot::new(2)));
        assert_eq!(world.sibling(Dead::ID, 0, Dead::ID), None);
        assert_eq!(world.sibling(Dead::ID, 1, ComponentTypeId::EID), Some(Slot::new(1)));

        assert_eq!(world.update(), 0);
        assert_eq!(world.iter(Dead::ID, 2), None);
        assert_eq!(world.sibling(Dead::ID, 0, ComponentTypeId::EID), Some(Slot::new(1)));
    }

    #[test]
    fn test_cache_skips_vacated_tag_rows() {
        let (mut world, entities) = world_with_rows();
        world.group_enable(Dead::ID, &entities);
        world.disable_tag(ComponentTypeId::EID, 1, Dead::ID);
        let cache = world.cache_create(&[Dead::ID, Position::ID]).unwrap();
        assert_eq!(world.cache_sync(cache), 2);
        assert_eq!(world.cache_entity(cache, 0), Some(entities[0]));
        assert_eq!(world.cache_entity(cache, 1), Some(entities[2]));
        assert_eq!(world.cache_entity(cache, 2), None);
    }

    #[test]
    fn test_iter_and_count_agree() {
        let (world, _) = world_with_rows();
        assert_eq!(world.iter(Position::ID, 2), Some(Slot::new(2)));
        assert_eq!(world.iter(Position::ID, 3), None);
        assert_eq!(world.iter(Velocity::ID, 2), None);
    }

    #[test]
    fn test_sibling_lookup() {
        let (world, entities) = world_with_rows();
        // Position row 2 belongs to `c`, whose Velocity is row 1.
        let slot = world.sibling(Position::ID, 2, Velocity::ID).unwrap();
        assert_eq!(world.get::<Velocity>(slot), Some(&Velocity(12)));
        assert_eq!(world.sibling(Position::ID, 1, Velocity::ID), None);
        assert_eq!(world.sibling(Position::ID, 2, Dead::ID), Some(Slot::new(0)));

        let eid = world.sibling(Velocity::ID, 1, ComponentTypeId::EID).unwrap();
        assert_eq!(world.entity_at(eid), Some(entities[2]));
    }

    #[test]
    fn test_create_default_row() {
        let mut world = World::new();
        world.register::<Position>().unwrap();
        let row = world.create(Position::ID).unwrap();
        assert_eq!(row, 0);
        assert_eq!(world.get::<Position>(Slot::new(row)), Some(&Position(0)));
        assert_eq!(world.create(ComponentTypeId(12345)), None);
    }

    #[test]
    fn test_removal_is_deferred_until_update() {
        let (mut world, entities) = world_with_rows();
        world.remove(Position::ID, 0);
        assert!(world.is_pending_removal(entities[0]));
        assert_eq!(world.count(Position::ID), 3);

        assert_eq!(world.update(), 1);
        assert_eq!(world.count(Position::ID), 2);
        assert_eq!(world.count(Velocity::ID), 1);
        assert!(!world.contains(entities[0]));
        assert_eq!(world.values::<Position>(), &[Position(1), Position(2)]);
        assert_eq!(world.update(), 0);
    }

    #[test]
    fn test_tag_toggle_is_immediate() {
        let (mut world, _) = world_with_rows();
        world.enable_tag(Position::ID, 0, Dead::ID);
        assert_eq!(world.count(Dead::ID), 2);
        assert!(world.sibling(Position::ID, 0, Dead::ID).is_some());

        world.disable_tag(Position::ID, 2, Dead::ID);
        assert!(world.sibling(Position::ID, 2, Dead::ID).is_none());

        // Non-tag ids are ignored.
        world.enable_tag(Position::ID, 1, Velocity::ID);
        assert!(world.sibling(Position::ID, 1, Velocity::ID).is_none());
    }

    #[test]
    fn test_group_enable() {
        let (mut world, entities) = world_with_rows();
        world.group_enable(Dead::ID, &[entities[0], entities[1], Entity::from_raw(999)]);
        assert_eq!(world.count(Dead::ID), 3);
    }

    #[test]
    fn test_clear_component() {
        let (mut world, _) = world_with_rows();
        world.clear(Velocity::ID);
        assert_eq!(world.count(Velocity::ID), 0);
        assert_eq!(world.count(Position::ID), 3);
    }

    #[test]
    fn test_cache_join_and_snapshot() {
        let (mut world, _) = world_with_rows();
        let cache = world
            .cache_create(&[Position::ID, Velocity::ID])
            .unwrap();
        assert_eq!(world.cache_sync(cache), 2);
        assert_eq!(world.cache_fetch(cache, 1, Position::ID), Some(Slot::new(2)));
        assert_eq!(world.cache_fetch(cache, 1, Velocity::ID), Some(Slot::new(1)));

        world.spawn((Position(3), Velocity(13))).unwrap();
        assert_eq!(world.cache_fetch(cache, 2, Position::ID), None);
        assert_eq!(world.cache_sync(cache), 3);
        assert_eq!(world.cache_fetch(cache, 2, Position::ID), Some(Slot::new(3)));

        world.cache_release(cache);
        assert_eq!(world.live_caches(), 0);
        assert_eq!(world.cache_sync(cache), 0);
    }

    #[test]
    fn test_cache_over_identity() {
        let (mut world, _) = world_with_rows();
        let cache = world
            .cache_create(&[ComponentTypeId::EID, Dead::ID])
            .unwrap();
        assert_eq!(world.cache_sync(cache), 1);
        assert_eq!(world.cache_fetch(cache, 0, ComponentTypeId::EID), Some(Slot::new(2)));
    }

    #[test]
    fn test_cache_limit() {
        let mut world = World::with_config(StoreConfig::default().with_max_caches(1));
        let first = world.cache_create(&[Position::ID]).unwrap();
        assert!(world.cache_create(&[Position::ID]).is_none());
        world.cache_release(first);
        assert!(world.cache_create(&[Position::ID]).is_some());
    }
}
