//! The join-cache backed context.

use std::marker::PhantomData;

use tracing::trace;

use engine_component::query::validate_cache_keys;
use engine_component::{
    ComponentDescriptor, ComponentKind, ComponentTypeId, Entity, Query, QueryKey,
};
use engine_store::{CacheHandle, EntityStore, Slot};

use crate::context::Context;
use crate::error::SelectError;

/// A context answering from a join cache over the key tuple `K`.
///
/// The cache is created with the context and released when it drops. Scan
/// index `i` addresses the `i`-th matched row of the last [`sync`], so the
/// context only reflects store changes after the next sync; selectors sync
/// once when a pass begins.
///
/// Views over a cached context may only name components from `K` (plus the
/// identity pseudo-component) and must iterate `K`'s main key. Anything else
/// fails to build.
///
/// The cache remembers which entity each matched row belongs to. Identity
/// lookups, removal and tag toggles go through that entity, so they never
/// reach a different entity even when tag rows moved since the sync.
///
/// [`sync`]: Context::sync
pub struct CachedContext<'s, S: EntityStore, K: Query> {
    store: &'s mut S,
    handle: CacheHandle,
    len: usize,
    _keys: PhantomData<fn() -> K>,
}

impl<'s, S: EntityStore, K: Query> CachedContext<'s, S, K> {
    /// Create the join cache over `K` in `store`.
    ///
    /// The cache starts empty; call [`Context::sync`] (or begin a selector
    /// pass) to fill it.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::CacheUnavailable`] if the store refuses to
    /// create another cache.
    pub fn new(store: &'s mut S) -> Result<Self, SelectError> {
        const { validate_cache_keys(K::KEYS) };
        let ids: Vec<ComponentTypeId> = K::KEYS.iter().map(|key| key.descriptor.id).collect();
        let handle = store
            .cache_create(&ids)
            .ok_or(SelectError::CacheUnavailable { keys: ids.len() })?;
        Ok(Self {
            store,
            handle,
            len: 0,
            _keys: PhantomData,
        })
    }

    /// Matched rows as of the last sync.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the last sync matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The store-side cache handle.
    #[must_use]
    pub fn handle(&self) -> CacheHandle {
        self.handle
    }
}

impl<S: EntityStore, K: Query> Context for CachedContext<'_, S, K> {
    type Store = S;

    const DECLARED: Option<&'static [QueryKey]> = Some(K::KEYS);

    fn store(&self) -> &S {
        self.store
    }

    fn store_mut(&mut self) -> &mut S {
        self.store
    }

    fn sync(&mut self) {
        self.len = self.store.cache_sync(self.handle);
        trace!(handle = ?self.handle, matched = self.len, "synced cached context");
    }

    fn iter(&self, main: ComponentDescriptor, index: usize) -> Option<Slot> {
        match main.kind {
            ComponentKind::Tag => (index < self.len).then_some(Slot::PRESENT),
            ComponentKind::Normal => self.store.cache_fetch(self.handle, index, main.id),
            ComponentKind::Identity => {
                let row = self.store.cache_fetch(self.handle, index, main.id)?.row();
                self.store.iter(ComponentTypeId::EID, row)
            }
        }
    }

    fn sibling(
        &self,
        main: ComponentDescriptor,
        index: usize,
        component: ComponentDescriptor,
    ) -> Option<Slot> {
        if component.is_identity() {
            let entity = self.entity(main, index)?;
            return self.store.index_of(entity).map(Slot::new);
        }
        self.store.cache_fetch(self.handle, index, component.id)
    }

    fn entity(&self, _main: ComponentDescriptor, index: usize) -> Option<Entity> {
        self.store.cache_entity(self.handle, index)
    }
}

impl<S: EntityStore, K: Query> Drop for CachedContext<'_, S, K> {
    fn drop(&mut self) {
        self.store.cache_release(self.handle);
    }
}

impl<S: EntityStore, K: Query> std::fmt::Debug for CachedContext<'_, S, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedContext")
            .field("handle", &self.handle)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{Component, Entity, component, tag};
    use engine_store::{StoreConfig, World};

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Hull(u32);

    #[derive(Debug, Default, PartialEq)]
    struct Shield(u32);

    #[derive(Debug, Default)]
    struct Docked;

    component!(Hull, Shield);
    tag!(Docked);

    fn fleet() -> World {
        let mut world = World::new();
        world.spawn((Hull(10), Shield(1))).unwrap();
        world.spawn((Hull(20),)).unwrap();
        world.spawn((Hull(30), Shield(3), Docked)).unwrap();
        world
    }

    #[test]
    fn test_len_follows_sync() {
        let mut world = fleet();
        let mut ctx = CachedContext::<_, (Hull, Shield)>::new(&mut world).unwrap();
        assert!(ctx.is_empty());
        ctx.sync();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.iter(Hull::DESCRIPTOR, 1), Some(Slot::new(2)));
        assert_eq!(ctx.sibling(Hull::DESCRIPTOR, 1, Shield::DESCRIPTOR), Some(Slot::new(1)));
        assert!(ctx.iter(Hull::DESCRIPTOR, 2).is_none());
    }

    #[test]
    fn test_release_on_drop() {
        let mut world = fleet();
        {
            let mut ctx = CachedContext::<_, (Hull,)>::new(&mut world).unwrap();
            ctx.sync();
        }
        assert_eq!(world.live_caches(), 0);
    }

    #[test]
    fn test_cache_unavailable() {
        let mut world = World::with_config(StoreConfig::default().with_max_caches(0));
        let err = CachedContext::<_, (Hull, Shield)>::new(&mut world).unwrap_err();
        assert_eq!(err, SelectError::CacheUnavailable { keys: 2 });
    }

    #[test]
    fn test_tag_main_key_is_presence_only() {
        let mut world = fleet();
        let mut ctx = CachedContext::<_, (Docked, Hull)>::new(&mut world).unwrap();
        ctx.sync();
        assert_eq!(ctx.iter(Docked::DESCRIPTOR, 0), Some(Slot::PRESENT));
        assert_eq!(ctx.iter(Docked::DESCRIPTOR, 1), None);
        assert_eq!(ctx.entity(Docked::DESCRIPTOR, 0), ctx.store().entities().get(2).copied());
    }

    #[test]
    fn test_identity_resolved_through_cached_row() {
        let mut world = fleet();
        let third = world.entities()[2];
        let mut ctx = CachedContext::<_, (Hull, Docked)>::new(&mut world).unwrap();
        ctx.sync();
        let slot = ctx.sibling(Hull::DESCRIPTOR, 0, Entity::DESCRIPTOR).unwrap();
        assert_eq!(ctx.store().entity_at(slot), Some(third));
    }

    #[test]
    fn test_matched_entity_survives_tag_shift() {
        let mut world = fleet();
        let third = world.entities()[2];
        let mut ctx = CachedContext::<_, (Docked, Hull)>::new(&mut world).unwrap();
        ctx.sync();
        // Docking an older entity inserts a tag row ahead of the cached one.
        ctx.store_mut().enable_tag(ComponentTypeId::EID, 0, Docked::ID);
        assert_eq!(ctx.entity(Docked::DESCRIPTOR, 0), Some(third));
        let slot = ctx.sibling(Docked::DESCRIPTOR, 0, Entity::DESCRIPTOR).unwrap();
        assert_eq!(ctx.store().entity_at(slot), Some(third));
    }

    #[test]
    fn test_identity_main_key() {
        let mut world = fleet();
        let third = world.entities()[2];
        let mut ctx = CachedContext::<_, (Entity, Docked)>::new(&mut world).unwrap();
        ctx.sync();
        let slot = ctx.iter(Entity::DESCRIPTOR, 0).unwrap();
        assert_eq!(ctx.store().entity_at(slot), Some(third));
        assert!(ctx.iter(Entity::DESCRIPTOR, 1).is_none());
    }
}
