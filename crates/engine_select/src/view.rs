//! Entity views.
//!
//! An [`EntityView`] is a cursor over the main-key domain of a context. It
//! moves through four states:
//!
//! ```text
//! Uninitialized --fetch--> Scanning(i) --fetch--> Matched(i)
//!        \                     |                     |
//!         +------- eof --------+------- eof ---------+--> Finished
//! ```
//!
//! [`EntityView::fetch`] is the only transition. [`EntityView::next`] and
//! [`EntityView::init`] are built on it, and `Finished` is absorbing for
//! `next`.

use std::marker::PhantomData;

use engine_component::query::{admits, bound_position, validate_against};
use engine_component::{
    Component, ComponentDescriptor, ComponentTypeId, Entity, MAX_KEYS, Payload, Presence, Query,
    Tag,
};
use engine_store::{EntityStore, Slot};

use crate::context::Context;

/// Outcome of probing one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The row matches every key; the view is bound to it.
    Success,
    /// The row exists but fails a key; the scan continues.
    Failed,
    /// The index is past the end of the domain; the scan stops.
    Eof,
}

/// Where a view currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing fetched yet.
    Uninitialized,
    /// The last fetch at this index failed.
    Scanning(usize),
    /// Bound to a matching row at this index.
    Matched(usize),
    /// The domain is exhausted or a one-shot fetch missed.
    Finished,
}

/// A cursor binding the keys of query `Q` to successive matching rows of a
/// context.
pub struct EntityView<'c, C: Context, Q: Query> {
    ctx: &'c mut C,
    state: ViewState,
    bound: [Slot; MAX_KEYS],
    _query: PhantomData<fn() -> Q>,
}

impl<'c, C: Context, Q: Query> EntityView<'c, C, Q> {
    /// Create an uninitialized view over `ctx`.
    ///
    /// `Q` is checked against the context's declared key set at build time.
    pub fn new(ctx: &'c mut C) -> Self {
        const { validate_against(C::DECLARED, Q::KEYS) };
        Self {
            ctx,
            state: ViewState::Uninitialized,
            bound: [Slot::PRESENT; MAX_KEYS],
            _query: PhantomData,
        }
    }

    /// Create a view positioned on `entity`.
    ///
    /// Only for live contexts and queries whose main key is [`Entity`]. The
    /// view is finished if the entity is not live or fails a sub key.
    pub fn from_entity(ctx: &'c mut C, entity: Entity) -> Self {
        const {
            assert!(
                C::DECLARED.is_none(),
                "views from an entity need a live context"
            );
            assert!(
                Q::KEYS[0].descriptor.is_identity(),
                "views from an entity iterate the identity pseudo-component"
            );
        };
        let mut view = Self::new(ctx);
        match view.ctx.store().index_of(entity) {
            Some(index) => {
                view.init(index);
            }
            None => view.finish(),
        }
        view
    }

    pub(crate) fn finish(&mut self) {
        self.state = ViewState::Finished;
    }

    fn main() -> ComponentDescriptor {
        Q::KEYS[0].descriptor
    }

    /// Try index `index` and move the view accordingly.
    ///
    /// On success every present key is bound in declared order. A failed
    /// lookup leaves no binding behind. A tag row the store has vacated fails
    /// like any other mismatch.
    pub fn fetch(&mut self, index: usize) -> FetchStatus {
        let main = Self::main();
        let Some(slot) = self.ctx.iter(main, index) else {
            self.state = ViewState::Finished;
            return FetchStatus::Eof;
        };
        if main.is_tag() && self.ctx.sibling(main, index, main).is_none() {
            self.state = ViewState::Scanning(index);
            return FetchStatus::Failed;
        }

        let mut bound = [Slot::PRESENT; MAX_KEYS];
        bound[0] = slot;
        for (position, key) in Q::KEYS.iter().enumerate().skip(1) {
            let found = self.ctx.sibling(main, index, key.descriptor);
            match (key.presence, found) {
                (Presence::Required, Some(slot)) => bound[position] = slot,
                (Presence::Absent, None) => {}
                _ => {
                    self.state = ViewState::Scanning(index);
                    return FetchStatus::Failed;
                }
            }
        }

        self.bound = bound;
        self.state = ViewState::Matched(index);
        FetchStatus::Success
    }

    /// One-shot fetch at `index`. On a miss the view is finished.
    pub fn init(&mut self, index: usize) -> bool {
        if self.fetch(index) == FetchStatus::Success {
            return true;
        }
        self.state = ViewState::Finished;
        false
    }

    /// Advance to the next matching row, or finish.
    ///
    /// Returns `true` while the view is on a row. Does nothing once finished.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let mut index = match self.state {
            ViewState::Uninitialized => 0,
            ViewState::Scanning(index) | ViewState::Matched(index) => index + 1,
            ViewState::Finished => return false,
        };
        loop {
            match self.fetch(index) {
                FetchStatus::Success => return true,
                FetchStatus::Failed => index += 1,
                FetchStatus::Eof => return false,
            }
        }
    }

    /// Scan index of the bound row.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self.state {
            ViewState::Matched(index) => Some(index),
            _ => None,
        }
    }

    /// Returns `true` unless the view is bound to a row.
    #[must_use]
    pub fn invalid(&self) -> bool {
        self.index().is_none()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state
    }

    /// The context the view reads from.
    #[must_use]
    pub fn context(&self) -> &C {
        self.ctx
    }

    fn slot(&self, position: usize) -> Slot {
        assert!(!self.invalid(), "entity view is not bound to a row");
        self.bound[position]
    }

    /// The bound value of key `T`.
    ///
    /// `T` must be a present key of the query; anything else fails to build.
    ///
    /// # Panics
    ///
    /// Panics if the view is not bound to a row, or if the store changed
    /// under a cached context without a sync.
    #[must_use]
    pub fn get<T: Payload>(&self) -> &T {
        let slot = self.slot(const { bound_position(Q::KEYS, T::ID) });
        match self.ctx.store().get::<T>(slot) {
            Some(value) => value,
            None => panic!("`{}` is not stored at the bound row", T::NAME),
        }
    }

    /// The bound value of key `T`, mutably.
    ///
    /// # Panics
    ///
    /// Same as [`EntityView::get`].
    #[must_use]
    pub fn get_mut<T: Payload>(&mut self) -> &mut T {
        let slot = self.slot(const { bound_position(Q::KEYS, T::ID) });
        match self.ctx.store_mut().get_mut::<T>(slot) {
            Some(value) => value,
            None => panic!("`{}` is not stored at the bound row", T::NAME),
        }
    }

    /// The identity of the bound entity.
    #[must_use]
    pub fn entity(&self) -> Option<Entity> {
        self.ctx.entity(Self::main(), self.index()?)
    }

    /// Does the bound entity hold `T`?
    ///
    /// Queries the context on demand, so `T` need not be a query key. Under a
    /// cached context `T` must be one of the cache's keys.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        const {
            assert!(
                admits(C::DECLARED, T::DESCRIPTOR),
                "component is outside the cache's declared key set"
            );
        };
        let Some(index) = self.index() else {
            return false;
        };
        T::DESCRIPTOR.is_identity()
            || self
                .ctx
                .sibling(Self::main(), index, T::DESCRIPTOR)
                .is_some()
    }

    /// The bound entity's `T`, looked up on demand.
    #[must_use]
    pub fn sibling<T: Payload>(&self) -> Option<&T> {
        const {
            assert!(
                admits(C::DECLARED, T::DESCRIPTOR),
                "component is outside the cache's declared key set"
            );
        };
        let slot = self.ctx.sibling(Self::main(), self.index()?, T::DESCRIPTOR)?;
        self.ctx.store().get::<T>(slot)
    }

    /// The bound entity's `T`, looked up on demand, mutably.
    #[must_use]
    pub fn sibling_mut<T: Payload>(&mut self) -> Option<&mut T> {
        const {
            assert!(
                admits(C::DECLARED, T::DESCRIPTOR),
                "component is outside the cache's declared key set"
            );
        };
        let slot = self.ctx.sibling(Self::main(), self.index()?, T::DESCRIPTOR)?;
        self.ctx.store_mut().get_mut::<T>(slot)
    }

    /// Identity-array row of the bound entity. Stable until the store
    /// applies removals, unlike the rows of a tag column.
    fn identity_row(&self) -> Option<usize> {
        let entity = self.entity()?;
        self.ctx.store().index_of(entity)
    }

    /// Schedule the bound entity for removal.
    ///
    /// The row stays in place until the store applies removals, so the scan
    /// continues undisturbed.
    pub fn remove(&mut self) {
        if let Some(row) = self.identity_row() {
            self.ctx.store_mut().remove(ComponentTypeId::EID, row);
        }
    }

    /// Set tag `T` on the bound entity.
    pub fn enable_tag<T: Tag>(&mut self) {
        self.enable_tag_id(T::ID);
    }

    /// Clear tag `T` on the bound entity.
    pub fn disable_tag<T: Tag>(&mut self) {
        self.disable_tag_id(T::ID);
    }

    /// Set the tag with id `tag` on the bound entity. Unknown ids are ignored.
    pub fn enable_tag_id(&mut self, tag: ComponentTypeId) {
        if let Some(row) = self.identity_row() {
            self.ctx.store_mut().enable_tag(ComponentTypeId::EID, row, tag);
        }
    }

    /// Clear the tag with id `tag` on the bound entity.
    pub fn disable_tag_id(&mut self, tag: ComponentTypeId) {
        if let Some(row) = self.identity_row() {
            self.ctx.store_mut().disable_tag(ComponentTypeId::EID, row, tag);
        }
    }
}

impl<C: Context, Q: Query> std::fmt::Debug for EntityView<'_, C, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityView")
            .field("main", &Self::main().name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{Absent, component, tag};
    use engine_store::World;

    use super::*;
    use crate::cached::CachedContext;
    use crate::context::LiveContext;

    #[derive(Debug, Default, PartialEq)]
    struct Fuel(u32);

    #[derive(Debug, Default, PartialEq)]
    struct Cargo(u32);

    #[derive(Debug, Default)]
    struct Grounded;

    component!(Fuel, Cargo);
    tag!(Grounded);

    /// Fuel on rows 0..4, Cargo on rows 0 and 2, Grounded on row 3.
    fn depot() -> (World, Vec<Entity>) {
        let mut world = World::new();
        let entities = vec![
            world.spawn((Fuel(0), Cargo(100))).unwrap(),
            world.spawn((Fuel(1),)).unwrap(),
            world.spawn((Fuel(2), Cargo(102))).unwrap(),
            world.spawn((Fuel(3), Grounded)).unwrap(),
        ];
        (world, entities)
    }

    #[test]
    fn test_fetch_statuses() {
        let (mut world, _) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let mut view = EntityView::<_, (Fuel, Cargo)>::new(&mut ctx);
        assert_eq!(view.state(), ViewState::Uninitialized);

        assert_eq!(view.fetch(0), FetchStatus::Success);
        assert_eq!(view.state(), ViewState::Matched(0));
        assert_eq!(view.get::<Cargo>(), &Cargo(100));

        assert_eq!(view.fetch(1), FetchStatus::Failed);
        assert_eq!(view.state(), ViewState::Scanning(1));
        assert!(view.invalid());

        assert_eq!(view.fetch(4), FetchStatus::Eof);
        assert_eq!(view.state(), ViewState::Finished);
    }

    #[test]
    fn test_next_skips_failures_and_stays_finished() {
        let (mut world, _) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let mut view = EntityView::<_, (Fuel, Cargo)>::new(&mut ctx);
        assert!(view.next());
        assert_eq!(view.index(), Some(0));
        assert!(view.next());
        assert_eq!(view.index(), Some(2));
        assert_eq!(view.get::<Fuel>(), &Fuel(2));
        assert!(!view.next());
        assert_eq!(view.state(), ViewState::Finished);
        assert!(!view.next());
        assert_eq!(view.state(), ViewState::Finished);
    }

    #[test]
    fn test_absent_key() {
        let (mut world, _) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let mut view = EntityView::<_, (Fuel, Absent<Cargo>)>::new(&mut ctx);
        let mut seen = Vec::new();
        while view.next() {
            seen.push(view.get::<Fuel>().0);
        }
        assert_eq!(seen, vec![1, 3]);
    }

    #[test]
    fn test_init_pins_or_finishes() {
        let (mut world, _) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let mut view = EntityView::<_, (Fuel, Grounded)>::new(&mut ctx);
        assert!(view.init(3));
        assert_eq!(view.index(), Some(3));
        assert!(!view.init(1));
        assert_eq!(view.state(), ViewState::Finished);
    }

    #[test]
    fn test_get_mut_writes_through() {
        let (mut world, _) = depot();
        {
            let mut ctx = LiveContext::new(&mut world);
            let mut view = EntityView::<_, (Fuel,)>::new(&mut ctx);
            assert!(view.init(1));
            view.get_mut::<Fuel>().0 = 41;
        }
        assert_eq!(world.values::<Fuel>()[1], Fuel(41));
    }

    #[test]
    #[should_panic(expected = "not bound to a row")]
    fn test_get_on_unbound_view_panics() {
        let (mut world, _) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let view = EntityView::<_, (Fuel,)>::new(&mut ctx);
        let _ = view.get::<Fuel>();
    }

    #[test]
    fn test_entity_and_lookups() {
        let (mut world, entities) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let mut view = EntityView::<_, (Fuel,)>::new(&mut ctx);
        assert_eq!(view.entity(), None);
        assert!(!view.has::<Entity>());

        assert!(view.init(2));
        assert_eq!(view.entity(), Some(entities[2]));
        assert!(view.has::<Entity>());
        assert!(view.has::<Cargo>());
        assert!(!view.has::<Grounded>());
        assert_eq!(view.sibling::<Cargo>(), Some(&Cargo(102)));

        view.sibling_mut::<Cargo>().unwrap().0 = 7;
        assert_eq!(view.sibling::<Cargo>(), Some(&Cargo(7)));
    }

    #[test]
    fn test_identity_sub_key_binds() {
        let (mut world, entities) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let mut view = EntityView::<_, (Cargo, Entity)>::new(&mut ctx);
        assert!(view.next());
        assert!(view.next());
        assert_eq!(view.entity(), Some(entities[2]));
    }

    #[test]
    fn test_tag_toggle_is_immediate_in_live_context() {
        let (mut world, _) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let mut view = EntityView::<_, (Fuel,)>::new(&mut ctx);
        assert!(view.init(0));
        view.enable_tag::<Grounded>();
        assert!(view.has::<Grounded>());
        view.disable_tag::<Grounded>();
        assert!(!view.has::<Grounded>());
        view.enable_tag_id(Grounded::ID);
        assert!(view.has::<Grounded>());
        view.disable_tag_id(Grounded::ID);
        assert!(!view.has::<Grounded>());
    }

    #[test]
    fn test_remove_is_deferred() {
        let (mut world, entities) = depot();
        {
            let mut ctx = LiveContext::new(&mut world);
            let mut view = EntityView::<_, (Fuel,)>::new(&mut ctx);
            assert!(view.init(1));
            view.remove();
            assert!(view.next());
            assert_eq!(view.index(), Some(2));
        }
        assert!(world.is_pending_removal(entities[1]));
        assert_eq!(world.update(), 1);
        assert_eq!(world.count(Fuel::ID), 3);
    }

    #[test]
    fn test_from_entity() {
        let (mut world, entities) = depot();
        let mut ctx = LiveContext::new(&mut world);
        let view = EntityView::<_, (Entity, Cargo)>::from_entity(&mut ctx, entities[2]);
        assert_eq!(view.entity(), Some(entities[2]));
        assert_eq!(view.get::<Cargo>(), &Cargo(102));

        let view = EntityView::<_, (Entity, Cargo)>::from_entity(&mut ctx, entities[1]);
        assert!(view.invalid());
        let view = EntityView::<_, (Entity,)>::from_entity(&mut ctx, Entity::from_raw(999));
        assert_eq!(view.state(), ViewState::Finished);
    }

    #[test]
    fn test_cached_view_translates_rows() {
        let (mut world, entities) = depot();
        {
            let mut ctx = CachedContext::<_, (Fuel, Cargo)>::new(&mut world).unwrap();
            ctx.sync();
            let mut view = EntityView::<_, (Fuel, Cargo)>::new(&mut ctx);
            // Cached index 1 is the entity on Fuel row 2.
            assert!(view.init(1));
            assert_eq!(view.get::<Fuel>(), &Fuel(2));
            assert_eq!(view.entity(), Some(entities[2]));
            view.remove();
        }
        assert!(world.is_pending_removal(entities[2]));
    }

    #[test]
    fn test_cached_tag_toggle_needs_sync() {
        let (mut world, _) = depot();
        let mut ctx = CachedContext::<_, (Fuel, Grounded)>::new(&mut world).unwrap();
        ctx.sync();
        assert_eq!(ctx.len(), 1);
        {
            let mut view = EntityView::<_, (Fuel,)>::new(&mut ctx);
            assert!(view.init(0));
            view.disable_tag::<Grounded>();
            assert!(view.has::<Grounded>());
        }
        ctx.sync();
        assert_eq!(ctx.len(), 0);
    }
}
