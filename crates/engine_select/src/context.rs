//! Contexts: where a view gets its rows from.
//!
//! A context answers two questions for a view: "is there a main-key row at
//! index `i`?" and "does the entity at that row hold component `c`?". The
//! [`LiveContext`] asks the store directly every time; the
//! [`CachedContext`](crate::CachedContext) answers from a join cache.

use engine_component::{ComponentDescriptor, ComponentTypeId, Entity, QueryKey};
use engine_store::{EntityStore, Slot};

/// The source of rows for an [`EntityView`](crate::EntityView).
pub trait Context {
    /// The store behind this context.
    type Store: EntityStore;

    /// The key set this context is restricted to; `None` answers any
    /// component. Views check their query against it at build time.
    const DECLARED: Option<&'static [QueryKey]>;

    /// The underlying store.
    fn store(&self) -> &Self::Store;

    /// The underlying store, mutably.
    fn store_mut(&mut self) -> &mut Self::Store;

    /// Bring the context up to date with the store.
    fn sync(&mut self);

    /// Main-key slot at scan index `index`; `None` past the end of the domain.
    fn iter(&self, main: ComponentDescriptor, index: usize) -> Option<Slot>;

    /// Slot of `component` for the entity at scan index `index`.
    fn sibling(
        &self,
        main: ComponentDescriptor,
        index: usize,
        component: ComponentDescriptor,
    ) -> Option<Slot>;

    /// The entity scan index `index` refers to.
    ///
    /// Views route removal and tag toggles through this entity, so they land
    /// on the entity that was visited even if rows moved since.
    fn entity(&self, main: ComponentDescriptor, index: usize) -> Option<Entity>;
}

impl<C: Context> Context for &mut C {
    type Store = C::Store;

    const DECLARED: Option<&'static [QueryKey]> = C::DECLARED;

    fn store(&self) -> &Self::Store {
        (**self).store()
    }

    fn store_mut(&mut self) -> &mut Self::Store {
        (**self).store_mut()
    }

    fn sync(&mut self) {
        (**self).sync();
    }

    fn iter(&self, main: ComponentDescriptor, index: usize) -> Option<Slot> {
        (**self).iter(main, index)
    }

    fn sibling(
        &self,
        main: ComponentDescriptor,
        index: usize,
        component: ComponentDescriptor,
    ) -> Option<Slot> {
        (**self).sibling(main, index, component)
    }

    fn entity(&self, main: ComponentDescriptor, index: usize) -> Option<Entity> {
        (**self).entity(main, index)
    }
}

/// A context that reads the store directly.
///
/// Every lookup reflects the store as it is now, so rows created or tags
/// toggled during a scan are visible to the rest of that scan.
#[derive(Debug)]
pub struct LiveContext<'s, S> {
    store: &'s mut S,
}

impl<'s, S: EntityStore> LiveContext<'s, S> {
    /// Wrap `store`.
    #[must_use]
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }
}

impl<S: EntityStore> Context for LiveContext<'_, S> {
    type Store = S;

    const DECLARED: Option<&'static [QueryKey]> = None;

    fn store(&self) -> &S {
        self.store
    }

    fn store_mut(&mut self) -> &mut S {
        self.store
    }

    fn sync(&mut self) {}

    fn iter(&self, main: ComponentDescriptor, index: usize) -> Option<Slot> {
        self.store.iter(main.id, index)
    }

    fn sibling(
        &self,
        main: ComponentDescriptor,
        index: usize,
        component: ComponentDescriptor,
    ) -> Option<Slot> {
        self.store.sibling(main.id, index, component.id)
    }

    fn entity(&self, main: ComponentDescriptor, index: usize) -> Option<Entity> {
        let slot = self.store.sibling(main.id, index, ComponentTypeId::EID)?;
        self.store.entity_at(slot)
    }
}
