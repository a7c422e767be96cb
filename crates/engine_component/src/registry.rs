//! Component registry: resolves component ids to descriptors.
//!
//! Ids are compile-time constants, so the registry is never consulted on the
//! iteration path. It exists to validate the id space once (no two names or
//! Rust types may share an id, nothing but the identity type may use the
//! `EID` sentinel) and to answer classification lookups for code that only
//! holds an id.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::debug;

use crate::component::{Component, ComponentDescriptor, ComponentKind, ComponentTypeId};
use crate::entity::Entity;

/// Errors raised while registering component types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two different names hash to the same id.
    #[error("component `{name}` collides with `{existing}` on {id}")]
    IdCollision {
        /// The colliding id.
        id: ComponentTypeId,
        /// The name already registered under `id`.
        existing: &'static str,
        /// The name that was rejected.
        name: &'static str,
    },

    /// The same name was registered twice with different classifications.
    #[error("component `{name}` registered as {existing:?}, not {requested:?}")]
    KindMismatch {
        /// The component name.
        name: &'static str,
        /// The classification already on record.
        existing: ComponentKind,
        /// The classification that was rejected.
        requested: ComponentKind,
    },

    /// A second Rust type claims an id already owned by another type, even
    /// though both report the same name.
    #[error("component `{name}` on {id} is a different type from the one registered")]
    TypeCollision {
        /// The contested id.
        id: ComponentTypeId,
        /// The name both types report.
        name: &'static str,
    },

    /// A non-identity component tried to use the reserved `EID` id.
    #[error("component `{0}` uses the reserved identity id")]
    ReservedId(&'static str),
}

/// Registry of every component type known to a store.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    /// Descriptors keyed by id.
    by_id: HashMap<ComponentTypeId, ComponentDescriptor>,
    /// Registration order, for stable iteration.
    order: Vec<ComponentTypeId>,
    /// The Rust type behind each id registered through [`ComponentRegistry::register`].
    types: HashMap<ComponentTypeId, TypeId>,
}

impl ComponentRegistry {
    /// Create a registry holding only the identity pseudo-component.
    #[must_use]
    pub fn new() -> Self {
        let mut by_id = HashMap::new();
        by_id.insert(Entity::ID, Entity::DESCRIPTOR);
        Self {
            by_id,
            order: vec![Entity::ID],
            types: HashMap::from([(Entity::ID, TypeId::of::<Entity>())]),
        }
    }

    /// Register component type `T`. Registering the same type again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::TypeCollision`] if another type already
    /// owns `T`'s id; see [`ComponentRegistry::insert`] for the rest.
    pub fn register<T: Component>(&mut self) -> Result<ComponentDescriptor, RegistryError> {
        let type_id = TypeId::of::<T>();
        if self.types.get(&T::ID).is_some_and(|owner| *owner != type_id) {
            return Err(RegistryError::TypeCollision {
                id: T::ID,
                name: T::NAME,
            });
        }
        let descriptor = self.insert(T::DESCRIPTOR)?;
        self.types.insert(descriptor.id, type_id);
        Ok(descriptor)
    }

    /// Register a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdCollision`] if a different name already
    /// owns the id, [`RegistryError::KindMismatch`] if the name was recorded
    /// with another classification, and [`RegistryError::ReservedId`] if a
    /// non-identity descriptor uses the `EID` sentinel.
    pub fn insert(
        &mut self,
        descriptor: ComponentDescriptor,
    ) -> Result<ComponentDescriptor, RegistryError> {
        if descriptor.id.is_eid() && !descriptor.is_identity() {
            return Err(RegistryError::ReservedId(descriptor.name));
        }

        if let Some(existing) = self.by_id.get(&descriptor.id) {
            if existing.name != descriptor.name {
                return Err(RegistryError::IdCollision {
                    id: descriptor.id,
                    existing: existing.name,
                    name: descriptor.name,
                });
            }
            if existing.kind != descriptor.kind {
                return Err(RegistryError::KindMismatch {
                    name: descriptor.name,
                    existing: existing.kind,
                    requested: descriptor.kind,
                });
            }
            return Ok(*existing);
        }

        debug!(
            name = descriptor.name,
            id = %descriptor.id,
            kind = ?descriptor.kind,
            "registered component"
        );
        self.by_id.insert(descriptor.id, descriptor);
        self.order.push(descriptor.id);
        Ok(descriptor)
    }

    /// Returns the descriptor registered under `id`.
    #[must_use]
    pub fn descriptor(&self, id: ComponentTypeId) -> Option<&ComponentDescriptor> {
        self.by_id.get(&id)
    }

    /// Returns the classification registered under `id`.
    #[must_use]
    pub fn kind(&self, id: ComponentTypeId) -> Option<ComponentKind> {
        self.by_id.get(&id).map(|d| d.kind)
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Returns an iterator over all descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Returns the number of registered types, identity included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always `false`: the identity pseudo-component is registered up front.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
