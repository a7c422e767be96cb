//! Statically declared queries.
//!
//! A query is a tuple of component types: the first element is the **main
//! key** whose column defines the iteration domain, every following element
//! is a **sub key** checked against each main-key row. A sub key is either a
//! component (must be present) or [`Absent<T>`] (must be absent).
//!
//! ```rust
//! use engine_component::{Absent, Query, Presence, component, tag};
//!
//! #[derive(Debug, Default)]
//! struct Position;
//! #[derive(Debug, Default)]
//! struct Frozen;
//!
//! component!(Position);
//! tag!(Frozen);
//!
//! type Movable = (Position, Absent<Frozen>);
//! assert_eq!(<Movable as Query>::KEYS.len(), 2);
//! assert_eq!(<Movable as Query>::KEYS[1].presence, Presence::Absent);
//! ```
//!
//! Everything about a query is known at compile time. The `const fn`
//! validators in this module are evaluated in `const` blocks by the selector
//! crate, so a malformed query fails the build instead of failing a scan.

use std::marker::PhantomData;

use crate::component::{Component, ComponentDescriptor, ComponentKind, ComponentTypeId};

/// Maximum number of keys (main key included) in one query.
pub const MAX_KEYS: usize = 8;

/// Whether a sub key must be present or absent on a matching row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The component must be present.
    Required,
    /// The component must be absent.
    Absent,
}

/// One key of a query: a component plus its presence requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryKey {
    /// The component this key refers to.
    pub descriptor: ComponentDescriptor,
    /// Whether the component must be present or absent.
    pub presence: Presence,
}

impl QueryKey {
    /// A key that requires the component to be present.
    #[must_use]
    pub const fn required(descriptor: ComponentDescriptor) -> Self {
        Self {
            descriptor,
            presence: Presence::Required,
        }
    }

    /// A key that requires the component to be absent.
    #[must_use]
    pub const fn absent(descriptor: ComponentDescriptor) -> Self {
        Self {
            descriptor,
            presence: Presence::Absent,
        }
    }

    /// Returns `true` for [`Presence::Absent`] keys.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self.presence, Presence::Absent)
    }
}

/// Query combinator: the wrapped component must be absent.
pub struct Absent<T>(PhantomData<fn() -> T>);

/// A single element of a query tuple.
pub trait QueryTerm: 'static {
    /// The key this term contributes.
    const KEY: QueryKey;
}

impl<T: Component> QueryTerm for T {
    const KEY: QueryKey = QueryKey::required(T::DESCRIPTOR);
}

impl<T: Component> QueryTerm for Absent<T> {
    const KEY: QueryKey = QueryKey::absent(T::DESCRIPTOR);
}

/// An ordered list of keys, main key first.
///
/// Implemented for tuples of one to [`MAX_KEYS`] elements whose first element
/// is a plain component.
pub trait Query: 'static {
    /// The component whose column is iterated.
    type Main: Component;

    /// Every key in declared order; `KEYS[0]` is the main key.
    const KEYS: &'static [QueryKey];
}

macro_rules! impl_query {
    ($($sub:ident),*) => {
        impl<M: Component, $($sub: QueryTerm),*> Query for (M, $($sub,)*) {
            type Main = M;
            const KEYS: &'static [QueryKey] = &[QueryKey::required(M::DESCRIPTOR), $($sub::KEY),*];
        }
    };
}

impl_query!();
impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);
impl_query!(A, B, C, D);
impl_query!(A, B, C, D, E);
impl_query!(A, B, C, D, E, F);
impl_query!(A, B, C, D, E, F, G);

/// Position of `id` in `keys`, if any.
#[must_use]
pub const fn key_position(keys: &[QueryKey], id: ComponentTypeId) -> Option<usize> {
    let mut i = 0;
    while i < keys.len() {
        if keys[i].descriptor.id.0 == id.0 {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Build-time membership test: is `id` one of `keys`?
#[must_use]
pub const fn key_set_contains(keys: &[QueryKey], id: ComponentTypeId) -> bool {
    key_position(keys, id).is_some()
}

/// Position of a present (non-absent) key; panics during const evaluation
/// when the query does not bind `id`.
#[must_use]
pub const fn bound_position(keys: &[QueryKey], id: ComponentTypeId) -> usize {
    match key_position(keys, id) {
        Some(position) if !keys[position].is_absent() => position,
        Some(_) => panic!("an absent key has no value to read"),
        None => panic!("component is not part of this query"),
    }
}

/// Validate a query's key list.
///
/// Panics (at build time when called from a `const` block) if the query has
/// too many keys, names a component twice, or requires the identity
/// pseudo-component to be absent.
pub const fn validate_query(keys: &[QueryKey]) {
    assert!(!keys.is_empty(), "a query needs a main key");
    assert!(keys.len() <= MAX_KEYS, "a query holds at most MAX_KEYS keys");
    assert!(!keys[0].is_absent(), "the main key cannot be absent");

    let mut i = 0;
    while i < keys.len() {
        if keys[i].is_absent() && matches!(keys[i].descriptor.kind, ComponentKind::Identity) {
            panic!("every entity has an identity; Absent<Entity> can never match");
        }
        let mut j = i + 1;
        while j < keys.len() {
            if keys[i].descriptor.id.0 == keys[j].descriptor.id.0 {
                panic!("a query lists the same component twice");
            }
            j += 1;
        }
        i += 1;
    }
}

/// Validate the key set of a join cache: a valid query with no absent keys.
pub const fn validate_cache_keys(keys: &[QueryKey]) {
    validate_query(keys);
    let mut i = 0;
    while i < keys.len() {
        assert!(
            !keys[i].is_absent(),
            "a join cache only records present components"
        );
        i += 1;
    }
}

/// Validate `keys` against the key set a context is restricted to.
///
/// `declared == None` means the context answers any component. Otherwise the
/// query must iterate the declared main key, every non-identity key must be
/// declared, and no key may be absent.
pub const fn validate_against(declared: Option<&[QueryKey]>, keys: &[QueryKey]) {
    validate_query(keys);
    if let Some(declared) = declared {
        assert!(
            declared[0].descriptor.id.0 == keys[0].descriptor.id.0,
            "a cached selector must iterate the cache's main key"
        );
        let mut i = 1;
        while i < keys.len() {
            assert!(
                !keys[i].is_absent(),
                "absent keys cannot be answered from a join cache"
            );
            assert!(
                admits(Some(declared), keys[i].descriptor),
                "component is outside the cache's declared key set"
            );
            i += 1;
        }
    }
}

/// Can a context restricted to `declared` answer lookups for `descriptor`?
#[must_use]
pub const fn admits(declared: Option<&[QueryKey]>, descriptor: ComponentDescriptor) -> bool {
    match declared {
        None => true,
        Some(keys) => descriptor.is_identity() || key_set_contains(keys, descriptor.id),
    }
}
