//! The [`Component`] trait and the metadata a selector needs about a type.
//!
//! Everything here is known at compile time: a component's id is an FNV-1a
//! hash computed by a `const fn`, and its classification is an associated
//! constant. The [`component!`](crate::component) and [`tag!`](crate::tag)
//! macros hash the type's full module path, so two types that share a short
//! name in different modules still get distinct ids, and ids agree across
//! processes built from the same source.

use serde::{Deserialize, Serialize};

/// Stable id of a component type: the FNV-1a 64 hash of a name.
///
/// The value [`ComponentTypeId::EID`] is reserved: it stands for entity
/// identity and never names a real column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// Reserved id of the identity pseudo-component.
    pub const EID: Self = Self(u64::MAX);

    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Hash `name` with FNV-1a 64.
    ///
    /// Usable in constants, which is how [`Component::ID`] gets its default.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut state = Self::FNV_OFFSET;
        let mut at = 0;
        while at < bytes.len() {
            state = (state ^ bytes[at] as u64).wrapping_mul(Self::FNV_PRIME);
            at += 1;
        }
        Self(state)
    }

    /// Compute the [`ComponentTypeId`] for a component type `T`.
    #[must_use]
    pub const fn of<T: Component>() -> Self {
        T::ID
    }

    /// Returns `true` if this is the identity sentinel.
    #[must_use]
    pub const fn is_eid(self) -> bool {
        self.0 == Self::EID.0
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_eid() {
            write!(f, "ComponentTypeId(EID)")
        } else {
            write!(f, "ComponentTypeId({:#018x})", self.0)
        }
    }
}

/// Classification of a component type.
///
/// This is the single dispatch field the contexts switch on; there is no
/// other way a component's behaviour is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// A typed data column.
    Normal,
    /// A payload-less boolean flag.
    Tag,
    /// The identity pseudo-component; present for every entity, no storage.
    Identity,
}

/// Immutable description of one component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentDescriptor {
    /// The stable type identifier.
    pub id: ComponentTypeId,
    /// The component's classification.
    pub kind: ComponentKind,
    /// The human-readable name of the component (e.g. `"Position"`).
    pub name: &'static str,
}

impl ComponentDescriptor {
    /// Create a descriptor whose id is hashed from `name`.
    #[must_use]
    pub const fn new(name: &'static str, kind: ComponentKind) -> Self {
        Self {
            id: ComponentTypeId::from_name(name),
            kind,
            name,
        }
    }

    /// Returns `true` for tag components.
    #[must_use]
    pub const fn is_tag(&self) -> bool {
        matches!(self.kind, ComponentKind::Tag)
    }

    /// Returns `true` for the identity pseudo-component.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self.kind, ComponentKind::Identity)
    }
}

/// A type that can be stored per entity and named in a query.
///
/// Implement it through the [`component!`](crate::component) and
/// [`tag!`](crate::tag) macros, which also add the [`Payload`] / [`Tag`]
/// marker that gates typed access.
///
/// # Examples
///
/// ```rust
/// use engine_component::{Component, ComponentKind, ComponentTypeId, component};
///
/// #[derive(Debug, Default, Clone, Copy)]
/// struct Orbit {
///     radius: f32,
///     period: f32,
/// }
///
/// component!(Orbit);
///
/// assert_eq!(Orbit::NAME, "Orbit");
/// assert_eq!(Orbit::KIND, ComponentKind::Normal);
/// assert_ne!(Orbit::ID, ComponentTypeId::from_name("Orbit"));
/// ```
pub trait Component: Default + 'static {
    /// Short type name, for logs and registry dumps.
    const NAME: &'static str;

    /// The component's classification.
    const KIND: ComponentKind;

    /// The stable id; FNV-1a of [`Component::NAME`] unless overridden. The
    /// macros override it with the hash of the type's module path.
    const ID: ComponentTypeId = ComponentTypeId::from_name(Self::NAME);

    /// The full descriptor, as stored by the registry.
    const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
        id: Self::ID,
        kind: Self::KIND,
        name: Self::NAME,
    };
}

/// Marker for components that own a value column and can be read through a view.
pub trait Payload: Component {}

/// Marker for payload-less flag components.
///
/// Tags expose presence checks and enable/disable operations only; reading a
/// tag's value does not compile.
pub trait Tag: Component {}

/// Implement [`Component`] and [`Payload`] for one or more data types.
#[macro_export]
macro_rules! component {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Component for $ty {
                const NAME: &'static str = stringify!($ty);
                const KIND: $crate::ComponentKind = $crate::ComponentKind::Normal;
                const ID: $crate::ComponentTypeId = $crate::ComponentTypeId::from_name(
                    concat!(module_path!(), "::", stringify!($ty)),
                );
            }

            impl $crate::Payload for $ty {}
        )+
    };
}

/// Implement [`Component`] and [`Tag`] for one or more zero-sized types.
#[macro_export]
macro_rules! tag {
    ($($ty:ty),+ $(,)?) => {
        $(
            const _: () = assert!(
                ::core::mem::size_of::<$ty>() == 0,
                "tag components must be zero-sized"
            );

            impl $crate::Component for $ty {
                const NAME: &'static str = stringify!($ty);
                const KIND: $crate::ComponentKind = $crate::ComponentKind::Tag;
                const ID: $crate::ComponentTypeId = $crate::ComponentTypeId::from_name(
                    concat!(module_path!(), "::", stringify!($ty)),
                );
            }

            impl $crate::Tag for $ty {}
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Mana(u32);

    #[derive(Debug, Default)]
    struct Stamina;

    #[derive(Debug, Default)]
    struct Silenced;

    crate::component!(Mana);
    crate::tag!(Silenced);

    impl Component for Stamina {
        const NAME: &'static str = "Stamina";
        const KIND: ComponentKind = ComponentKind::Normal;
        const ID: ComponentTypeId = ComponentTypeId(42);
    }

    mod north {
        #[derive(Debug, Default)]
        pub struct Speed(pub u32);
        crate::component!(Speed);
    }

    mod south {
        #[derive(Debug, Default)]
        pub struct Speed(pub f32);
        crate::component!(Speed);
    }

    #[test]
    fn test_id_is_path_hash() {
        assert_eq!(
            Mana::ID,
            ComponentTypeId::from_name(concat!(module_path!(), "::Mana"))
        );
        assert_eq!(Mana::NAME, "Mana");
        assert_eq!(ComponentTypeId::of::<Mana>(), Mana::ID);
        assert_ne!(Mana::ID, Silenced::ID);
    }

    #[test]
    fn test_same_short_name_distinct_ids() {
        assert_eq!(north::Speed::NAME, south::Speed::NAME);
        assert_ne!(north::Speed::ID, south::Speed::ID);
    }

    #[test]
    fn test_fnv_reference_values() {
        assert_eq!(ComponentTypeId::from_name("").0, 0xcbf2_9ce4_8422_2325);
        assert_eq!(ComponentTypeId::from_name("a").0, 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_id_override() {
        assert_eq!(Stamina::ID, ComponentTypeId(42));
        assert_eq!(Stamina::DESCRIPTOR.id, ComponentTypeId(42));
    }

    #[test]
    fn test_descriptor_classification() {
        assert_eq!(Mana::DESCRIPTOR.id, Mana::ID);
        assert_eq!(Mana::DESCRIPTOR.kind, ComponentKind::Normal);
        assert!(!Mana::DESCRIPTOR.is_tag());
        assert!(Silenced::DESCRIPTOR.is_tag());
        assert!(!Silenced::DESCRIPTOR.is_identity());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ComponentTypeId::EID.to_string(), "ComponentTypeId(EID)");
        assert_eq!(ComponentTypeId(0xff).to_string(), "ComponentTypeId(0x00000000000000ff)");
    }

    #[test]
    fn test_kind_json() {
        assert_eq!(serde_json::to_string(&ComponentKind::Tag).unwrap(), "\"Tag\"");
        let kind: ComponentKind = serde_json::from_str("\"Identity\"").unwrap();
        assert_eq!(kind, ComponentKind::Identity);
    }
}
