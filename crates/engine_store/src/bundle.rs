//! Spawn bundles.
//!
//! A bundle is a tuple of component values handed to [`World::spawn`]. Tags
//! may appear in a bundle like any other component; the identity
//! pseudo-component may not.

use engine_component::{Component, ComponentTypeId, Entity};

use crate::error::StoreError;
use crate::world::World;

/// A set of component values spawned together as one entity.
pub trait Bundle: 'static {
    /// Ids of every component in the bundle, in order.
    fn ids() -> Vec<ComponentTypeId>;

    /// Validate the bundle and register its component types.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate component, on the identity pseudo-component,
    /// when the registry rejects a type, or when a type's column stores
    /// something else.
    fn register(world: &mut World) -> Result<(), StoreError>;

    /// Move every value into the world's columns for `entity`.
    ///
    /// # Errors
    ///
    /// Fails if a column is missing, mistyped, or already holds `entity`.
    fn insert(self, world: &mut World, entity: Entity) -> Result<(), StoreError>;
}

/// Reject duplicates and the identity pseudo-component.
fn check_ids(ids: &[ComponentTypeId], names: &[&'static str]) -> Result<(), StoreError> {
    for (i, id) in ids.iter().enumerate() {
        if id.is_eid() {
            return Err(StoreError::IdentityInBundle);
        }
        if ids[..i].contains(id) {
            return Err(StoreError::DuplicateComponent(names[i]));
        }
    }
    Ok(())
}

macro_rules! impl_bundle {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> Bundle for ($($ty,)+) {
            fn ids() -> Vec<ComponentTypeId> {
                vec![$($ty::ID),+]
            }

            fn register(world: &mut World) -> Result<(), StoreError> {
                check_ids(&Self::ids(), &[$($ty::NAME),+])?;
                $(
                    world.register::<$ty>()?;
                    world.check_column::<$ty>()?;
                )+
                Ok(())
            }

            #[allow(non_snake_case)]
            fn insert(self, world: &mut World, entity: Entity) -> Result<(), StoreError> {
                let ($($ty,)+) = self;
                $(world.push_component(entity, $ty)?;)+
                Ok(())
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Health(u32);

    #[derive(Debug, Default)]
    struct Armor(u32);

    #[derive(Debug, Default)]
    struct Boss;

    engine_component::component!(Health, Armor);
    engine_component::tag!(Boss);

    #[test]
    fn test_bundle_ids_in_order() {
        assert_eq!(
            <(Health, Armor, Boss)>::ids(),
            vec![Health::ID, Armor::ID, Boss::ID]
        );
    }

    #[test]
    fn test_check_ids() {
        assert!(check_ids(&[Health::ID, Boss::ID], &["Health", "Boss"]).is_ok());
        assert_eq!(
            check_ids(&[Health::ID, Armor::ID, Health::ID], &["Health", "Armor", "Health"]),
            Err(StoreError::DuplicateComponent("Health"))
        );
        assert_eq!(
            check_ids(&[ComponentTypeId::EID], &["Entity"]),
            Err(StoreError::IdentityInBundle)
        );
    }

    #[test]
    fn test_register_creates_columns() {
        let mut world = World::new();
        <(Health, Boss)>::register(&mut world).unwrap();
        assert!(world.column::<Health>().is_some());
        assert!(world.column::<Boss>().is_some());
        assert!(world.column::<Armor>().is_none());
    }
}
