//! # engine_select
//!
//! Statically typed selection over an [`EntityStore`](engine_store::EntityStore).
//!
//! - [`Context`]: where rows come from: the store itself ([`LiveContext`]) or
//!   a join cache ([`CachedContext`]).
//! - [`EntityView`]: a cursor binding a query's keys to one matching row.
//! - [`Selector`]: "for each matching entity" over one context.
//! - [`ArrayRange`] / [`ArrayRangeMut`]: unfiltered whole-column passes.
//! - [`ops`]: one-call helpers for the common cases.
//!
//! ```rust
//! use engine_component::{Absent, component, tag};
//! use engine_select::ops;
//! use engine_store::World;
//!
//! #[derive(Debug, Default)]
//! struct Position(f32);
//! #[derive(Debug, Default)]
//! struct Velocity(f32);
//! #[derive(Debug, Default)]
//! struct Frozen;
//!
//! component!(Position, Velocity);
//! tag!(Frozen);
//!
//! let mut world = World::new();
//! world.spawn((Position(0.0), Velocity(1.0))).unwrap();
//! world.spawn((Position(5.0), Velocity(1.0), Frozen)).unwrap();
//!
//! ops::select::<(Position, Velocity, Absent<Frozen>), _>(&mut world).for_each(|view| {
//!     let dv = view.get::<Velocity>().0;
//!     view.get_mut::<Position>().0 += dv;
//! });
//! ```
//!
//! ## Build-time checks
//!
//! Query shape errors do not compile. Reading a tag's value:
//!
//! ```compile_fail
//! # use engine_component::{component, tag};
//! # use engine_select::ops;
//! # use engine_store::World;
//! # #[derive(Default)] struct Position(f32);
//! # #[derive(Default)] struct Frozen;
//! # component!(Position);
//! # tag!(Frozen);
//! let mut world = World::new();
//! ops::select::<(Position, Frozen), _>(&mut world).for_each(|view| {
//!     let _ = view.get::<Frozen>();
//! });
//! ```
//!
//! Reading a component the query does not bind:
//!
//! ```compile_fail
//! # use engine_component::component;
//! # use engine_select::ops;
//! # use engine_store::World;
//! # #[derive(Default)] struct Position(f32);
//! # #[derive(Default)] struct Velocity(f32);
//! # component!(Position, Velocity);
//! let mut world = World::new();
//! ops::select::<(Position,), _>(&mut world).for_each(|view| {
//!     let _ = view.get::<Velocity>();
//! });
//! ```
//!
//! Probing a cached context outside its key set:
//!
//! ```compile_fail
//! # use engine_component::component;
//! # use engine_select::ops;
//! # use engine_store::World;
//! # #[derive(Default)] struct Position(f32);
//! # #[derive(Default)] struct Velocity(f32);
//! # #[derive(Default)] struct Mass(f32);
//! # component!(Position, Velocity, Mass);
//! let mut world = World::new();
//! let mut cache = ops::cache::<(Position, Velocity), _>(&mut world).unwrap();
//! ops::cached_select::<(Position, Mass), _, _>(&mut cache).count();
//! ```
//!
//! Absence in a join cache, or absence of the identity:
//!
//! ```compile_fail
//! # use engine_component::{Absent, component, tag};
//! # use engine_select::ops;
//! # use engine_store::World;
//! # #[derive(Default)] struct Position(f32);
//! # #[derive(Default)] struct Frozen;
//! # component!(Position);
//! # tag!(Frozen);
//! let mut world = World::new();
//! let _ = ops::cache::<(Position, Absent<Frozen>), _>(&mut world);
//! ```
//!
//! ```compile_fail
//! # use engine_component::{Absent, Entity, component};
//! # use engine_select::ops;
//! # use engine_store::World;
//! # #[derive(Default)] struct Position(f32);
//! # component!(Position);
//! let mut world = World::new();
//! ops::select::<(Position, Absent<Entity>), _>(&mut world).count();
//! ```

pub mod array;
pub mod cached;
pub mod context;
pub mod error;
pub mod ops;
pub mod selector;
pub mod view;

pub use array::{ArrayRange, ArrayRangeMut};
pub use cached::CachedContext;
pub use context::{Context, LiveContext};
pub use error::SelectError;
pub use selector::Selector;
pub use view::{EntityView, FetchStatus, ViewState};
