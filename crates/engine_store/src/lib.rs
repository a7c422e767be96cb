//! # engine_store
//!
//! Columnar entity storage for the selector engine.
//!
//! - [`EntityStore`]: the contract the selector layer is written against:
//!   array access, sibling lookup, tags, and join-cache primitives. Misses
//!   are `None`, never errors.
//! - [`World`]: the in-memory reference store: entity-sorted [`Column`]s,
//!   deferred removal, and a slab of [`JoinCache`]s.
//! - [`Bundle`]: tuples of component values spawned as one entity.
//!
//! ```rust
//! use engine_component::{Component, component};
//! use engine_store::{EntityStore, World};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Score(u32);
//! component!(Score);
//!
//! let mut world = World::new();
//! world.spawn((Score(3),)).unwrap();
//! assert_eq!(world.count(Score::ID), 1);
//! assert_eq!(world.values::<Score>(), &[Score(3)]);
//! ```

pub mod bundle;
pub mod cache;
pub mod column;
pub mod config;
pub mod error;
pub mod store;
pub mod world;

pub use bundle::Bundle;
pub use cache::{CacheHandle, CacheSlab, JoinCache, KeyRows};
pub use column::{AnyColumn, Column};
pub use config::StoreConfig;
pub use error::StoreError;
pub use store::{EntityStore, Slot};
pub use world::World;
