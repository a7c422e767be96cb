//! Convenience entry points.
//!
//! Thin wrappers that build the right context, selector, or range for the
//! common cases, so callers rarely name [`LiveContext`] directly.

use tracing::debug;

use engine_component::{Component, Entity, Payload, Query, Tag};
use engine_store::EntityStore;

use crate::array::{ArrayRange, ArrayRangeMut};
use crate::cached::CachedContext;
use crate::context::{Context, LiveContext};
use crate::error::SelectError;
use crate::selector::Selector;
use crate::view::EntityView;

/// A live selector for `Q` over `store`.
pub fn select<Q: Query, S: EntityStore>(store: &mut S) -> Selector<LiveContext<'_, S>, Q> {
    Selector::new(LiveContext::new(store))
}

/// A selector for `Q` answered from `cache`.
///
/// The cache outlives the selector, so its join is reused across passes.
pub fn cached_select<'a, 's, Q, S, K>(
    cache: &'a mut CachedContext<'s, S, K>,
) -> Selector<&'a mut CachedContext<'s, S, K>, Q>
where
    Q: Query,
    S: EntityStore,
    K: Query,
{
    Selector::new(cache)
}

/// Create a join cache over `K` in `store`.
///
/// # Errors
///
/// Returns [`SelectError::CacheUnavailable`] if the store has no room for
/// another cache.
pub fn cache<K: Query, S: EntityStore>(store: &mut S) -> Result<CachedContext<'_, S, K>, SelectError> {
    CachedContext::new(store)
}

/// Create an entity with a default `T` and return a view bound to it.
///
/// The view is invalid if the store could not create the row, e.g. because
/// `T` was never registered. Only live contexts can bind a fresh row.
pub fn create_entity<T: Component, C: Context>(ctx: &mut C) -> EntityView<'_, C, (T,)> {
    const {
        assert!(
            C::DECLARED.is_none(),
            "a fresh row is not part of any join cache; create through a live context"
        );
    };
    let row = ctx.store_mut().create(T::ID);
    let mut view = EntityView::new(ctx);
    match row {
        Some(row) => {
            view.init(row);
        }
        None => view.finish(),
    }
    view
}

/// Drop every row of `T`.
pub fn clear_type<T: Component, S: EntityStore>(store: &mut S) {
    debug!(component = T::NAME, rows = store.count(T::ID), "clearing component");
    store.clear(T::ID);
}

/// Set tag `T` on every listed entity.
pub fn group_enable<T: Tag, S: EntityStore>(store: &mut S, entities: &[Entity]) {
    store.group_enable(T::ID, entities);
}

/// Number of rows of `T` (of live entities for [`Entity`]).
#[must_use]
pub fn count<T: Component, S: EntityStore>(store: &S) -> usize {
    store.count(T::ID)
}

/// Every row of `T`, unfiltered.
#[must_use]
pub fn array<T: Payload, S: EntityStore>(store: &S) -> ArrayRange<'_, T> {
    ArrayRange::new(store)
}

/// Every row of `T`, unfiltered, mutably.
#[must_use]
pub fn array_mut<T: Payload, S: EntityStore>(store: &mut S) -> ArrayRangeMut<'_, T> {
    ArrayRangeMut::new(store)
}
