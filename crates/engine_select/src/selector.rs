//! Selectors: "for each matching entity".

use std::marker::PhantomData;

use tracing::trace;

use engine_component::Query;
use engine_component::query::validate_against;

use crate::context::Context;
use crate::view::EntityView;

/// A range of entity views over one context.
///
/// Each pass starts with [`Selector::begin`], which syncs the context once
/// and moves a fresh view to the first match. The pass ends when the view is
/// [`invalid`](EntityView::invalid), i.e. its index equals [`Selector::end`].
///
/// A selector owns its context. Pass `&mut context` to keep a cached context
/// (and its join cache) alive across selectors.
pub struct Selector<C: Context, Q: Query> {
    ctx: C,
    _query: PhantomData<fn() -> Q>,
}

impl<C: Context, Q: Query> Selector<C, Q> {
    /// Wrap `ctx`.
    pub fn new(ctx: C) -> Self {
        const { validate_against(C::DECLARED, Q::KEYS) };
        Self {
            ctx,
            _query: PhantomData,
        }
    }

    /// Sync the context and return a view on the first match.
    pub fn begin(&mut self) -> EntityView<'_, C, Q> {
        self.ctx.sync();
        let mut view = EntityView::new(&mut self.ctx);
        view.next();
        view
    }

    /// The index of a view that has run off the end.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        None
    }

    /// Run `f` on every match, in main-key order.
    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut EntityView<'_, C, Q>),
    {
        let mut visited = 0usize;
        let mut view = self.begin();
        while !view.invalid() {
            f(&mut view);
            visited += 1;
            view.next();
        }
        trace!(main = Q::KEYS[0].descriptor.name, visited, "selector pass finished");
    }

    /// Number of matches in one pass.
    pub fn count(&mut self) -> usize {
        let mut count = 0;
        self.for_each(|_| count += 1);
        count
    }

    /// Scan indices of every match in one pass.
    pub fn indices(&mut self) -> Vec<usize> {
        let mut indices = Vec::new();
        self.for_each(|view| indices.extend(view.index()));
        indices
    }

    /// The wrapped context.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// The wrapped context, mutably.
    #[must_use]
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Unwrap the context.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.ctx
    }
}

impl<C: Context, Q: Query> std::fmt::Debug for Selector<C, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("main", &Q::KEYS[0].descriptor.name)
            .field("keys", &Q::KEYS.len())
            .finish_non_exhaustive()
    }
}
