//! Raw array ranges.
//!
//! An array range walks one payload column from its first row to its last:
//! no join, no filter. Use it for whole-column passes where every row is
//! wanted anyway.

use std::ops::{Index, IndexMut};

use engine_component::Payload;
use engine_store::EntityStore;

/// Rows `[first, first + count)` of one payload column.
#[derive(Debug)]
pub struct ArrayRange<'s, T> {
    values: &'s [T],
}

impl<'s, T: Payload> ArrayRange<'s, T> {
    /// Every row of `T` in `store`.
    #[must_use]
    pub fn new<S: EntityStore>(store: &'s S) -> Self {
        let values = store.values::<T>();
        debug_assert_eq!(values.len(), store.count(T::ID));
        Self { values }
    }
}

impl<'s, T> ArrayRange<'s, T> {
    /// First row of the range.
    #[must_use]
    pub fn first(&self) -> usize {
        0
    }

    /// Number of rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the range has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&'s T> {
        self.values.get(row)
    }

    /// The rows as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &'s [T] {
        self.values
    }

    /// Iterate the rows in order.
    pub fn iter(&self) -> std::slice::Iter<'s, T> {
        self.values.iter()
    }
}

impl<T> Index<usize> for ArrayRange<'_, T> {
    type Output = T;

    fn index(&self, row: usize) -> &T {
        &self.values[row]
    }
}

impl<'s, T> IntoIterator for &ArrayRange<'s, T> {
    type Item = &'s T;
    type IntoIter = std::slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<'s, T> IntoIterator for ArrayRange<'s, T> {
    type Item = &'s T;
    type IntoIter = std::slice::Iter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Rows `[first, first + count)` of one payload column, mutably.
#[derive(Debug)]
pub struct ArrayRangeMut<'s, T> {
    values: &'s mut [T],
}

impl<'s, T: Payload> ArrayRangeMut<'s, T> {
    /// Every row of `T` in `store`.
    #[must_use]
    pub fn new<S: EntityStore>(store: &'s mut S) -> Self {
        Self {
            values: store.values_mut::<T>(),
        }
    }
}

impl<T> ArrayRangeMut<'_, T> {
    /// First row of the range.
    #[must_use]
    pub fn first(&self) -> usize {
        0
    }

    /// Number of rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the range has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.values.get(row)
    }

    /// Value at `row`, mutably.
    #[must_use]
    pub fn get_mut(&mut self, row: usize) -> Option<&mut T> {
        self.values.get_mut(row)
    }

    /// The rows as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.values
    }

    /// The rows as a mutable slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.values
    }

    /// Iterate the rows in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Iterate the rows in order, mutably.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.values.iter_mut()
    }
}

impl<T> Index<usize> for ArrayRangeMut<'_, T> {
    type Output = T;

    fn index(&self, row: usize) -> &T {
        &self.values[row]
    }
}

impl<T> IndexMut<usize> for ArrayRangeMut<'_, T> {
    fn index_mut(&mut self, row: usize) -> &mut T {
        &mut self.values[row]
    }
}

impl<'a, T> IntoIterator for &'a mut ArrayRangeMut<'_, T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter_mut()
    }
}

impl<'s, T> IntoIterator for ArrayRangeMut<'s, T> {
    type Item = &'s mut T;
    type IntoIter = std::slice::IterMut<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter_mut()
    }
}
