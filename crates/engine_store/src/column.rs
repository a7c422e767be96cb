//! Component columns.
//!
//! A [`Column`] stores one component type as two parallel vectors: the owning
//! entities, sorted ascending, and the values. Tags use the same layout with a
//! zero-sized value type, so their value vector never allocates.
//!
//! Rows can be vacated in place. A vacated row keeps its position, so rows
//! after it do not move, but it no longer counts as holding the component.
//! [`AnyColumn::purge`] drops vacated rows.

use std::any::Any;

use engine_component::{Component, ComponentDescriptor, Entity};

/// Type-erased view of a [`Column`], used where only the component id is known.
pub trait AnyColumn: Any {
    /// Upcast for downcasting to the typed column.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting to the typed column.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Descriptor of the stored component.
    fn descriptor(&self) -> ComponentDescriptor;

    /// Owning entities in row order.
    fn entities(&self) -> &[Entity];

    /// Vacancy flag per row; empty while no row is vacant.
    fn vacant(&self) -> &[bool];

    /// Number of rows, vacated ones included.
    fn len(&self) -> usize;

    /// Returns `true` if the column has no rows.
    fn is_empty(&self) -> bool;

    /// Number of rows that are not vacant.
    fn occupied(&self) -> usize;

    /// Owner of `row`, unless the row is vacant.
    fn entity_at(&self, row: usize) -> Option<Entity>;

    /// Row of `entity`, if it holds this component.
    fn position(&self, entity: Entity) -> Option<usize>;

    /// Give `entity` a default value; returns its row. Existing rows are
    /// kept, and a vacated row is taken back in place.
    fn insert_default(&mut self, entity: Entity) -> usize;

    /// Vacate `entity`'s row without moving any other row. Returns `true` if
    /// it held the component.
    fn vacate(&mut self, entity: Entity) -> bool;

    /// Drop vacated rows and every row owned by an entity in `removed`
    /// (sorted). Returns the number of rows dropped.
    fn purge(&mut self, removed: &[Entity]) -> usize;

    /// Drop every row.
    fn clear(&mut self);
}

impl std::fmt::Debug for dyn AnyColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("component", &self.descriptor().name)
            .field("rows", &self.len())
            .finish()
    }
}

/// A column of `T` values keyed by entity.
#[derive(Debug, Clone)]
pub struct Column<T> {
    entities: Vec<Entity>,
    values: Vec<T>,
    vacant: Vec<bool>,
    vacancies: usize,
}

impl<T: Component> Column<T> {
    /// Create an empty column.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty column with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            vacant: Vec::new(),
            vacancies: 0,
        }
    }

    /// Insert `value` for `entity`, keeping rows sorted by entity.
    ///
    /// Returns `Ok(row)` for a new or revived row, or `Err(row)` if `entity`
    /// already has one (the existing value is kept). Inserting the newest
    /// entity is a push.
    pub fn insert(&mut self, entity: Entity, value: T) -> Result<usize, usize> {
        match self.entities.last() {
            Some(&last) if last >= entity => {}
            _ => {
                self.entities.push(entity);
                self.values.push(value);
                if !self.vacant.is_empty() {
                    self.vacant.push(false);
                }
                return Ok(self.entities.len() - 1);
            }
        }
        match self.entities.binary_search(&entity) {
            Ok(row) if self.is_vacant(row) => {
                self.values[row] = value;
                self.vacant[row] = false;
                self.vacancies -= 1;
                Ok(row)
            }
            Ok(row) => Err(row),
            Err(row) => {
                self.entities.insert(row, entity);
                self.values.insert(row, value);
                if !self.vacant.is_empty() {
                    self.vacant.insert(row, false);
                }
                Ok(row)
            }
        }
    }

    /// Returns `true` if `row` was vacated since the last purge.
    #[must_use]
    pub fn is_vacant(&self, row: usize) -> bool {
        self.vacant.get(row).copied().unwrap_or(false)
    }

    /// Value at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&T> {
        self.values.get(row)
    }

    /// Mutable value at `row`.
    #[must_use]
    pub fn get_mut(&mut self, row: usize) -> Option<&mut T> {
        self.values.get_mut(row)
    }

    /// All values in row order.
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// All values in row order, mutably.
    #[must_use]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }
}

impl<T: Component> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> AnyColumn for Column<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn descriptor(&self) -> ComponentDescriptor {
        T::DESCRIPTOR
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn vacant(&self) -> &[bool] {
        &self.vacant
    }

    fn len(&self) -> usize {
        self.entities.len()
    }

    fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn occupied(&self) -> usize {
        self.entities.len() - self.vacancies
    }

    fn entity_at(&self, row: usize) -> Option<Entity> {
        if self.is_vacant(row) {
            return None;
        }
        self.entities.get(row).copied()
    }

    fn position(&self, entity: Entity) -> Option<usize> {
        let row = self.entities.binary_search(&entity).ok()?;
        (!self.is_vacant(row)).then_some(row)
    }

    fn insert_default(&mut self, entity: Entity) -> usize {
        match self.insert(entity, T::default()) {
            Ok(row) | Err(row) => row,
        }
    }

    fn vacate(&mut self, entity: Entity) -> bool {
        let Some(row) = self.position(entity) else {
            return false;
        };
        if self.vacant.is_empty() {
            self.vacant.resize(self.entities.len(), false);
        }
        self.vacant[row] = true;
        self.vacancies += 1;
        true
    }

    fn purge(&mut self, removed: &[Entity]) -> usize {
        if removed.is_empty() && self.vacancies == 0 {
            return 0;
        }
        let len = self.entities.len();
        let mut keep = 0;
        for row in 0..len {
            if !self.is_vacant(row) && removed.binary_search(&self.entities[row]).is_err() {
                // Rows in keep..row are all purged, so swapping keeps order.
                self.entities.swap(keep, row);
                self.values.swap(keep, row);
                keep += 1;
            }
        }
        self.entities.truncate(keep);
        self.values.truncate(keep);
        self.vacant.clear();
        self.vacancies = 0;
        len - keep
    }

    fn clear(&mut self) {
        self.entities.clear();
        self.values.clear();
        self.vacant.clear();
        self.vacancies = 0;
    }
}
