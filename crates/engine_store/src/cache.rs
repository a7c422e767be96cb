//! Join caches.
//!
//! A [`JoinCache`] records, for a fixed key list, every main-key row whose
//! entity holds all the other keys, together with the matched entity and the
//! row of each key in its own column. It is only rebuilt on request; between
//! rebuilds it describes the store as it was at the last sync. The matched
//! entity stays correct even when a tag row has since moved.

use engine_component::{ComponentTypeId, Entity};

/// Handle to a cache living in a store.
///
/// The generation makes a handle that outlived its cache miss instead of
/// aliasing a newer cache that reused the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheHandle {
    index: u32,
    generation: u32,
}

/// The rows of one key as a rebuild sees them.
#[derive(Debug, Clone, Copy)]
pub struct KeyRows<'a> {
    /// Owning entity per row, sorted.
    pub entities: &'a [Entity],
    /// Vacancy flag per row; empty when no row is vacant.
    pub vacant: &'a [bool],
}

impl<'a> KeyRows<'a> {
    /// Rows with no vacancies.
    #[must_use]
    pub fn new(entities: &'a [Entity]) -> Self {
        Self {
            entities,
            vacant: &[],
        }
    }

    fn holds(&self, row: usize) -> bool {
        !self.vacant.get(row).copied().unwrap_or(false)
    }
}

/// Matched rows of one join, flattened row-major: one slot per key per row.
#[derive(Debug, Clone)]
pub struct JoinCache {
    keys: Vec<ComponentTypeId>,
    rows: Vec<usize>,
    matched: Vec<Entity>,
    cursors: Vec<usize>,
}

impl JoinCache {
    /// Create an empty cache over `keys` (main key first).
    #[must_use]
    pub fn new(keys: &[ComponentTypeId]) -> Self {
        Self {
            keys: keys.to_vec(),
            rows: Vec::new(),
            matched: Vec::new(),
            cursors: vec![0; keys.len().saturating_sub(1)],
        }
    }

    /// The key list, main key first.
    #[must_use]
    pub fn keys(&self) -> &[ComponentTypeId] {
        &self.keys
    }

    /// Matched row count as of the last rebuild.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matched.len()
    }

    /// Returns `true` if the last rebuild matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// The entity matched at `index`.
    #[must_use]
    pub fn entity(&self, index: usize) -> Option<Entity> {
        self.matched.get(index).copied()
    }

    /// Row of key `id` in matched row `index`.
    #[must_use]
    pub fn fetch(&self, index: usize, id: ComponentTypeId) -> Option<usize> {
        if index >= self.matched.len() {
            return None;
        }
        let key = self.keys.iter().position(|&k| k == id)?;
        self.rows.get(index * self.keys.len() + key).copied()
    }

    /// Recompute the join from the entity lists of every key, in key order.
    ///
    /// Every list is sorted by entity, so each secondary key is walked with a
    /// single forward cursor: one pass over all lists in total. Vacant rows
    /// never match.
    pub fn rebuild(&mut self, lists: &[KeyRows<'_>]) -> usize {
        self.rows.clear();
        self.matched.clear();

        let Some((main, others)) = lists.split_first() else {
            return 0;
        };
        self.cursors.clear();
        self.cursors.resize(others.len(), 0);

        'rows: for (row, entity) in main.entities.iter().enumerate() {
            if !main.holds(row) {
                continue;
            }
            for (list, cursor) in others.iter().zip(self.cursors.iter_mut()) {
                let entities = list.entities;
                while *cursor < entities.len() && entities[*cursor] < *entity {
                    *cursor += 1;
                }
                if *cursor == entities.len() {
                    // This key has nothing left at or after `entity`.
                    break 'rows;
                }
                if entities[*cursor] != *entity || !list.holds(*cursor) {
                    continue 'rows;
                }
            }
            self.rows.push(row);
            self.rows.extend_from_slice(&self.cursors);
            self.matched.push(*entity);
        }
        self.matched.len()
    }
}

#[derive(Debug)]
struct CacheEntry {
    generation: u32,
    cache: Option<JoinCache>,
}

/// Slab of live caches with slot reuse.
#[derive(Debug)]
pub struct CacheSlab {
    entries: Vec<CacheEntry>,
    free: Vec<u32>,
    live: usize,
    limit: usize,
}

impl CacheSlab {
    /// Create an empty slab admitting at most `limit` live caches.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
            limit,
        }
    }

    /// Store `cache`; `None` when the limit is reached.
    pub fn insert(&mut self, cache: JoinCache) -> Option<CacheHandle> {
        if self.live >= self.limit {
            return None;
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.entries.len()).ok()?;
                self.entries.push(CacheEntry {
                    generation: 0,
                    cache: None,
                });
                index
            }
        };
        let entry = &mut self.entries[index as usize];
        entry.cache = Some(cache);
        self.live += 1;
        Some(CacheHandle {
            index,
            generation: entry.generation,
        })
    }

    /// The cache behind `handle`, if it is still alive.
    #[must_use]
    pub fn get(&self, handle: CacheHandle) -> Option<&JoinCache> {
        let entry = self.entries.get(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.cache.as_ref()
    }

    /// Mutable access to the cache behind `handle`.
    pub fn get_mut(&mut self, handle: CacheHandle) -> Option<&mut JoinCache> {
        let entry = self.entries.get_mut(handle.index as usize)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.cache.as_mut()
    }

    /// Free the cache behind `handle`. Returns `true` if it was alive.
    pub fn remove(&mut self, handle: CacheHandle) -> bool {
        let Some(entry) = self.entries.get_mut(handle.index as usize) else {
            return false;
        };
        if entry.generation != handle.generation || entry.cache.is_none() {
            return false;
        }
        entry.cache = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        true
    }

    /// Number of live caches.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ents(ids: &[u64]) -> Vec<Entity> {
        ids.iter().copied().map(Entity::from_raw).collect()
    }

    fn rows(entities: &[Entity]) -> KeyRows<'_> {
        KeyRows::new(entities)
    }

    #[test]
    fn test_rebuild_intersects_sorted_lists() {
        let a = ents(&[1, 2, 3, 4, 7]);
        let b = ents(&[1, 3, 7, 9]);
        let c = ents(&[0, 3, 4, 7]);
        let mut cache = JoinCache::new(&[
            ComponentTypeId(1),
            ComponentTypeId(2),
            ComponentTypeId(3),
        ]);

        assert_eq!(cache.rebuild(&[rows(&a), rows(&b), rows(&c)]), 2);
        assert_eq!(cache.entity(0), Some(Entity::from_raw(3)));
        assert_eq!(cache.entity(1), Some(Entity::from_raw(7)));
        assert_eq!(cache.entity(2), None);
        // entity 3: a row 2, b row 1, c row 1
        assert_eq!(cache.fetch(0, ComponentTypeId(1)), Some(2));
        assert_eq!(cache.fetch(0, ComponentTypeId(2)), Some(1));
        assert_eq!(cache.fetch(0, ComponentTypeId(3)), Some(1));
        // entity 7: a row 4, b row 2, c row 3
        assert_eq!(cache.fetch(1, ComponentTypeId(1)), Some(4));
        assert_eq!(cache.fetch(1, ComponentTypeId(2)), Some(2));
        assert_eq!(cache.fetch(1, ComponentTypeId(3)), Some(3));
        assert_eq!(cache.fetch(2, ComponentTypeId(1)), None);
    }

    #[test]
    fn test_fetch_unknown_key_misses() {
        let a = ents(&[1]);
        let mut cache = JoinCache::new(&[ComponentTypeId(1)]);
        assert_eq!(cache.rebuild(&[rows(&a)]), 1);
        assert_eq!(cache.fetch(0, ComponentTypeId(99)), None);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let a = ents(&[1, 2, 3]);
        let b = ents(&[2, 3]);
        let mut cache = JoinCache::new(&[ComponentTypeId(1), ComponentTypeId(2)]);
        let first = cache.rebuild(&[rows(&a), rows(&b)]);
        let snapshot: Vec<_> = (0..first).map(|i| cache.fetch(i, ComponentTypeId(2))).collect();
        let second = cache.rebuild(&[rows(&a), rows(&b)]);
        let again: Vec<_> = (0..second).map(|i| cache.fetch(i, ComponentTypeId(2))).collect();
        assert_eq!(first, second);
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_vacant_rows_never_match() {
        let tagged = ents(&[1, 2, 3]);
        let values = ents(&[1, 2, 3]);
        let vacant = [false, true, false];
        let mut cache = JoinCache::new(&[ComponentTypeId(1), ComponentTypeId(2)]);

        let main = KeyRows {
            entities: &tagged,
            vacant: &vacant,
        };
        assert_eq!(cache.rebuild(&[main, rows(&values)]), 2);
        assert_eq!(cache.entity(1), Some(Entity::from_raw(3)));
        assert_eq!(cache.fetch(1, ComponentTypeId(1)), Some(2));

        let sub = KeyRows {
            entities: &values,
            vacant: &vacant,
        };
        assert_eq!(cache.rebuild(&[rows(&tagged), sub]), 2);
        assert_eq!(cache.entity(1), Some(Entity::from_raw(3)));
    }

    #[test]
    fn test_slab_limit_and_reuse() {
        let mut slab = CacheSlab::new(1);
        let h1 = slab.insert(JoinCache::new(&[ComponentTypeId(1)])).unwrap();
        assert!(slab.insert(JoinCache::new(&[ComponentTypeId(1)])).is_none());
        assert!(slab.remove(h1));
        assert!(!slab.remove(h1));

        let h2 = slab.insert(JoinCache::new(&[ComponentTypeId(2)])).unwrap();
        assert_ne!(h1, h2);
        assert!(slab.get(h1).is_none());
        assert_eq!(slab.get(h2).map(|c| c.keys().to_vec()), Some(vec![ComponentTypeId(2)]));
        assert_eq!(slab.live(), 1);
    }
}
