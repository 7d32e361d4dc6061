//! Dense entity storage with O(1) id lookup and swap-remove
//!
//! Entities live in a contiguous `Vec` for cache-friendly iteration; an
//! id→index map gives constant-time lookup. Removal swaps the last element
//! into the hole and patches its index entry.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Anything stored in an [`Arena`] exposes a stable id
pub trait Keyed {
    type Id: Copy + Eq + Hash;

    fn id(&self) -> Self::Id;
}

#[derive(Debug, Clone)]
pub struct Arena<T: Keyed> {
    items: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Keyed> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert an entity; an existing entity with the same id is replaced
    pub fn insert(&mut self, item: T) {
        let id = item.id();
        if let Some(&idx) = self.index.get(&id) {
            self.items[idx] = item;
        } else {
            self.index.insert(id, self.items.len());
            self.items.push(item);
        }
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.index.contains_key(&id)
    }

    pub fn index_of(&self, id: T::Id) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.index.get(&id).map(|&idx| &self.items[idx])
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        match self.index.get(&id) {
            Some(&idx) => Some(&mut self.items[idx]),
            None => None,
        }
    }

    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        let idx = self.index.remove(&id)?;
        let removed = self.items.swap_remove(idx);
        if let Some(moved) = self.items.get(idx) {
            self.index.insert(moved.id(), idx);
        }
        Some(removed)
    }

    /// Remove every entity whose id is in `ids` in one pass
    ///
    /// Survivors keep their relative order, so iteration stays deterministic
    /// regardless of the set's hash order.
    pub fn remove_all(&mut self, ids: &HashSet<T::Id>) {
        if ids.is_empty() {
            return;
        }
        self.items.retain(|item| !ids.contains(&item.id()));
        self.index.clear();
        for (idx, item) in self.items.iter().enumerate() {
            self.index.insert(item.id(), idx);
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Thing {
        id: u32,
        value: i32,
    }

    impl Keyed for Thing {
        type Id = u32;
        fn id(&self) -> u32 {
            self.id
        }
    }

    fn arena_of(ids: &[u32]) -> Arena<Thing> {
        let mut arena = Arena::new();
        for &id in ids {
            arena.insert(Thing { id, value: id as i32 * 10 });
        }
        arena
    }

    #[test]
    fn test_swap_remove_patches_index() {
        let mut arena = arena_of(&[1, 2, 3, 4]);
        let removed = arena.remove(2).expect("present");
        assert_eq!(removed.value, 20);

        // 4 was swapped into 2's slot and must still resolve
        assert_eq!(arena.get(4).map(|t| t.value), Some(40));
        assert_eq!(arena.index_of(4), Some(1));
        assert!(arena.get(2).is_none());
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_remove_last_and_missing() {
        let mut arena = arena_of(&[1, 2]);
        assert!(arena.remove(2).is_some());
        assert!(arena.remove(2).is_none());
        assert!(arena.remove(99).is_none());
        assert_eq!(arena.get(1).map(|t| t.value), Some(10));
    }

    #[test]
    fn test_remove_all() {
        let mut arena = arena_of(&[1, 2, 3, 4, 5]);
        let ids: HashSet<u32> = [1, 3, 5].into_iter().collect();
        arena.remove_all(&ids);

        let left: Vec<u32> = arena.iter().map(|t| t.id).collect();
        assert_eq!(left, vec![2, 4]);
        for t in arena.iter() {
            assert_eq!(arena.get(t.id), Some(t));
        }
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut arena = arena_of(&[1]);
        arena.insert(Thing { id: 1, value: -1 });
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(1).map(|t| t.value), Some(-1));
    }
}
