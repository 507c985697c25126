use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use compact_str::CompactString;
use rustc_hash::FxHashMap;

/// An entity identified by a dataset-unique string id.
pub trait Keyed {
    fn id(&self) -> &str;
}

/// Non-owning handle to an entity stored in a [`Container`].
///
/// Handles stay valid for the lifetime of the container that issued them,
/// since entities are never removed.
pub struct EntityRef<T> {
    index: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> EntityRef<T> {
    fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityRef<T> {}

impl<T> PartialEq for EntityRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for EntityRef<T> {}

impl<T> Hash for EntityRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.index)
    }
}

/// Insertion-ordered collection of entities keyed by id.
#[derive(Debug, Clone)]
pub struct Container<T> {
    items: Vec<T>,
    index: FxHashMap<CompactString, u32>,
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<T: Keyed> Container<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `entity` and returns its handle. On an id collision the
    /// container is left unchanged and the entity is handed back.
    pub fn add(&mut self, entity: T) -> Result<EntityRef<T>, T> {
        if self.index.contains_key(entity.id()) {
            return Err(entity);
        }
        let position = self.items.len();
        self.index
            .insert(CompactString::from(entity.id()), position as u32);
        self.items.push(entity);
        Ok(EntityRef::new(position))
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|index| &self.items[*index as usize])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let index = *self.index.get(id)?;
        self.items.get_mut(index as usize)
    }

    pub fn handle(&self, id: &str) -> Option<EntityRef<T>> {
        self.index.get(id).map(|index| EntityRef::new(*index as usize))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }
}

impl<T> Container<T> {
    pub fn resolve(&self, handle: EntityRef<T>) -> &T {
        &self.items[handle.index()]
    }

    pub fn resolve_mut(&mut self, handle: EntityRef<T>) -> &mut T {
        &mut self.items[handle.index()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Entities paired with their handles, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (EntityRef<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (EntityRef::new(index), item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Index<EntityRef<T>> for Container<T> {
    type Output = T;

    fn index(&self, handle: EntityRef<T>) -> &T {
        self.resolve(handle)
    }
}

impl<T> IndexMut<EntityRef<T>> for Container<T> {
    fn index_mut(&mut self, handle: EntityRef<T>) -> &mut T {
        self.resolve_mut(handle)
    }
}

impl<'a, T> IntoIterator for &'a Container<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named {
        id: &'static str,
        value: u32,
    }

    impl Keyed for Named {
        fn id(&self) -> &str {
            self.id
        }
    }

    #[test]
    fn rejects_duplicate_ids_and_keeps_first() {
        let mut container = Container::new();
        assert!(container.add(Named { id: "a", value: 1 }).is_ok());
        let rejected = container.add(Named { id: "a", value: 2 }).unwrap_err();
        assert_eq!(rejected.value, 2);
        assert_eq!(container.len(), 1);
        assert_eq!(container.get("a").unwrap().value, 1);
    }

    #[test]
    fn iterates_in_insertion_order() {
        let mut container = Container::new();
        for (id, value) in [("z", 1), ("a", 2), ("m", 3)] {
            container.add(Named { id, value }).unwrap();
        }
        let ids: Vec<&str> = container.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn handles_resolve_to_stored_entities() {
        let mut container = Container::new();
        let first = container.add(Named { id: "a", value: 1 }).unwrap();
        let second = container.add(Named { id: "b", value: 2 }).unwrap();
        assert_eq!(container[second].value, 2);
        assert_eq!(container.handle("a"), Some(first));
        assert_eq!(container.handle("missing"), None);

        container[first].value = 10;
        assert_eq!(container.get("a").unwrap().value, 10);
        container.get_mut("b").unwrap().value = 20;
        assert_eq!(container.resolve(second).value, 20);
    }
}
