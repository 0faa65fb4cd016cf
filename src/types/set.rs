use crate::{Symbol, Type};
use indexmap::{set::Iter, IndexSet};
use std::{
    fmt::{Debug, Formatter},
    hash::Hash,
};

/// A set which iterates in insertion order. Equality ignores order.
#[derive(Clone)]
pub struct OrderedSet<T: Hash + Eq> {
    items: IndexSet<T>,
}

/// An insertion-ordered set of types.
pub type TypeSet = OrderedSet<Type>;

/// An insertion-ordered set of symbols.
pub type SymbolSet = OrderedSet<Symbol>;

impl<T: Hash + Eq> OrderedSet<T> {
    #[must_use]
    pub fn new() -> Self {
        OrderedSet {
            items: IndexSet::new(),
        }
    }

    /// Adds an item to the end of the set. Returns `false` if the item was
    /// already present, in which case its position is unchanged.
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item)
    }

    /// Removes an item while preserving the order of the remaining items.
    pub fn remove(&mut self, item: &T) -> bool {
        self.items.shift_remove(item)
    }

    #[must_use]
    pub fn has(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }

    /// Visits each item in insertion order until `f` returns `false`. Returns
    /// whether every item was visited.
    pub fn iterate<F: FnMut(&T) -> bool>(&self, mut f: F) -> bool {
        for item in &self.items {
            if !f(item) {
                return false;
            }
        }

        true
    }

    /// Checks whether every item of this set is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.iterate(|item| other.has(item))
    }

    /// Set equality. Insertion order is not considered.
    #[must_use]
    pub fn equal(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<T: Hash + Eq> Default for OrderedSet<T> {
    fn default() -> Self {
        OrderedSet::new()
    }
}

impl<T: Hash + Eq> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl<T: Hash + Eq> Eq for OrderedSet<T> {}

impl<T: Hash + Eq + Debug> Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: Hash + Eq> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        OrderedSet {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Hash + Eq> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<'a, T: Hash + Eq> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Hash + Eq> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = indexmap::set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
