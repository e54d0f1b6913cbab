//! Immutable ordered sets on top of `RbTree`.
//!
//! Every "mutation" returns a new set and leaves `self` alone; the two
//! share all nodes off the updated path. The set carries its comparator
//! and its size, so `len` is O(1).

use std::fmt;

use super::rb_tree::Iter;
use super::rb_tree::RbTree;
use super::relation::Natural;
use super::relation::Order;
use super::relation::Relation;
use crate::error::Error;
use crate::error::Result;

/// A persistent ordered set.
pub struct RbSet<E, O = Natural> {
    order: O,
    tree: RbTree<E>,
    len: usize,
}

impl<E, O: Clone> Clone for RbSet<E, O> {
    fn clone(&self) -> Self {
        return RbSet {
            order: self.order.clone(),
            tree: self.tree.clone(),
            len: self.len,
        };
    }
}

impl<E, O> RbSet<E, O> {
    /// Create an empty set ordered by `order`.
    pub fn new(order: O) -> RbSet<E, O> {
        return RbSet { order, tree: RbTree::empty(), len: 0 };
    }

    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    pub fn order(&self) -> &O {
        return &self.order;
    }

    /// The underlying tree.
    pub fn tree(&self) -> &RbTree<E> {
        return &self.tree;
    }

    pub fn min(&self) -> Option<&E> {
        return self.tree.min();
    }

    pub fn max(&self) -> Option<&E> {
        return self.tree.max();
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> Iter<'_, E> {
        return self.tree.iter();
    }
}

impl<E: Clone + fmt::Debug, O: Order<E> + Clone> RbSet<E, O> {
    /// Build a set from any number of elements. Later duplicates replace
    /// earlier ones.
    pub fn from_elems(order: O, elems: impl IntoIterator<Item = E>) -> Result<RbSet<E, O>> {
        return RbSet::new(order).insert_many(elems);
    }

    pub fn has(&self, elem: &E) -> Result<bool> {
        return self.tree.contains(&self.order, elem);
    }

    /// The stored element equal to `elem`, which may differ from `elem` in
    /// parts the order ignores.
    pub fn find_equal(&self, elem: &E) -> Result<Option<&E>> {
        return self.tree.find(&self.order, elem);
    }

    pub fn insert(&self, elem: E) -> Result<RbSet<E, O>> {
        return self.insert_many([elem]);
    }

    pub fn insert_many(&self, elems: impl IntoIterator<Item = E>) -> Result<RbSet<E, O>> {
        let mut tree = self.tree.clone();
        let mut len = self.len;
        for elem in elems {
            let (next, previous) = tree.insert(&self.order, elem)?;
            if previous.is_none() {
                len += 1;
            }
            tree = next;
        }
        return Ok(RbSet { order: self.order.clone(), tree, len });
    }

    pub fn delete(&self, elem: &E) -> Result<RbSet<E, O>> {
        return self.delete_many([elem]);
    }

    pub fn delete_many<'a>(&self, elems: impl IntoIterator<Item = &'a E>) -> Result<RbSet<E, O>>
    where
        E: 'a,
    {
        let mut tree = self.tree.clone();
        let mut len = self.len;
        for elem in elems {
            if let Some((next, _)) = tree.delete(&self.order, elem)? {
                tree = next;
                len -= 1;
            }
        }
        return Ok(RbSet { order: self.order.clone(), tree, len });
    }

    /// Elements in either set. Inserts the smaller set into the larger.
    pub fn union(&self, other: &RbSet<E, O>) -> Result<RbSet<E, O>> {
        if self.len >= other.len {
            return self.insert_many(other.iter().cloned());
        }
        return other.insert_many(self.iter().cloned());
    }

    /// Elements of `self` not in `other`.
    pub fn difference(&self, other: &RbSet<E, O>) -> Result<RbSet<E, O>> {
        return self.delete_many(other.iter());
    }

    /// Elements in both sets, taken from the smaller one.
    pub fn intersection(&self, other: &RbSet<E, O>) -> Result<RbSet<E, O>> {
        let (small, large) = if self.len <= other.len { (self, other) } else { (other, self) };
        let mut kept = Vec::new();
        for elem in small.iter() {
            if large.has(elem)? {
                kept.push(elem.clone());
            }
        }
        return RbSet::from_elems(self.order.clone(), kept);
    }

    /// Elements satisfying `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&E) -> bool) -> Result<RbSet<E, O>> {
        let kept: Vec<E> = self.iter().filter(|elem| predicate(*elem)).cloned().collect();
        return RbSet::from_elems(self.order.clone(), kept);
    }

    /// Check colouring, black height, strict ordering and the cached size.
    pub fn validate(&self) -> Result<()> {
        self.tree.black_height()?;
        let mut count = 0;
        let mut previous: Option<&E> = None;
        for elem in self.iter() {
            if let Some(previous) = previous {
                if self.order.compare(previous, elem) != Relation::Less {
                    return Err(Error::MalformedTree);
                }
            }
            previous = Some(elem);
            count += 1;
        }
        if count != self.len {
            return Err(Error::MalformedTree);
        }
        return Ok(());
    }
}

impl<E: Clone + fmt::Debug + Ord> Default for RbSet<E, Natural> {
    fn default() -> Self {
        return RbSet::new(Natural);
    }
}

impl<E: PartialEq, O> PartialEq for RbSet<E, O> {
    fn eq(&self, other: &Self) -> bool {
        return self.len == other.len && self.iter().eq(other.iter());
    }
}

impl<E: fmt::Debug, O> fmt::Debug for RbSet<E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.debug_set().entries(self.iter()).finish();
    }
}

impl<'a, E, O> IntoIterator for &'a RbSet<E, O> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Iter<'a, E> {
        return self.iter();
    }
}
