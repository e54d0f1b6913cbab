//! Immutable ordered maps.
//!
//! A map is a tree of `(key, value)` pairs compared by key alone. Lookups
//! probe the tree with a bare key, so no placeholder value is ever needed.

use std::fmt;

use super::rb_tree::Iter;
use super::rb_tree::RbTree;
use super::relation::ByKey;
use super::relation::Natural;
use super::relation::Order;
use crate::error::Result;

/// A persistent ordered map.
pub struct RbMap<K, V, O = Natural> {
    order: ByKey<O>,
    tree: RbTree<(K, V)>,
    len: usize,
}

impl<K, V, O: Clone> Clone for RbMap<K, V, O> {
    fn clone(&self) -> Self {
        return RbMap {
            order: self.order.clone(),
            tree: self.tree.clone(),
            len: self.len,
        };
    }
}

impl<K, V, O> RbMap<K, V, O> {
    /// Create an empty map with keys ordered by `order`.
    pub fn new(order: O) -> RbMap<K, V, O> {
        return RbMap { order: ByKey(order), tree: RbTree::empty(), len: 0 };
    }

    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, (K, V)> {
        return self.tree.iter();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        return self.iter().map(|(key, _)| key);
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        return self.iter().map(|(_, value)| value);
    }

    pub fn first(&self) -> Option<&(K, V)> {
        return self.tree.min();
    }

    pub fn last(&self) -> Option<&(K, V)> {
        return self.tree.max();
    }
}

impl<K, V, O> RbMap<K, V, O>
where
    K: Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    O: Order<K> + Clone,
{
    pub fn get(&self, key: &K) -> Result<Option<&V>> {
        let found = self.tree.find_by(key, |key, entry| self.order.0.compare(key, &entry.0))?;
        return Ok(found.map(|(_, value)| value));
    }

    pub fn has(&self, key: &K) -> Result<bool> {
        return Ok(self.get(key)?.is_some());
    }

    /// Bind `key` to `value`, replacing any previous binding.
    pub fn set(&self, key: K, value: V) -> Result<RbMap<K, V, O>> {
        let (tree, previous) = self.tree.insert(&self.order, (key, value))?;
        let len = if previous.is_none() { self.len + 1 } else { self.len };
        return Ok(RbMap { order: self.order.clone(), tree, len });
    }

    /// Drop the binding for `key`, if any.
    pub fn remove(&self, key: &K) -> Result<RbMap<K, V, O>> {
        let compare = |key: &K, entry: &(K, V)| self.order.0.compare(key, &entry.0);
        return match self.tree.delete_by(key, &compare)? {
            None => Ok(self.clone()),
            Some((tree, _)) => Ok(RbMap { order: self.order.clone(), tree, len: self.len - 1 }),
        };
    }

    /// All bindings of both maps; `other` wins where keys collide.
    pub fn union(&self, other: &RbMap<K, V, O>) -> Result<RbMap<K, V, O>> {
        let mut map = self.clone();
        for (key, value) in other.iter() {
            map = map.set(key.clone(), value.clone())?;
        }
        return Ok(map);
    }

    /// Bindings of `self` whose key is not bound in `other`.
    pub fn difference(&self, other: &RbMap<K, V, O>) -> Result<RbMap<K, V, O>> {
        let mut map = self.clone();
        for key in other.keys() {
            map = map.remove(key)?;
        }
        return Ok(map);
    }

    /// Bindings of `self` whose key is also bound in `other`.
    pub fn intersection(&self, other: &RbMap<K, V, O>) -> Result<RbMap<K, V, O>> {
        let mut map = RbMap::new(self.order.0.clone());
        for (key, value) in self.iter() {
            if other.has(key)? {
                map = map.set(key.clone(), value.clone())?;
            }
        }
        return Ok(map);
    }

    /// Bindings satisfying `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> Result<RbMap<K, V, O>> {
        let mut map = RbMap::new(self.order.0.clone());
        for (key, value) in self.iter() {
            if predicate(key, value) {
                map = map.set(key.clone(), value.clone())?;
            }
        }
        return Ok(map);
    }
}

impl<K: Ord, V> Default for RbMap<K, V, Natural> {
    fn default() -> Self {
        return RbMap::new(Natural);
    }
}

impl<K: fmt::Debug, V: fmt::Debug, O> fmt::Debug for RbMap<K, V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.debug_map().entries(self.iter().map(|(k, v)| (k, v))).finish();
    }
}
