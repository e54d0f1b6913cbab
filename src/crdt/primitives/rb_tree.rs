//! Persistent red-black trees.
//!
//! Every node is immutable and owned through an `Arc`, so an update builds
//! a new path from the root down to the change and shares every other
//! subtree with the tree it came from. Old roots stay valid, which is what
//! lets replicas hold on to snapshots without copying.
//!
//! Insertion follows Okasaki's balancing. Deletion follows Kahrs: removing
//! a black node leaves a subtree one black level short, and `bal_left`,
//! `bal_right` and `append` push that deficiency up until a sibling can
//! lend a node or the root absorbs it.
//!
//! Complexity:
//! - contains / find: O(log n)
//! - insert / delete: O(log n), allocating O(log n) new nodes
//! - iteration: O(n)
//!
//! The tree does not know its own size; `RbSet` tracks it.

use std::sync::Arc;

use super::relation::Order;
use super::relation::Relation;
use crate::error::Error;
use crate::error::Result;

/// Node colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// An interior node. Children may be empty trees.
#[derive(Debug)]
pub struct Node<E> {
    pub color: Color,
    pub elem: E,
    pub left: RbTree<E>,
    pub right: RbTree<E>,
}

/// A persistent red-black tree, possibly empty.
#[derive(Debug)]
pub struct RbTree<E> {
    root: Option<Arc<Node<E>>>,
}

impl<E> Clone for RbTree<E> {
    fn clone(&self) -> Self {
        return RbTree { root: self.root.clone() };
    }
}

impl<E> Default for RbTree<E> {
    fn default() -> Self {
        return RbTree::empty();
    }
}

fn cannot_compare<Q: std::fmt::Debug + ?Sized, E: std::fmt::Debug>(x: &Q, y: &E) -> Error {
    return Error::CannotCompare {
        left: format!("{:?}", x),
        right: format!("{:?}", y),
    };
}

impl<E> RbTree<E> {
    /// The empty tree.
    pub fn empty() -> RbTree<E> {
        return RbTree { root: None };
    }

    fn node(color: Color, left: RbTree<E>, elem: E, right: RbTree<E>) -> RbTree<E> {
        return RbTree {
            root: Some(Arc::new(Node { color, elem, left, right })),
        };
    }

    fn red(left: RbTree<E>, elem: E, right: RbTree<E>) -> RbTree<E> {
        return RbTree::node(Color::Red, left, elem, right);
    }

    fn black(left: RbTree<E>, elem: E, right: RbTree<E>) -> RbTree<E> {
        return RbTree::node(Color::Black, left, elem, right);
    }

    pub fn is_empty(&self) -> bool {
        return self.root.is_none();
    }

    /// The root node, if any.
    pub fn root(&self) -> Option<&Node<E>> {
        return self.root.as_deref();
    }

    /// True for a non-empty tree with a red root.
    pub fn is_red(&self) -> bool {
        return matches!(self.root(), Some(node) if node.color == Color::Red);
    }

    /// True for a non-empty tree with a black root. Empty trees count as
    /// black for the invariants but not here.
    fn is_black_node(&self) -> bool {
        return matches!(self.root(), Some(node) if node.color == Color::Black);
    }

    fn red_node(&self) -> Option<&Node<E>> {
        return self.root().filter(|node| node.color == Color::Red);
    }

    /// True if both trees are the same allocation (or both empty).
    pub fn ptr_eq(&self, other: &RbTree<E>) -> bool {
        return match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
    }

    /// Smallest element.
    pub fn min(&self) -> Option<&E> {
        let mut node = self.root()?;
        while let Some(left) = node.left.root() {
            node = left;
        }
        return Some(&node.elem);
    }

    /// Largest element.
    pub fn max(&self) -> Option<&E> {
        let mut node = self.root()?;
        while let Some(right) = node.right.root() {
            node = right;
        }
        return Some(&node.elem);
    }

    /// In-order iterator over the elements.
    pub fn iter(&self) -> Iter<'_, E> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(self);
        return iter;
    }

    /// Check the red-black invariants and return the black height.
    ///
    /// Fails with `MalformedTree` if a red node has a red child or two
    /// paths from the root disagree on how many black nodes they cross.
    /// Ordering is not checked here; see `RbSet::validate`.
    pub fn black_height(&self) -> Result<usize> {
        let node = match self.root() {
            None => return Ok(1),
            Some(node) => node,
        };
        let left = node.left.black_height()?;
        let right = node.right.black_height()?;
        if left != right {
            return Err(Error::MalformedTree);
        }
        if node.color == Color::Red {
            if node.left.is_red() || node.right.is_red() {
                return Err(Error::MalformedTree);
            }
            return Ok(left);
        }
        return Ok(left + 1);
    }
}

impl<E: Clone + std::fmt::Debug> RbTree<E> {
    /// Look up the stored element equal to `x`.
    pub fn find<O: Order<E>>(&self, order: &O, x: &E) -> Result<Option<&E>> {
        return self.find_by(x, |x, elem| order.compare(x, elem));
    }

    /// Look up an element by a probe that is not itself an `E`, such as
    /// the key half of a key/value pair. `compare` must agree with the
    /// order the tree was built with.
    pub fn find_by<Q, F>(&self, x: &Q, compare: F) -> Result<Option<&E>>
    where
        Q: std::fmt::Debug + ?Sized,
        F: Fn(&Q, &E) -> Relation,
    {
        let mut tree = self;
        while let Some(node) = tree.root() {
            match compare(x, &node.elem) {
                Relation::Unrelated => return Err(cannot_compare(x, &node.elem)),
                Relation::Equal => return Ok(Some(&node.elem)),
                Relation::Less => tree = &node.left,
                Relation::Greater => tree = &node.right,
            }
        }
        return Ok(None);
    }

    /// Membership test.
    pub fn contains<O: Order<E>>(&self, order: &O, x: &E) -> Result<bool> {
        return Ok(self.find(order, x)?.is_some());
    }

    /// Insert `x` unless an equal element is present.
    ///
    /// Returns `None` when nothing changed.
    pub fn insert_new<O: Order<E>>(&self, order: &O, x: E) -> Result<Option<RbTree<E>>> {
        return match insert_rec(order, &x, self, false)? {
            None => Ok(None),
            Some((tree, _)) => Ok(Some(tree.blacken())),
        };
    }

    /// Insert `x`, replacing an equal element if one is present.
    ///
    /// Returns the new tree and the replaced element.
    pub fn insert<O: Order<E>>(&self, order: &O, x: E) -> Result<(RbTree<E>, Option<E>)> {
        return match insert_rec(order, &x, self, true)? {
            Some((tree, previous)) => Ok((tree.blacken(), previous)),
            None => Ok((self.clone(), None)),
        };
    }

    /// Remove the element equal to `x`.
    ///
    /// Returns `None` when no such element exists, otherwise the new tree
    /// and the removed element.
    pub fn delete<O: Order<E>>(&self, order: &O, x: &E) -> Result<Option<(RbTree<E>, E)>> {
        return self.delete_by(x, &|x: &E, elem: &E| order.compare(x, elem));
    }

    /// Remove the element matching a probe; see `find_by`.
    pub fn delete_by<Q, F>(&self, x: &Q, compare: &F) -> Result<Option<(RbTree<E>, E)>>
    where
        Q: std::fmt::Debug + ?Sized,
        F: Fn(&Q, &E) -> Relation,
    {
        return match delete_rec(compare, x, self)? {
            None => Ok(None),
            Some((tree, removed)) => Ok(Some((tree.blacken(), removed))),
        };
    }

    fn blacken(self) -> RbTree<E> {
        if let Some(node) = self.red_node() {
            return RbTree::black(node.left.clone(), node.elem.clone(), node.right.clone());
        }
        return self;
    }
}

/// In-order iterator over a tree.
pub struct Iter<'a, E> {
    stack: Vec<&'a Node<E>>,
}

impl<'a, E> Iter<'a, E> {
    fn push_left(&mut self, mut tree: &'a RbTree<E>) {
        while let Some(node) = tree.root() {
            self.stack.push(node);
            tree = &node.left;
        }
    }
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        let node = self.stack.pop()?;
        self.push_left(&node.right);
        return Some(&node.elem);
    }
}

// --- Insertion (Okasaki) ---

fn balanced<E>(
    x: E,
    y: E,
    z: E,
    a: RbTree<E>,
    b: RbTree<E>,
    c: RbTree<E>,
    d: RbTree<E>,
) -> RbTree<E> {
    return RbTree::red(RbTree::black(a, x, b), y, RbTree::black(c, z, d));
}

fn balance_left<E: Clone>(color: Color, left: RbTree<E>, elem: E, right: RbTree<E>) -> RbTree<E> {
    if color == Color::Black {
        if let Some(l) = left.red_node() {
            if let Some(ll) = l.left.red_node() {
                return balanced(
                    ll.elem.clone(),
                    l.elem.clone(),
                    elem,
                    ll.left.clone(),
                    ll.right.clone(),
                    l.right.clone(),
                    right,
                );
            }
            if let Some(lr) = l.right.red_node() {
                return balanced(
                    l.elem.clone(),
                    lr.elem.clone(),
                    elem,
                    l.left.clone(),
                    lr.left.clone(),
                    lr.right.clone(),
                    right,
                );
            }
        }
    }
    return RbTree::node(color, left, elem, right);
}

fn balance_right<E: Clone>(color: Color, left: RbTree<E>, elem: E, right: RbTree<E>) -> RbTree<E> {
    if color == Color::Black {
        if let Some(r) = right.red_node() {
            if let Some(rl) = r.left.red_node() {
                return balanced(
                    elem,
                    rl.elem.clone(),
                    r.elem.clone(),
                    left,
                    rl.left.clone(),
                    rl.right.clone(),
                    r.right.clone(),
                );
            }
            if let Some(rr) = r.right.red_node() {
                return balanced(
                    elem,
                    r.elem.clone(),
                    rr.elem.clone(),
                    left,
                    r.left.clone(),
                    rr.left.clone(),
                    rr.right.clone(),
                );
            }
        }
    }
    return RbTree::node(color, left, elem, right);
}

fn insert_rec<E: Clone + std::fmt::Debug, O: Order<E>>(
    order: &O,
    x: &E,
    tree: &RbTree<E>,
    replace: bool,
) -> Result<Option<(RbTree<E>, Option<E>)>> {
    let node = match tree.root() {
        None => return Ok(Some((RbTree::red(RbTree::empty(), x.clone(), RbTree::empty()), None))),
        Some(node) => node,
    };
    match order.compare(x, &node.elem) {
        Relation::Unrelated => return Err(cannot_compare(x, &node.elem)),
        Relation::Equal => {
            if !replace {
                return Ok(None);
            }
            let tree = RbTree::node(node.color, node.left.clone(), x.clone(), node.right.clone());
            return Ok(Some((tree, Some(node.elem.clone()))));
        }
        Relation::Less => {
            let Some((left, previous)) = insert_rec(order, x, &node.left, replace)? else {
                return Ok(None);
            };
            let tree = balance_left(node.color, left, node.elem.clone(), node.right.clone());
            return Ok(Some((tree, previous)));
        }
        Relation::Greater => {
            let Some((right, previous)) = insert_rec(order, x, &node.right, replace)? else {
                return Ok(None);
            };
            let tree = balance_right(node.color, node.left.clone(), node.elem.clone(), right);
            return Ok(Some((tree, previous)));
        }
    }
}

// --- Deletion (Kahrs) ---

/// Rebalance after a child may have changed shape. Covers the red-red
/// configurations on either side, including both children red.
fn balance<E: Clone>(a: RbTree<E>, x: E, b: RbTree<E>) -> RbTree<E> {
    if let (Some(l), Some(r)) = (a.red_node(), b.red_node()) {
        return RbTree::red(
            RbTree::black(l.left.clone(), l.elem.clone(), l.right.clone()),
            x,
            RbTree::black(r.left.clone(), r.elem.clone(), r.right.clone()),
        );
    }
    if let Some(l) = a.red_node() {
        if let Some(ll) = l.left.red_node() {
            return balanced(
                ll.elem.clone(),
                l.elem.clone(),
                x,
                ll.left.clone(),
                ll.right.clone(),
                l.right.clone(),
                b,
            );
        }
        if let Some(lr) = l.right.red_node() {
            return balanced(
                l.elem.clone(),
                lr.elem.clone(),
                x,
                l.left.clone(),
                lr.left.clone(),
                lr.right.clone(),
                b,
            );
        }
    }
    if let Some(r) = b.red_node() {
        if let Some(rr) = r.right.red_node() {
            return balanced(
                x,
                r.elem.clone(),
                rr.elem.clone(),
                a,
                r.left.clone(),
                rr.left.clone(),
                rr.right.clone(),
            );
        }
        if let Some(rl) = r.left.red_node() {
            return balanced(
                x,
                rl.elem.clone(),
                r.elem.clone(),
                a,
                rl.left.clone(),
                rl.right.clone(),
                r.right.clone(),
            );
        }
    }
    return RbTree::black(a, x, b);
}

/// Turn a black node red, lowering its black height by one.
fn redden<E: Clone>(tree: &RbTree<E>) -> Result<RbTree<E>> {
    return match tree.root() {
        Some(node) if node.color == Color::Black => {
            Ok(RbTree::red(node.left.clone(), node.elem.clone(), node.right.clone()))
        }
        _ => Err(Error::MalformedTree),
    };
}

/// Rebuild a node whose left subtree is one black level short.
fn bal_left<E: Clone>(left: RbTree<E>, elem: E, right: RbTree<E>) -> Result<RbTree<E>> {
    if let Some(l) = left.red_node() {
        let left = RbTree::black(l.left.clone(), l.elem.clone(), l.right.clone());
        return Ok(RbTree::red(left, elem, right));
    }
    let r = right.root().ok_or(Error::MalformedTree)?;
    if r.color == Color::Black {
        let right = RbTree::red(r.left.clone(), r.elem.clone(), r.right.clone());
        return Ok(balance(left, elem, right));
    }
    let rl = r.left.root().filter(|n| n.color == Color::Black).ok_or(Error::MalformedTree)?;
    let new_left = RbTree::black(left, elem, rl.left.clone());
    let new_right = balance(rl.right.clone(), r.elem.clone(), redden(&r.right)?);
    return Ok(RbTree::red(new_left, rl.elem.clone(), new_right));
}

/// Rebuild a node whose right subtree is one black level short.
fn bal_right<E: Clone>(left: RbTree<E>, elem: E, right: RbTree<E>) -> Result<RbTree<E>> {
    if let Some(r) = right.red_node() {
        let right = RbTree::black(r.left.clone(), r.elem.clone(), r.right.clone());
        return Ok(RbTree::red(left, elem, right));
    }
    let l = left.root().ok_or(Error::MalformedTree)?;
    if l.color == Color::Black {
        let left = RbTree::red(l.left.clone(), l.elem.clone(), l.right.clone());
        return Ok(balance(left, elem, right));
    }
    let lr = l.right.root().filter(|n| n.color == Color::Black).ok_or(Error::MalformedTree)?;
    let new_left = balance(redden(&l.left)?, l.elem.clone(), lr.left.clone());
    let new_right = RbTree::black(lr.right.clone(), elem, right);
    return Ok(RbTree::red(new_left, lr.elem.clone(), new_right));
}

/// Join the two children of a removed node. Every element of `a` is
/// smaller than every element of `b` and both have the same black height.
fn append<E: Clone>(a: &RbTree<E>, b: &RbTree<E>) -> Result<RbTree<E>> {
    let (l, r) = match (a.root(), b.root()) {
        (None, _) => return Ok(b.clone()),
        (_, None) => return Ok(a.clone()),
        (Some(l), Some(r)) => (l, r),
    };
    match (l.color, r.color) {
        (Color::Red, Color::Red) => {
            let inner = append(&l.right, &r.left)?;
            if let Some(m) = inner.red_node() {
                return Ok(RbTree::red(
                    RbTree::red(l.left.clone(), l.elem.clone(), m.left.clone()),
                    m.elem.clone(),
                    RbTree::red(m.right.clone(), r.elem.clone(), r.right.clone()),
                ));
            }
            return Ok(RbTree::red(
                l.left.clone(),
                l.elem.clone(),
                RbTree::red(inner, r.elem.clone(), r.right.clone()),
            ));
        }
        (Color::Black, Color::Black) => {
            let inner = append(&l.right, &r.left)?;
            if let Some(m) = inner.red_node() {
                return Ok(RbTree::red(
                    RbTree::black(l.left.clone(), l.elem.clone(), m.left.clone()),
                    m.elem.clone(),
                    RbTree::black(m.right.clone(), r.elem.clone(), r.right.clone()),
                ));
            }
            return bal_left(
                l.left.clone(),
                l.elem.clone(),
                RbTree::black(inner, r.elem.clone(), r.right.clone()),
            );
        }
        (Color::Black, Color::Red) => {
            return Ok(RbTree::red(append(a, &r.left)?, r.elem.clone(), r.right.clone()));
        }
        (Color::Red, Color::Black) => {
            return Ok(RbTree::red(l.left.clone(), l.elem.clone(), append(&l.right, b)?));
        }
    }
}

fn delete_rec<E, Q, F>(compare: &F, x: &Q, tree: &RbTree<E>) -> Result<Option<(RbTree<E>, E)>>
where
    E: Clone + std::fmt::Debug,
    Q: std::fmt::Debug + ?Sized,
    F: Fn(&Q, &E) -> Relation,
{
    let node = match tree.root() {
        None => return Ok(None),
        Some(node) => node,
    };
    match compare(x, &node.elem) {
        Relation::Unrelated => return Err(cannot_compare(x, &node.elem)),
        Relation::Equal => {
            return Ok(Some((append(&node.left, &node.right)?, node.elem.clone())));
        }
        Relation::Less => {
            let Some((left, removed)) = delete_rec(compare, x, &node.left)? else {
                return Ok(None);
            };
            let tree = if node.left.is_black_node() {
                bal_left(left, node.elem.clone(), node.right.clone())?
            } else {
                RbTree::red(left, node.elem.clone(), node.right.clone())
            };
            return Ok(Some((tree, removed)));
        }
        Relation::Greater => {
            let Some((right, removed)) = delete_rec(compare, x, &node.right)? else {
                return Ok(None);
            };
            let tree = if node.right.is_black_node() {
                bal_right(node.left.clone(), node.elem.clone(), right)?
            } else {
                RbTree::red(node.left.clone(), node.elem.clone(), right)
            };
            return Ok(Some((tree, removed)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::primitives::relation::FnOrder;
    use crate::crdt::primitives::relation::Natural;

    fn build(xs: &[u32]) -> RbTree<u32> {
        let mut tree = RbTree::empty();
        for &x in xs {
            tree = tree.insert(&Natural, x).unwrap().0;
        }
        return tree;
    }

    fn elems(tree: &RbTree<u32>) -> Vec<u32> {
        return tree.iter().copied().collect();
    }

    #[test]
    fn empty_tree() {
        let tree: RbTree<u32> = RbTree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.min(), None);
        assert_eq!(tree.black_height(), Ok(1));
        assert!(!tree.contains(&Natural, &1).unwrap());
    }

    #[test]
    fn insert_keeps_order_and_balance() {
        let tree = build(&[5, 3, 8, 1, 4, 7, 9, 2, 6]);
        assert_eq!(elems(&tree), vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert!(tree.black_height().is_ok());
        assert!(!tree.is_red());
        assert_eq!(tree.min(), Some(&1));
        assert_eq!(tree.max(), Some(&9));
    }

    #[test]
    fn sequential_inserts_stay_balanced() {
        let xs: Vec<u32> = (0..1000).collect();
        let tree = build(&xs);
        let height = tree.black_height().unwrap();
        // 1000 nodes fit in black height at most log2(1001) + 1.
        assert!(height <= 11, "black height {} too large", height);
    }

    #[test]
    fn insert_new_reports_no_change() {
        let tree = build(&[1, 2, 3]);
        assert!(tree.insert_new(&Natural, 2).unwrap().is_none());
        let grown = tree.insert_new(&Natural, 4).unwrap().unwrap();
        assert_eq!(elems(&grown), vec![1, 2, 3, 4]);
        // The original is untouched.
        assert_eq!(elems(&tree), vec![1, 2, 3]);
    }

    #[test]
    fn insert_replaces_equal_element() {
        let order = FnOrder(|x: &(u32, char), y: &(u32, char)| Relation::from(x.0.cmp(&y.0)));
        let tree = RbTree::<(u32, char)>::empty().insert(&order, (1, 'a')).unwrap().0;
        let (tree, previous) = tree.insert(&order, (1, 'b')).unwrap();
        assert_eq!(previous, Some((1, 'a')));
        assert_eq!(tree.find(&order, &(1, ' ')).unwrap(), Some(&(1, 'b')));
    }

    #[test]
    fn delete_every_element() {
        let xs: Vec<u32> = (0..200).map(|i| (i * 37) % 200).collect();
        let mut tree = build(&xs);
        for (n, x) in xs.iter().enumerate() {
            let (next, removed) = tree.delete(&Natural, x).unwrap().unwrap();
            assert_eq!(removed, *x);
            assert!(next.black_height().is_ok(), "invalid after deleting {}", x);
            assert_eq!(next.iter().count(), xs.len() - n - 1);
            tree = next;
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn delete_missing_is_no_change() {
        let tree = build(&[1, 2, 3]);
        assert!(tree.delete(&Natural, &7).unwrap().is_none());
    }

    #[test]
    fn untouched_subtrees_are_shared() {
        let tree = build(&(0..64).collect::<Vec<u32>>());
        let grown = tree.insert(&Natural, 1000).unwrap().0;
        fn leftmost(tree: &RbTree<u32>) -> &Node<u32> {
            let mut node = tree.root().unwrap();
            while let Some(left) = node.left.root() {
                node = left;
            }
            return node;
        }
        // Inserting at the far right rebuilds the right spine only.
        assert!(std::ptr::eq(leftmost(&tree), leftmost(&grown)));
    }

    #[test]
    fn unrelated_comparison_is_an_error() {
        let order = FnOrder(|x: &u32, y: &u32| {
            if x == y { Relation::Equal } else { Relation::Unrelated }
        });
        let tree = RbTree::<u32>::empty().insert(&order, 1).unwrap().0;
        let err = tree.insert(&order, 2).unwrap_err();
        assert!(matches!(err, Error::CannotCompare { .. }));
        assert!(tree.contains(&order, &3).is_err());
    }
}
