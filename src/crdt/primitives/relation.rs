//! Comparison results that admit "no order at all".
//!
//! `std::cmp::Ordering` cannot say that two values are unrelated, which is
//! exactly what a position scheme needs to say about two concurrent
//! insertions. `Relation` adds that fourth answer, and `Order` is a
//! comparator object built on it so a tree can be keyed by something
//! other than a type's `Ord` impl.

use std::cmp::Ordering;

/// The outcome of comparing two values under a partial order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Less,
    Equal,
    Greater,
    Unrelated,
}

impl Relation {
    /// Swap the two sides of the comparison.
    pub fn reverse(self) -> Relation {
        return match self {
            Relation::Less => Relation::Greater,
            Relation::Greater => Relation::Less,
            other => other,
        };
    }

    /// Convert to a total ordering, if the values are related.
    pub fn to_ordering(self) -> Option<Ordering> {
        return match self {
            Relation::Less => Some(Ordering::Less),
            Relation::Equal => Some(Ordering::Equal),
            Relation::Greater => Some(Ordering::Greater),
            Relation::Unrelated => None,
        };
    }
}

impl From<Ordering> for Relation {
    fn from(ordering: Ordering) -> Relation {
        return match ordering {
            Ordering::Less => Relation::Less,
            Ordering::Equal => Relation::Equal,
            Ordering::Greater => Relation::Greater,
        };
    }
}

impl From<Option<Ordering>> for Relation {
    fn from(ordering: Option<Ordering>) -> Relation {
        return match ordering {
            Some(ordering) => Relation::from(ordering),
            None => Relation::Unrelated,
        };
    }
}

/// A comparator over `E`.
///
/// Trees and maps require the order to be total. Returning `Unrelated`
/// for two elements stored in the same tree is a contract violation and
/// surfaces as `Error::CannotCompare`.
pub trait Order<E> {
    fn compare(&self, x: &E, y: &E) -> Relation;
}

/// The order given by `E`'s own `Ord` impl.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<E: Ord> Order<E> for Natural {
    fn compare(&self, x: &E, y: &E) -> Relation {
        return Relation::from(x.cmp(y));
    }
}

/// Compares `(key, value)` pairs by key alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByKey<O>(pub O);

impl<K, V, O: Order<K>> Order<(K, V)> for ByKey<O> {
    fn compare(&self, x: &(K, V), y: &(K, V)) -> Relation {
        return self.0.compare(&x.0, &y.0);
    }
}

/// Adapts a closure into an `Order`.
#[derive(Clone, Copy)]
pub struct FnOrder<F>(pub F);

impl<E, F: Fn(&E, &E) -> Relation> Order<E> for FnOrder<F> {
    fn compare(&self, x: &E, y: &E) -> Relation {
        return (self.0)(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_swaps_only_strict_relations() {
        assert_eq!(Relation::Less.reverse(), Relation::Greater);
        assert_eq!(Relation::Greater.reverse(), Relation::Less);
        assert_eq!(Relation::Equal.reverse(), Relation::Equal);
        assert_eq!(Relation::Unrelated.reverse(), Relation::Unrelated);
    }

    #[test]
    fn partial_ordering_maps_none_to_unrelated() {
        assert_eq!(Relation::from(1.0f64.partial_cmp(&f64::NAN)), Relation::Unrelated);
        assert_eq!(Relation::from(1.0f64.partial_cmp(&2.0)), Relation::Less);
    }

    #[test]
    fn by_key_ignores_values() {
        let order = ByKey(Natural);
        assert_eq!(order.compare(&(1, "z"), &(1, "a")), Relation::Equal);
        assert_eq!(order.compare(&(0, "z"), &(1, "a")), Relation::Less);
    }

    #[test]
    fn closures_are_orders() {
        let reversed = FnOrder(|x: &u32, y: &u32| Relation::from(y.cmp(x)));
        assert_eq!(reversed.compare(&1, &2), Relation::Greater);
    }
}
