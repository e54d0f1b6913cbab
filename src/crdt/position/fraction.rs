//! Positions embedded in a dense fraction space.
//!
//! A fraction is a sequence of reals in `[0, 1)`, compared component by
//! component with a shorter prefix sorting first. Between any two distinct
//! fractions there is always a third: bisect the first component where
//! they differ, or, when the two components sit too close together for
//! `f64` to hold a midpoint, keep the lower one and extend past the lower
//! bound's tail.
//!
//! Every minted fraction ends in a random component drawn from
//! `[0.1, 0.9)`. Two replicas filling the same gap at the same time would
//! otherwise mint equal fractions; the random tail makes that unlikely,
//! and the id tie-break in `compare_positions` settles it when it happens.
//! It also keeps the last component away from both ends of the interval,
//! so there is room to bisect again.

use std::fmt;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::crdt::position::PositionEnv;
use crate::crdt::primitives::id::IdGenerator;
use crate::crdt::primitives::id::PositionId;
use crate::crdt::primitives::id::ReplicaId;
use crate::crdt::primitives::relation::Relation;
use crate::error::Error;
use crate::error::Result;

/// A point in the fraction space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fraction(pub Vec<f64>);

impl Fraction {
    /// The lower bound, below every minted fraction.
    pub fn min() -> Fraction {
        return Fraction(Vec::new());
    }

    /// The upper bound, above every minted fraction.
    pub fn max() -> Fraction {
        return Fraction(vec![1.0]);
    }

    pub fn components(&self) -> &[f64] {
        return &self.0;
    }

    /// Compare component-wise, then by length. `Unrelated` only if a
    /// component is NaN.
    pub fn compare(&self, other: &Fraction) -> Relation {
        for (x, y) in self.0.iter().zip(&other.0) {
            match Relation::from(x.partial_cmp(y)) {
                Relation::Equal => continue,
                relation => return relation,
            }
        }
        return Relation::from(self.0.len().cmp(&other.0.len()));
    }

    /// A fraction strictly between `lower` and `upper`.
    ///
    /// Fails with `NoFractionBetween` unless `lower < upper` and room is
    /// left inside `[0, 1)`.
    pub fn between<R: Rng + ?Sized>(lower: &Fraction, upper: &Fraction, rng: &mut R) -> Result<Fraction> {
        if lower.compare(upper) != Relation::Less {
            return Err(no_fraction_between(lower, upper));
        }
        let mut between = Vec::with_capacity(lower.0.len().max(upper.0.len()) + 1);
        for (i, &hi) in upper.0.iter().enumerate() {
            // A missing lower component acts as the bottom of the interval.
            let lo = lower.0.get(i).copied().unwrap_or(0.0);
            if lo == hi {
                between.push(hi);
                continue;
            }
            if lo > hi {
                return Err(no_fraction_between(lower, upper));
            }
            let mid = (lo + hi) / 2.0;
            if lo < mid && mid < hi {
                between.push(mid);
                between.push(rng.gen_range(0.1..0.9));
                return Ok(Fraction(between));
            }
            // No f64 fits between lo and hi: stay at lo and go above the
            // rest of the lower bound instead.
            between.push(lo);
            let tail = Fraction(lower.0.get(i + 1..).unwrap_or(&[]).to_vec());
            let above = Fraction::between(&tail, &Fraction::max(), rng)?;
            between.extend(above.0);
            return Ok(Fraction(between));
        }
        // `between` now equals `upper`, and nothing with that prefix is smaller.
        return Err(no_fraction_between(lower, upper));
    }
}

fn no_fraction_between(lower: &Fraction, upper: &Fraction) -> Error {
    return Error::NoFractionBetween {
        lower: lower.to_string(),
        upper: upper.to_string(),
    };
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", component)?;
        }
        return write!(f, "]");
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FractionPos {
    pub id: PositionId,
    pub fraction: Fraction,
}

/// Mints `FractionPos` values for one replica.
///
/// The random source only picks tail components, so seeding it with
/// `with_seed` makes a replica's positions reproducible.
#[derive(Clone, Debug)]
pub struct FractionEnv {
    ids: IdGenerator,
    rng: StdRng,
}

impl FractionEnv {
    /// Create an env whose random source is seeded from the OS.
    pub fn new(replica: impl Into<ReplicaId>) -> FractionEnv {
        return FractionEnv {
            ids: IdGenerator::new(replica.into()),
            rng: StdRng::from_entropy(),
        };
    }

    pub fn with_seed(replica: impl Into<ReplicaId>, seed: u64) -> FractionEnv {
        return FractionEnv {
            ids: IdGenerator::new(replica.into()),
            rng: StdRng::seed_from_u64(seed),
        };
    }
}

impl PositionEnv for FractionEnv {
    type Position = FractionPos;

    fn replica(&self) -> &ReplicaId {
        return self.ids.replica();
    }

    fn new_position(
        &mut self,
        left: Option<&FractionPos>,
        right: Option<&FractionPos>,
    ) -> Result<FractionPos> {
        let lower = left.map_or_else(Fraction::min, |p| p.fraction.clone());
        let upper = right.map_or_else(Fraction::max, |p| p.fraction.clone());
        let fraction = Fraction::between(&lower, &upper, &mut self.rng)?;
        return Ok(FractionPos { id: self.ids.fresh(), fraction });
    }

    /// Fractions first, ids on a tie. Every pair is related.
    fn compare_positions(&self, p: &FractionPos, q: &FractionPos) -> Relation {
        return match p.fraction.compare(&q.fraction) {
            Relation::Equal => Relation::from(p.id.cmp(&q.id)),
            relation => relation,
        };
    }

    fn id_of<'a>(&self, position: &'a FractionPos) -> &'a PositionId {
        return &position.id;
    }

    fn display_position(&self, position: &FractionPos) -> String {
        return format!("{}<{}>", position.id, position.fraction);
    }
}
