use crate::{
    error::{BoundSide, EncodeError},
    types::Lit,
};

use super::{alloc::VarAllocator, clause_log::ClauseLog, encoder::Encoder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedLit {
    pub weight: i32,
    pub lit: Lit,
}

impl WeightedLit {
    pub fn new(weight: i32, lit: Lit) -> Self {
        Self { weight, lit }
    }
}

impl From<Lit> for WeightedLit {
    fn from(lit: Lit) -> Self {
        Self { weight: 1, lit }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    AtMost(i64),
    AtLeast(i64),
    Between(i64, i64),
}

impl Relation {
    pub fn upper(&self) -> Option<i64> {
        match *self {
            Relation::AtMost(upper) | Relation::Between(_, upper) => Some(upper),
            Relation::AtLeast(_) => None,
        }
    }

    pub fn lower(&self) -> Option<i64> {
        match *self {
            Relation::AtLeast(lower) | Relation::Between(lower, _) => Some(lower),
            Relation::AtMost(_) => None,
        }
    }

    /// A `Between` whose bounds crossed.
    pub fn is_empty(&self) -> bool {
        matches!(*self, Relation::Between(lower, upper) if lower > upper)
    }

    fn with_upper(self, upper: i64) -> Self {
        match self {
            Relation::Between(lower, _) => Relation::Between(lower, upper),
            _ => Relation::AtMost(upper),
        }
    }

    fn with_lower(self, lower: i64) -> Self {
        match self {
            Relation::Between(_, upper) => Relation::Between(lower, upper),
            _ => Relation::AtLeast(lower),
        }
    }
}

/// A weighted linear constraint over literals whose bounds can only be tightened.
///
/// ```
/// use vw_pbenc::encoding::{ClauseLog, Constraint, VarAllocator};
///
/// let mut log = ClauseLog::new();
/// let mut alloc = VarAllocator::after(3);
/// let mut constraint = Constraint::at_most([1, 2, 3], 2).unwrap();
///
/// constraint.encode(&mut log, &mut alloc).unwrap();
/// let mark = log.mark();
/// constraint.tighten_leq(1, &mut log, &mut alloc).unwrap();
/// assert!(!log.since(mark).is_empty());
/// ```
pub struct Constraint {
    lits: Vec<WeightedLit>,
    relation: Relation,
    encoder: Encoder,
}

impl Constraint {
    pub fn new(lits: Vec<WeightedLit>, relation: Relation) -> Result<Self, EncodeError> {
        if lits.is_empty() {
            return Err(EncodeError::InvalidConstraint(
                "empty literal set".to_string(),
            ));
        }
        if let Some(pos) = lits.iter().position(|wl| wl.weight == 0) {
            return Err(EncodeError::InvalidConstraint(format!(
                "zero weight at position {pos}"
            )));
        }
        if let Some(pos) = lits.iter().position(|wl| wl.lit == 0) {
            return Err(EncodeError::InvalidConstraint(format!(
                "literal 0 at position {pos}"
            )));
        }

        let encoder = Encoder::new(&lits);
        Ok(Self {
            lits,
            relation,
            encoder,
        })
    }

    pub fn at_most(lits: impl IntoIterator<Item = Lit>, k: i64) -> Result<Self, EncodeError> {
        Self::new(lits.into_iter().map(WeightedLit::from).collect(), Relation::AtMost(k))
    }

    pub fn at_least(lits: impl IntoIterator<Item = Lit>, k: i64) -> Result<Self, EncodeError> {
        Self::new(lits.into_iter().map(WeightedLit::from).collect(), Relation::AtLeast(k))
    }

    pub fn between(
        lits: impl IntoIterator<Item = Lit>,
        lower: i64,
        upper: i64,
    ) -> Result<Self, EncodeError> {
        Self::new(
            lits.into_iter().map(WeightedLit::from).collect(),
            Relation::Between(lower, upper),
        )
    }

    pub fn lits(&self) -> &[WeightedLit] {
        &self.lits
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn is_cardinality(&self) -> bool {
        self.lits.iter().all(|wl| wl.weight == 1)
    }

    pub fn is_encoded(&self) -> bool {
        self.encoder.is_built()
    }

    /// Whether the encoding has already emitted the empty clause.
    pub fn is_refuted(&self) -> bool {
        self.encoder.is_refuted()
    }

    /// Smallest and largest value the weighted sum can take.
    pub fn range(&self) -> (i64, i64) {
        self.encoder.range()
    }

    /// Weighted sum under an assignment given as a literal predicate.
    pub fn value(&self, is_true: impl Fn(Lit) -> bool) -> i64 {
        self.lits
            .iter()
            .filter(|wl| is_true(wl.lit))
            .map(|wl| i64::from(wl.weight))
            .sum()
    }

    pub fn is_satisfied_by(&self, is_true: impl Fn(Lit) -> bool) -> bool {
        let value = self.value(is_true);
        self.relation.lower().map_or(true, |lower| value >= lower)
            && self.relation.upper().map_or(true, |upper| value <= upper)
    }

    /// Appends the network and the clauses enforcing the current bounds.
    pub fn encode(
        &mut self,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Result<(), EncodeError> {
        self.encoder.encode_initial(self.relation, log, alloc)
    }

    /// Lowers the upper bound to `upper`, appending only the new clauses.
    pub fn tighten_leq(
        &mut self,
        upper: i64,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Result<(), EncodeError> {
        let current = self
            .relation
            .upper()
            .ok_or(EncodeError::MissingBound(BoundSide::Upper))?;
        if upper >= current {
            return Err(EncodeError::NonMonotonicBound {
                side: BoundSide::Upper,
                current,
                new: upper,
            });
        }

        let relation = self.relation.with_upper(upper);
        self.encoder
            .encode_tighten(relation, BoundSide::Upper, log, alloc)?;
        self.relation = relation;
        Ok(())
    }

    /// Raises the lower bound to `lower`, appending only the new clauses.
    pub fn tighten_geq(
        &mut self,
        lower: i64,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Result<(), EncodeError> {
        let current = self
            .relation
            .lower()
            .ok_or(EncodeError::MissingBound(BoundSide::Lower))?;
        if lower <= current {
            return Err(EncodeError::NonMonotonicBound {
                side: BoundSide::Lower,
                current,
                new: lower,
            });
        }

        let relation = self.relation.with_lower(lower);
        self.encoder
            .encode_tighten(relation, BoundSide::Lower, log, alloc)?;
        self.relation = relation;
        Ok(())
    }
}
