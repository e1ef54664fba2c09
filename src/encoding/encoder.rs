use log::debug;

use crate::{
    error::{BoundSide, EncodeError},
    types::{negate, Lit},
};

use super::{
    alloc::VarAllocator,
    clause_log::ClauseLog,
    constraint::{Relation, WeightedLit},
    counter::SequentialCounter,
    totalizer::GeneralizedTotalizer,
};

enum Network {
    Counter(SequentialCounter),
    Totalizer(GeneralizedTotalizer),
}

/// `sum(weight * lit) <= bound` over strictly positive weights.
struct AtMost {
    inputs: Vec<(i64, Lit)>,
    total: i64,
    network: Option<Network>,
    cleared: bool,
}

impl AtMost {
    fn new(inputs: Vec<(i64, Lit)>) -> Self {
        let total = inputs.iter().map(|&(weight, _)| weight).sum();
        Self {
            inputs,
            total,
            network: None,
            cleared: false,
        }
    }

    fn is_cardinality(&self) -> bool {
        self.inputs.iter().all(|&(weight, _)| weight == 1)
    }

    /// Returns `false` if no assignment can meet `bound`.
    fn enforce(&mut self, bound: i64, log: &mut ClauseLog, alloc: &mut VarAllocator) -> bool {
        if bound < 0 {
            return false;
        }
        if bound >= self.total || self.cleared {
            return true;
        }
        if bound == 0 {
            for &(_, lit) in &self.inputs {
                log.append(vec![negate(lit)]);
            }
            self.cleared = true;
            return true;
        }

        match &mut self.network {
            Some(Network::Counter(counter)) => counter.enforce(bound as usize, log),
            Some(Network::Totalizer(totalizer)) => totalizer.enforce(bound, log),
            None => {
                let mark = log.mark();
                let network = if self.is_cardinality() {
                    let lits = self.inputs.iter().map(|&(_, lit)| lit).collect();
                    let counter = SequentialCounter::build(lits, bound as usize, log, alloc);
                    counter.enforce(bound as usize, log);
                    Network::Counter(counter)
                } else {
                    let mut totalizer = GeneralizedTotalizer::build(&self.inputs, bound, log, alloc);
                    totalizer.enforce(bound, log);
                    Network::Totalizer(totalizer)
                };
                debug!(
                    "built {} network over {} inputs: {} clauses, next var {}",
                    if self.is_cardinality() { "counter" } else { "totalizer" },
                    self.inputs.len(),
                    log.len() - mark,
                    alloc.peek()
                );
                self.network = Some(network);
            }
        }
        true
    }
}

/// Turns a weighted constraint into clauses and keeps the network it
/// built so that later, stricter bounds only append their delta.
///
/// Both bounded sides are rewritten into at-most form with positive
/// weights: a negative weight `w` on `l` becomes `-w` on `-l` plus a
/// constant offset, and the lower side works on the negated literals
/// against `total - lower`.
pub struct Encoder {
    upper: AtMost,
    lower: AtMost,
    offset: i64,
    total: i64,
    built: bool,
    refuted: bool,
}

impl Encoder {
    pub fn new(lits: &[WeightedLit]) -> Self {
        let mut offset = 0;
        let inputs: Vec<(i64, Lit)> = lits
            .iter()
            .map(|&WeightedLit { weight, lit }| {
                let weight = i64::from(weight);
                if weight < 0 {
                    offset += weight;
                    (-weight, negate(lit))
                } else {
                    (weight, lit)
                }
            })
            .collect();
        let total = inputs.iter().map(|&(weight, _)| weight).sum();
        let negated = inputs
            .iter()
            .map(|&(weight, lit)| (weight, negate(lit)))
            .collect();

        Self {
            upper: AtMost::new(inputs),
            lower: AtMost::new(negated),
            offset,
            total,
            built: false,
            refuted: false,
        }
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Whether the empty clause has been emitted.
    pub fn is_refuted(&self) -> bool {
        self.refuted
    }

    /// Smallest and largest value the weighted sum can take.
    pub fn range(&self) -> (i64, i64) {
        (self.offset, self.offset + self.total)
    }

    pub fn encode_initial(
        &mut self,
        relation: Relation,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Result<(), EncodeError> {
        if self.built {
            return Err(EncodeError::AlreadyEncoded);
        }
        self.built = true;

        let mark = log.mark();
        if relation.is_empty() {
            self.refute(log);
        }
        if let Some(upper) = relation.upper() {
            self.enforce(BoundSide::Upper, upper, log, alloc);
        }
        if let Some(lower) = relation.lower() {
            self.enforce(BoundSide::Lower, lower, log, alloc);
        }
        debug!("encoded {relation:?}: {} clauses", log.len() - mark);
        Ok(())
    }

    /// Enforces the `side` bound of `relation`, which must be stricter than
    /// the one enforced before. Does nothing before `encode_initial`.
    pub fn encode_tighten(
        &mut self,
        relation: Relation,
        side: BoundSide,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Result<(), EncodeError> {
        if !self.built {
            return Ok(());
        }

        let mark = log.mark();
        let bound = match side {
            BoundSide::Upper => relation.upper(),
            BoundSide::Lower => relation.lower(),
        }
        .ok_or(EncodeError::MissingBound(side))?;
        if relation.is_empty() {
            self.refute(log);
        }
        self.enforce(side, bound, log, alloc);
        debug!("tightened {side} bound to {bound}: {} clauses", log.len() - mark);
        Ok(())
    }

    fn enforce(
        &mut self,
        side: BoundSide,
        bound: i64,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) {
        if self.refuted {
            return;
        }
        // saturated bounds stay on the trivial side they came from
        let shifted = bound.saturating_sub(self.offset);
        let feasible = match side {
            BoundSide::Upper => self.upper.enforce(shifted, log, alloc),
            BoundSide::Lower => {
                let excess = self.total.saturating_sub(shifted);
                self.lower.enforce(excess, log, alloc)
            }
        };
        if !feasible {
            self.refute(log);
        }
    }

    fn refute(&mut self, log: &mut ClauseLog) {
        if !self.refuted {
            log.append(vec![]);
            self.refuted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        encoding::{
            alloc::VarAllocator,
            clause_log::ClauseLog,
            constraint::{Relation, WeightedLit},
        },
        error::{BoundSide, EncodeError},
    };

    use super::Encoder;

    fn lits(pairs: &[(i32, i32)]) -> Vec<WeightedLit> {
        pairs
            .iter()
            .map(|&(weight, lit)| WeightedLit { weight, lit })
            .collect()
    }

    #[test]
    fn normalization() {
        let encoder = Encoder::new(&lits(&[(2, 1), (-3, 2), (1, 3)]));
        assert_eq!(encoder.range(), (-3, 3));
    }

    #[test]
    fn trivially_true() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(4);
        let mut encoder = Encoder::new(&lits(&[(1, 1), (1, 2), (1, 3)]));
        encoder
            .encode_initial(Relation::AtMost(3), &mut log, &mut alloc)
            .unwrap();
        assert!(log.is_empty());
        assert_eq!(alloc.peek(), 4);
    }

    #[test]
    fn trivially_false_once() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(3);
        let mut encoder = Encoder::new(&lits(&[(1, 1), (1, 2)]));
        encoder
            .encode_initial(Relation::AtLeast(3), &mut log, &mut alloc)
            .unwrap();
        assert_eq!(log.clauses(), &[Vec::<i32>::new()]);
        assert!(encoder.is_refuted());

        encoder
            .encode_tighten(Relation::AtLeast(4), BoundSide::Lower, &mut log, &mut alloc)
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn zero_bound_units() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(3);
        let mut encoder = Encoder::new(&lits(&[(1, 1), (1, -2)]));
        encoder
            .encode_initial(Relation::AtMost(0), &mut log, &mut alloc)
            .unwrap();
        assert_eq!(log.clauses(), &[vec![-1], vec![2]]);

        encoder
            .encode_tighten(Relation::AtMost(-1), BoundSide::Upper, &mut log, &mut alloc)
            .unwrap();
        assert_eq!(log.since(2), &[Vec::<i32>::new()]);
    }

    #[test]
    fn extreme_bounds() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(3);

        let mut encoder = Encoder::new(&lits(&[(1, 1), (-1, 2)]));
        encoder
            .encode_initial(Relation::AtMost(i64::MAX), &mut log, &mut alloc)
            .unwrap();
        let mut encoder = Encoder::new(&lits(&[(1, 1), (1, 2)]));
        encoder
            .encode_initial(Relation::AtLeast(i64::MIN), &mut log, &mut alloc)
            .unwrap();
        let mut encoder = Encoder::new(&lits(&[(2, 1), (-3, 2)]));
        encoder
            .encode_initial(Relation::Between(i64::MIN, i64::MAX), &mut log, &mut alloc)
            .unwrap();
        assert!(log.is_empty());
        assert_eq!(alloc.peek(), 3);

        let mut encoder = Encoder::new(&lits(&[(1, 1), (-1, 2)]));
        encoder
            .encode_initial(Relation::AtLeast(i64::MAX), &mut log, &mut alloc)
            .unwrap();
        assert!(encoder.is_refuted());
        let mut encoder = Encoder::new(&lits(&[(-1, 1), (1, 2)]));
        encoder
            .encode_initial(Relation::AtMost(i64::MIN), &mut log, &mut alloc)
            .unwrap();
        assert!(encoder.is_refuted());
        assert_eq!(log.clauses(), &[Vec::<i32>::new(), Vec::<i32>::new()]);
    }

    #[test]
    fn encoded_twice() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(3);
        let mut encoder = Encoder::new(&lits(&[(1, 1), (1, 2)]));
        encoder
            .encode_initial(Relation::AtMost(1), &mut log, &mut alloc)
            .unwrap();
        assert_eq!(
            encoder.encode_initial(Relation::AtMost(1), &mut log, &mut alloc),
            Err(EncodeError::AlreadyEncoded)
        );
    }

    #[test]
    fn crossing_bounds() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(4);
        let mut encoder = Encoder::new(&lits(&[(1, 1), (1, 2), (1, 3)]));
        encoder
            .encode_initial(Relation::Between(2, 1), &mut log, &mut alloc)
            .unwrap();
        assert_eq!(log.clauses(), &[Vec::<i32>::new()]);
        assert!(encoder.is_refuted());
    }
}
