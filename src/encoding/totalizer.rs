//! Generalized totalizer for weighted at-most constraints.
//!
//! Every node of a balanced binary tree over the inputs owns one output
//! literal per reachable partial sum. Sums above the first enforced bound
//! are collapsed into a single `cap` output, which keeps the tree valid for
//! every smaller bound.

use std::collections::BTreeMap;

use log::trace;

use crate::types::{negate, Lit};

use super::{alloc::VarAllocator, clause_log::ClauseLog};

type Outputs = BTreeMap<i64, Lit>;

pub struct GeneralizedTotalizer {
    root: Outputs,
    cap: i64,
    /// Bound whose excess outputs are already forbidden.
    enforced: i64,
}

impl GeneralizedTotalizer {
    /// Builds the tree for bound `bound`. Requires `bound >= 0` and a non-empty input.
    pub fn build(
        inputs: &[(i64, Lit)],
        bound: i64,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Self {
        debug_assert!(!inputs.is_empty());
        debug_assert!(inputs.iter().all(|&(weight, _)| weight > 0));

        let cap = bound + 1;
        let root = Self::build_node(inputs, cap, log, alloc);

        trace!(
            "generalized totalizer over {} inputs with {} root outputs",
            inputs.len(),
            root.len()
        );

        Self {
            root,
            cap,
            enforced: cap,
        }
    }

    fn build_node(
        inputs: &[(i64, Lit)],
        cap: i64,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Outputs {
        if let [(weight, lit)] = inputs {
            return Outputs::from([((*weight).min(cap), *lit)]);
        }

        let split = inputs.len() / 2;
        let left = Self::build_node(&inputs[..split], cap, log, alloc);
        let right = Self::build_node(&inputs[split..], cap, log, alloc);

        let mut sums: Vec<i64> = left.keys().chain(right.keys()).copied().collect();
        for a in left.keys() {
            for c in right.keys() {
                sums.push((a + c).min(cap));
            }
        }
        sums.sort_unstable();
        sums.dedup();

        let outputs: Outputs = sums.into_iter().map(|s| (s, alloc.alloc_lit())).collect();

        for (a, &la) in left.iter().chain(right.iter()) {
            log.append(vec![negate(la), outputs[a]]);
        }
        for (a, &la) in &left {
            for (c, &lc) in &right {
                log.append(vec![negate(la), negate(lc), outputs[&(a + c).min(cap)]]);
            }
        }

        outputs
    }

    pub fn cap(&self) -> i64 {
        self.cap
    }

    /// Appends one unit per root output in `(bound, enforced]`.
    pub fn enforce(&mut self, bound: i64, log: &mut ClauseLog) {
        debug_assert!(bound >= 0);
        if bound >= self.enforced {
            return;
        }
        debug_assert!(bound < self.cap());
        for (_, &lit) in self.root.range(bound + 1..=self.enforced) {
            log.append(vec![negate(lit)]);
        }
        self.enforced = bound;
    }
}

#[cfg(test)]
mod tests {
    use crate::encoding::{alloc::VarAllocator, clause_log::ClauseLog};

    use super::GeneralizedTotalizer;

    #[test]
    fn two_leaves() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(3);
        let mut gte = GeneralizedTotalizer::build(&[(2, 1), (3, 2)], 4, &mut log, &mut alloc);

        // sums 2, 3 and 5 collapsed into the cap
        assert_eq!(gte.cap(), 5);
        assert_eq!(alloc.peek(), 6);
        assert_eq!(log.clauses(), &[vec![-1, 3], vec![-2, 4], vec![-1, -2, 5]]);

        let mark = log.mark();
        gte.enforce(4, &mut log);
        assert_eq!(log.since(mark), &[vec![-5]]);

        let mark = log.mark();
        gte.enforce(2, &mut log);
        assert_eq!(log.since(mark), &[vec![-4]]);

        let mark = log.mark();
        gte.enforce(2, &mut log);
        assert!(log.since(mark).is_empty());
    }

    #[test]
    fn single_leaf() {
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::new(2);
        let mut gte = GeneralizedTotalizer::build(&[(7, -1)], 3, &mut log, &mut alloc);
        assert!(log.is_empty());

        gte.enforce(3, &mut log);
        assert_eq!(log.clauses(), &[vec![1]]);
    }
}
