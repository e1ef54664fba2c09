//! One-shot cardinality encodings without auxiliary variables.
//!
//! The binomial encoding forbids every subset of `k + 1` literals, so it
//! emits `C(n, k + 1)` clauses. It only pays off for small `n` and a bound
//! that is never tightened afterwards.

use crate::types::{negate, Lit};

use super::clause_log::ClauseLog;

fn forbid_subsets(lits: &[Lit], size: usize, current: &mut Vec<Lit>, log: &mut ClauseLog) {
    if current.len() == size {
        log.append(current.clone());
        return;
    }
    let missing = size - current.len();
    for i in 0..lits.len() {
        if lits.len() - i < missing {
            break;
        }
        current.push(negate(lits[i]));
        forbid_subsets(&lits[i + 1..], size, current, log);
        current.pop();
    }
}

/// At most `k` of `lits` are true.
pub fn binomial_at_most(lits: &[Lit], k: i64, log: &mut ClauseLog) {
    if k < 0 {
        log.append(vec![]);
        return;
    }
    if k >= lits.len() as i64 {
        return;
    }
    let size = k as usize + 1;
    forbid_subsets(lits, size, &mut Vec::with_capacity(size), log);
}

/// At least `k` of `lits` are true, i.e. at most `n - k` are false.
pub fn binomial_at_least(lits: &[Lit], k: i64, log: &mut ClauseLog) {
    let negated: Vec<Lit> = lits.iter().map(|&lit| negate(lit)).collect();
    binomial_at_most(&negated, (lits.len() as i64).saturating_sub(k), log);
}

#[cfg(test)]
mod tests {
    use crate::encoding::clause_log::ClauseLog;

    use super::{binomial_at_least, binomial_at_most};

    #[test]
    fn at_most_one() {
        let mut log = ClauseLog::new();
        binomial_at_most(&[1, 2, 3], 1, &mut log);
        assert_eq!(log.clauses(), &[vec![-1, -2], vec![-1, -3], vec![-2, -3]]);
    }

    #[test]
    fn at_least_two() {
        let mut log = ClauseLog::new();
        binomial_at_least(&[1, -2, 3], 2, &mut log);
        assert_eq!(log.clauses(), &[vec![1, -2], vec![1, 3], vec![-2, 3]]);
    }

    #[test]
    fn trivial() {
        let mut log = ClauseLog::new();
        binomial_at_most(&[1, 2], 2, &mut log);
        assert!(log.is_empty());
        binomial_at_most(&[1, 2], i64::MAX, &mut log);
        binomial_at_least(&[1, 2], i64::MIN, &mut log);
        assert!(log.is_empty());
        binomial_at_least(&[1, 2], 3, &mut log);
        assert_eq!(log.clauses(), &[Vec::<i32>::new()]);
        binomial_at_least(&[1, 2], i64::MAX, &mut log);
        assert_eq!(log.len(), 2);
    }
}
