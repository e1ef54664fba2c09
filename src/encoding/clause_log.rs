use crate::types::{to_var, Clause, Problem};

/// Append-only sequence of emitted clauses.
///
/// Indices stay valid for the lifetime of the log. Capture `mark()` before
/// an encode call and read `since(mark)` afterwards to get its delta.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClauseLog {
    clauses: Vec<Clause>,
}

impl ClauseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, clause: Clause) {
        debug_assert!(!clause.contains(&0));
        self.clauses.push(clause);
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn mark(&self) -> usize {
        self.len()
    }

    /// Clauses appended at or after index `mark`.
    pub fn since(&self, mark: usize) -> &[Clause] {
        &self.clauses[mark.min(self.clauses.len())..]
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn max_var(&self) -> usize {
        self.clauses
            .iter()
            .flatten()
            .map(|&lit| to_var(lit))
            .max()
            .unwrap_or(0)
    }

    pub fn to_problem(&self, var_count: usize) -> Problem {
        Problem {
            var_count: var_count.max(self.max_var()),
            clauses: self.clauses.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClauseLog;

    #[test]
    fn since_mark() {
        let mut log = ClauseLog::new();
        log.append(vec![1, 2]);
        let mark = log.mark();
        log.append(vec![-1]);
        log.append(vec![3, -2]);

        assert_eq!(log.since(mark), &[vec![-1], vec![3, -2]]);
        assert_eq!(log.since(mark), log.since(mark));
        assert_eq!(log.since(log.len()), &[] as &[Vec<i32>]);
        assert_eq!(log.since(0).len(), 3);
    }

    #[test]
    fn problem() {
        let mut log = ClauseLog::new();
        log.append(vec![1, -5]);
        log.append(vec![]);
        let problem = log.to_problem(2);
        assert_eq!(problem.var_count, 5);
        assert_eq!(problem.clauses.len(), 2);
        assert_eq!(log.to_problem(9).var_count, 9);
    }
}
