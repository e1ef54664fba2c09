use crate::types::{Clause, Lit, Solution, Var};

/// Incremental SAT engine consuming encoder output.
///
/// Clauses are handed over as plain literal slices without the DIMACS
/// terminator; the engine owns its copy from then on.
pub trait SatEngine {
    fn var_count(&self) -> usize;

    fn new_var(&mut self) -> Var;

    /// Returns `false` once the engine is permanently unsatisfiable.
    fn add_clause(&mut self, clause: &[Lit]) -> bool;

    /// Assumes `lit` for the next call to `solve` only.
    fn assume(&mut self, lit: Lit);

    fn solve(&mut self) -> Solution;

    /// Value of `lit` in the last model, `None` unless the last solve was SAT.
    fn value(&self, lit: Lit) -> Option<bool>;

    fn add_clauses(&mut self, clauses: &[Clause]) -> bool {
        clauses
            .iter()
            .fold(true, |ok, clause| self.add_clause(clause) && ok)
    }

    fn reserve_vars(&mut self, var_count: usize) {
        while self.var_count() < var_count {
            self.new_var();
        }
    }
}
