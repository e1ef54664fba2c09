mod assignment;
mod branching;
mod limits;
mod map;
mod restart;

use std::time::Instant;

use log::{debug, trace};

use crate::{
    engine::SatEngine,
    types::{to_var, Clause, Lit, Problem, Solution, Var},
};

pub use self::limits::{Interrupt, Limits};

use self::{
    assignment::{Assignment, Reason},
    branching::Chooser,
    map::LitMap,
    restart::Restarts,
};

pub const DEFAULT_RESTART_BASE: usize = 16;

enum Assumption {
    Pending(Lit),
    Violated(Lit),
    Satisfied,
}

/// Incremental CDCL solver.
///
/// Clauses may be added between calls to `solve`; learnt clauses are kept.
/// Assumptions only hold for the next call.
pub struct Solver {
    var_count: usize,
    clauses: Vec<Clause>,
    learnt_count: usize,
    unsat: bool,

    assignment: Assignment,

    watched: LitMap<Vec<usize>>,
    prop_head: usize,

    chooser: Chooser,
    restarts: Restarts,

    assumptions: Vec<Lit>,
    model: Vec<Lit>,
    limits: Limits,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(Problem::default())
    }
}

impl Solver {
    pub fn new(problem: Problem) -> Self {
        let Problem { var_count, clauses } = problem;

        let mut solver = Solver {
            var_count,
            clauses: Vec::with_capacity(clauses.len()),
            learnt_count: 0,
            unsat: false,
            assignment: Assignment::new(var_count),
            watched: LitMap::new(var_count),
            prop_head: 0,
            chooser: Chooser::new(var_count),
            restarts: Restarts::new(DEFAULT_RESTART_BASE),
            assumptions: vec![],
            model: vec![],
            limits: Limits::default(),
        };

        for clause in &clauses {
            solver.add_clause(clause);
        }

        solver
    }

    pub fn with_restart_base(mut self, base: usize) -> Self {
        self.restarts = Restarts::new(base);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.limits.set_deadline(deadline);
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.limits.set_interrupt(interrupt);
        self
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.limits.set_deadline(deadline);
    }

    /// Handle that stops a running `solve` from another thread.
    pub fn interrupt(&self) -> Interrupt {
        self.limits.interrupt().clone()
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub fn learnt_count(&self) -> usize {
        self.learnt_count
    }

    fn grow(&mut self, var_count: usize) {
        if var_count > self.var_count {
            self.var_count = var_count;
            self.assignment.grow(var_count);
            self.watched.grow(var_count);
            self.chooser.grow(var_count);
        }
    }

    /// Adds `lits` as a clause. Returns `false` once the clause set is
    /// known to be unsatisfiable without assumptions.
    pub fn add_clause(&mut self, lits: &[Lit]) -> bool {
        if self.unsat {
            return false;
        }
        if let Some(max_var) = lits.iter().map(|&lit| to_var(lit)).max() {
            self.grow(max_var);
        }

        let mut clause = lits.to_vec();
        clause.sort();
        clause.dedup();
        if clause.iter().any(|&lit| clause.binary_search(&-lit).is_ok()) {
            return true;
        }
        if clause.is_empty() {
            debug!("empty clause added");
            self.unsat = true;
            return false;
        }

        self.add(clause);
        true
    }

    /// Decides `var` before variables that were not marked.
    pub fn set_important(&mut self, var: Var) {
        self.grow(var);
        self.chooser.prioritize(var);
    }

    /// Assumes `lit` for the next call to `solve` only.
    pub fn assume(&mut self, lit: Lit) {
        self.grow(to_var(lit));
        self.assumptions.push(lit);
    }

    fn add(&mut self, clause: Clause) -> usize {
        let i = self.clauses.len();
        if let [lit0, lit1, ..] = clause[..] {
            self.watched[lit0].push(i);
            self.watched[lit1].push(i);
        }
        self.clauses.push(clause);
        i
    }

    fn propagate(&mut self) -> Option<usize> {
        while let Some(lit) = self.assignment.trail().get(self.prop_head) {
            let lit = -lit;

            let mut i = 0;
            'clause: while i < self.watched[lit].len() {
                let c = self.watched[lit][i];
                let clause = &mut self.clauses[c];

                // Implicit watches: the two watched literals are always
                // stored at index 0 and 1.

                if clause[1] != lit {
                    clause.swap(0, 1);
                }
                debug_assert_eq!(clause[1], lit);

                for j in 0..clause.len() {
                    match self.assignment.eval(clause[j]) {
                        Some(true) => {
                            i += 1;
                            continue 'clause;
                        }
                        None if j != 0 => {
                            clause.swap(1, j);
                            debug_assert_ne!(clause[0], clause[1]);

                            self.watched[lit].swap_remove(i);
                            debug_assert!(!self.watched[clause[1]].contains(&c));
                            self.watched[clause[1]].push(c);

                            continue 'clause;
                        }
                        _ => (),
                    }
                }

                if self.assignment.eval(clause[0]).is_none() {
                    let unit_lit = clause[0];
                    self.assignment
                        .set(unit_lit, Reason::Propagation { i_clause: c });
                } else {
                    return Some(c);
                }

                i += 1;
            }

            self.prop_head += 1;
        }

        None
    }

    // based on minisat's basic clause minimization
    fn simplify(&self, learnt: &mut Clause) {
        let mut i = 1;
        while i < learnt.len() {
            if let Some(Reason::Propagation { i_clause }) = self.assignment.reason(learnt[i]) {
                let remove = self.clauses[i_clause].iter().all(|&lit| {
                    learnt.contains(&lit)
                        || learnt.contains(&-lit)
                        || self.assignment.level(lit) == Some(0)
                });
                if remove {
                    learnt.swap_remove(i);
                    continue;
                }
            }
            i += 1;
        }
    }

    fn level_of(&self, lit: Lit) -> usize {
        self.assignment
            .level(lit)
            .expect("literals of a conflict are assigned")
    }

    /// Derives the first-UIP clause for a conflict above level 0 and the
    /// level to backtrack to.
    fn analyze(&mut self, i_conflict: usize) -> (Clause, usize) {
        let mut learnt = self.clauses[i_conflict].clone();
        let last_level = self.assignment.last_level();

        let mut i_trail = self.assignment.trail().len();
        let i_assert = loop {
            for &lit in &learnt {
                self.chooser.touch(to_var(lit));
            }

            let mut at_last = learnt
                .iter()
                .enumerate()
                .filter(|(_, &lit)| self.level_of(lit) >= last_level)
                .map(|(i, _)| i);
            let first = at_last.next();
            if let (Some(i), None) = (first, at_last.next()) {
                break i;
            }

            i_trail -= 1;
            let on_lit = self.assignment.trail()[i_trail];

            let Some(Reason::Propagation { i_clause: i_reason }) = self.assignment.reason(on_lit)
            else {
                continue;
            };
            let reason = &self.clauses[i_reason];
            debug_assert!(reason.contains(&on_lit));

            let len_before = learnt.len();
            learnt.retain(|&lit| lit != -on_lit);
            if learnt.len() != len_before {
                // learnt contained -on_lit, finish the resolution
                learnt.extend(reason.iter().filter(|&&lit| lit != on_lit));
                // need to dedup to correctly determine #lits at a given level
                learnt.sort();
                learnt.dedup();
            }
        };

        learnt.swap(0, i_assert);

        self.simplify(&mut learnt);

        let backtrack_level = match learnt[1..]
            .iter()
            .enumerate()
            .max_by_key(|(_, &lit)| self.level_of(lit))
        {
            None => 1,
            Some((i_max, _)) => {
                learnt.swap(1, i_max + 1);
                self.level_of(learnt[1]) + 1
            }
        };

        self.chooser.rescale();

        (learnt, backtrack_level)
    }

    fn next_assumption(&self, assumptions: &[Lit]) -> Assumption {
        for &lit in assumptions {
            match self.assignment.eval(lit) {
                None => return Assumption::Pending(lit),
                Some(false) => return Assumption::Violated(lit),
                Some(true) => (),
            }
        }
        Assumption::Satisfied
    }

    fn restart(&mut self) {
        if self.assignment.last_level() >= 1 {
            self.assignment.backtrack(1);
            self.prop_head = std::cmp::min(self.prop_head, self.assignment.trail().len());
        }
    }

    fn search(&mut self, assumptions: &[Lit]) -> Solution {
        if self.unsat {
            return Solution::Unsat;
        }

        for (i, clause) in self.clauses.iter().enumerate() {
            if let [lit] = clause[..] {
                match self.assignment.eval(lit) {
                    None => self
                        .assignment
                        .set(lit, Reason::Propagation { i_clause: i }),
                    Some(false) => {
                        self.unsat = true;
                        return Solution::Unsat;
                    }
                    Some(true) => (),
                }
            }
        }

        if self.propagate().is_some() {
            self.unsat = true;
            return Solution::Unsat;
        }

        loop {
            if self.limits.reached() {
                return Solution::Unknown;
            }

            let lit = match self.next_assumption(assumptions) {
                Assumption::Pending(lit) => lit,
                Assumption::Violated(lit) => {
                    trace!("assumption {lit} falsified");
                    return Solution::Unsat;
                }
                Assumption::Satisfied => match self.chooser.choose(&self.assignment) {
                    Some(var) => -(var as Lit),
                    None => break,
                },
            };
            self.assignment.set(lit, Reason::Decision);

            while let Some(i_conflict) = self.propagate() {
                self.restarts.conflict();

                if self.assignment.last_level() == 0 {
                    self.unsat = true;
                    return Solution::Unsat;
                }

                let (learnt, level) = self.analyze(i_conflict);
                self.assignment.backtrack(level);
                self.prop_head = std::cmp::min(self.prop_head, self.assignment.trail().len());

                let lit_assert = learnt[0];
                let i_clause = self.add(learnt);
                self.learnt_count += 1;
                self.assignment
                    .set(lit_assert, Reason::Propagation { i_clause });
            }

            if self.restarts.due() {
                self.restart();
            }
        }

        let mut model: Vec<Lit> = self.assignment.trail().to_vec();
        model.sort_by_key(|&lit| to_var(lit));
        Solution::Sat { model }
    }

    pub fn solve(&mut self) -> Solution {
        let assumptions = std::mem::take(&mut self.assumptions);
        let solution = self.search(&assumptions);

        self.assignment.clear();
        self.prop_head = 0;
        self.model = match &solution {
            Solution::Sat { model } => model.clone(),
            _ => vec![],
        };

        debug!(
            "{} with {} assumptions: {} vars, {} clauses ({} learnt), {} conflicts",
            match solution {
                Solution::Sat { .. } => "SAT",
                Solution::Unsat => "UNSAT",
                Solution::Unknown => "UNKNOWN",
            },
            assumptions.len(),
            self.var_count,
            self.clauses.len(),
            self.learnt_count,
            self.restarts.total_conflicts()
        );
        solution
    }

    /// Value of `lit` in the last model.
    pub fn value(&self, lit: Lit) -> Option<bool> {
        self.model
            .get(to_var(lit) - 1)
            .map(|&assigned| assigned == lit)
    }
}

impl SatEngine for Solver {
    fn var_count(&self) -> usize {
        self.var_count
    }

    fn new_var(&mut self) -> Var {
        let var = self.var_count + 1;
        self.grow(var);
        var
    }

    fn add_clause(&mut self, clause: &[Lit]) -> bool {
        Solver::add_clause(self, clause)
    }

    fn assume(&mut self, lit: Lit) {
        Solver::assume(self, lit)
    }

    fn solve(&mut self) -> Solution {
        Solver::solve(self)
    }

    fn value(&self, lit: Lit) -> Option<bool> {
        Solver::value(self, lit)
    }
}

/// Checks `solution` against `problem`, `sat` being the expected outcome.
pub fn verify(problem: &Problem, sat: bool, solution: &Solution) -> bool {
    match solution {
        Solution::Sat { model } => {
            if sat {
                let mut sorted = model.to_vec();
                sorted.sort();
                problem
                    .clauses
                    .iter()
                    .all(|clause| clause.iter().any(|lit| sorted.binary_search(lit).is_ok()))
            } else {
                false
            }
        }
        Solution::Unsat => !sat,
        Solution::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::{
        engine::SatEngine,
        types::{Clause, Problem, Solution},
    };

    use super::{verify, Solver};

    fn check(clauses: Vec<Clause>, sat: bool) {
        let problem = Problem {
            var_count: clauses.iter().flatten().max().unwrap().unsigned_abs() as usize,
            clauses,
        };

        let solution = Solver::new(problem.clone()).solve();
        assert!(verify(&problem, sat, &solution));
    }

    #[test]
    fn basic_sat() {
        let clauses = vec![vec![1, 2], vec![-1, 2], vec![-1, -2, 3], vec![-1, -2, -3]];
        check(clauses, true);

        let clauses = vec![
            vec![-1, -2, 3],
            vec![2, -1, 3],
            vec![1, -2, 3],
            vec![-3, 4, 5],
            vec![-3, 4, -5],
            vec![-3, -4, 5],
            vec![-3, -4, -5],
        ];
        check(clauses, true);
    }

    #[test]
    fn basic_unsat() {
        let clauses = vec![
            vec![1, 2],
            vec![-2, 3],
            vec![-2, -3],
            vec![-1, -2, -4],
            vec![-1, 2, -4],
            vec![-1, 2, 4],
        ];

        check(clauses, false);
    }

    #[test]
    /// Formulas with non-trivial propagation before the first decision.
    fn kickstart() {
        let clauses = vec![vec![1], vec![-1, 2], vec![-1, -2]];
        check(clauses, false);
    }

    #[test]
    fn tautologies_dropped() {
        let mut solver = Solver::default();
        assert!(solver.add_clause(&[1, -1]));
        assert!(solver.add_clause(&[2, 2]));
        assert_eq!(solver.clause_count(), 1);
        assert!(solver.solve().is_sat());
        assert_eq!(solver.value(2), Some(true));
    }

    #[test]
    fn incremental() {
        let mut solver = Solver::default();
        solver.add_clause(&[1, 2, 3]);
        assert!(solver.solve().is_sat());

        solver.add_clause(&[-1]);
        solver.add_clause(&[-2]);
        assert_eq!(solver.solve(), Solution::Sat { model: vec![-1, -2, 3] });
        assert_eq!(solver.value(-3), Some(false));

        assert!(!solver.add_clause(&[]));
        assert_eq!(solver.solve(), Solution::Unsat);
        assert_eq!(solver.value(3), None);
    }

    #[test]
    fn assumptions_are_temporary() {
        let mut solver = Solver::default();
        solver.add_clause(&[-1, 2]);
        solver.add_clause(&[-2, 3]);

        solver.assume(1);
        solver.assume(-3);
        assert_eq!(solver.solve(), Solution::Unsat);

        solver.assume(1);
        match solver.solve() {
            Solution::Sat { model } => assert_eq!(model, vec![1, 2, 3]),
            other => panic!("expected a model, got {other:?}"),
        }

        solver.assume(-3);
        assert!(solver.solve().is_sat());
        assert_eq!(solver.value(1), Some(false));
    }

    #[test]
    fn new_vars() {
        let mut solver = Solver::default();
        let a = solver.new_var();
        let b = solver.new_var();
        assert_eq!((a, b), (1, 2));
        SatEngine::add_clause(&mut solver, &[-1]);
        solver.reserve_vars(4);
        assert_eq!(SatEngine::var_count(&solver), 4);

        let Solution::Sat { model } = solver.solve() else {
            panic!("expected a model");
        };
        assert_eq!(model.len(), 4);
        assert_eq!(model[0], -1);
    }

    #[test]
    fn important_first() {
        let mut solver = Solver::default();
        solver.add_clause(&[1, 2]);
        solver.add_clause(&[-1, -2]);
        solver.set_important(2);
        // decisions are negative, so the important variable ends up false
        assert_eq!(solver.solve(), Solution::Sat { model: vec![1, -2] });
    }

    #[test]
    fn deadline_expired() {
        let mut solver = Solver::default().with_deadline(Some(Instant::now()));
        solver.add_clause(&[1, 2]);
        assert_eq!(solver.solve(), Solution::Unknown);

        solver.set_deadline(Some(Instant::now() + Duration::from_secs(3600)));
        assert!(solver.solve().is_sat());
    }

    #[test]
    fn interrupted() {
        let mut solver = Solver::default();
        solver.add_clause(&[1, 2]);
        let interrupt = solver.interrupt();
        interrupt.raise();
        assert_eq!(solver.solve(), Solution::Unknown);
        interrupt.clear();
        assert!(solver.solve().is_sat());
    }

    #[test]
    fn pigeonhole() {
        // 4 pigeons, 3 holes; p(i, h) = 3 * i + h + 1
        let p = |i: i32, h: i32| 3 * i + h + 1;
        let mut clauses: Vec<Clause> = (0..4).map(|i| (0..3).map(|h| p(i, h)).collect()).collect();
        for h in 0..3 {
            for i in 0..4 {
                for j in i + 1..4 {
                    clauses.push(vec![-p(i, h), -p(j, h)]);
                }
            }
        }
        let mut solver = Solver::new(Problem {
            var_count: 12,
            clauses: clauses.clone(),
        });
        assert_eq!(solver.solve(), Solution::Unsat);
        assert!(solver.learnt_count() > 0);

        check(clauses, false);
    }
}
