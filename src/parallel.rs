use std::{collections::BinaryHeap, iter::zip, sync::mpsc::channel, thread, time::Instant};

use log::{debug, info};

use crate::{
    config::SolverConfig,
    solver::{Interrupt, Solver},
    types::{to_var, Lit, Problem, Solution, Var},
};

struct FrequentVars {
    heap: BinaryHeap<(usize, Var)>,
}

impl Iterator for FrequentVars {
    type Item = Var;

    fn next(&mut self) -> Option<Self::Item> {
        self.heap.pop().map(|(_, var)| var)
    }
}

fn frequent_vars(problem: &Problem) -> FrequentVars {
    let mut var_freq: Vec<usize> = vec![0; problem.var_count + 1];

    for &lit in problem.clauses.iter().flatten() {
        var_freq[to_var(lit)] += 1;
    }

    FrequentVars {
        heap: var_freq
            .iter()
            .enumerate()
            .skip(1)
            .map(|(var, &freq)| (freq, var))
            .collect(),
    }
}

type Cube = Vec<Lit>;

fn cubes(vars: &[Var], n: usize) -> Vec<Cube> {
    debug_assert!(u32::try_from(vars.len())
        .ok()
        .and_then(|len| 2usize.checked_pow(len))
        .map_or(true, |max| n <= max));

    match n {
        0 => vec![],
        1 => vec![vec![]],
        _ => {
            let m = n / 2;
            let lit = vars[0] as Lit;

            let mut res1 = cubes(&vars[1..], m);
            for cube in &mut res1 {
                cube.push(lit)
            }

            let mut res2 = cubes(&vars[1..], n - m);
            for cube in &mut res2 {
                cube.push(-lit);
            }

            res1.extend(res2);
            res1
        }
    }
}

/// At most one subproblem per assignment of the variables.
fn clamp_threads(n: usize, var_count: usize) -> usize {
    let max = u32::try_from(var_count)
        .ok()
        .and_then(|count| 2usize.checked_pow(count))
        .unwrap_or(usize::MAX);
    n.clamp(1, max)
}

/// Splits `problem` into `n` subproblems such that
/// the original problem is SAT iff at least one of the subproblems is.
fn split(problem: Problem, n: usize) -> Vec<Problem> {
    let vars: Vec<Var> = frequent_vars(&problem).take(n).collect();
    let cubes = cubes(&vars, n);
    let mut subproblems = vec![problem; n];

    for (subproblem, cube) in zip(subproblems.iter_mut(), cubes) {
        for lit in cube {
            subproblem.clauses.push(vec![lit]);
        }
    }

    subproblems
}

/// Cube-and-conquer portfolio: one solver thread per cube, all stopped by
/// one shared interrupt once a model is found. `solve` returns after every
/// thread has stopped and lowers the interrupt on the way out.
pub struct Portfolio {
    config: SolverConfig,
    interrupt: Interrupt,
}

impl Portfolio {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            interrupt: Interrupt::new(),
        }
    }

    /// Stops every solver of a running `solve`. Raised before `solve`, it
    /// stops the next one.
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    pub fn solve(&self, problem: Problem, important: &[Lit], deadline: Option<Instant>) -> Solution {
        let n = self.config.threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|val| val.get())
                .unwrap_or(2)
        });
        let n = clamp_threads(n, problem.var_count);
        info!("solving with {n} threads");

        let subproblems = split(problem, n);

        let (tx, rx) = channel::<Solution>();

        let solution = thread::scope(|scope| {
            for (i, subproblem) in subproblems.into_iter().enumerate() {
                let thread_tx = tx.clone();
                scope.spawn(move || {
                    let mut solver = Solver::new(subproblem)
                        .with_restart_base(self.config.restart_base)
                        .with_deadline(deadline)
                        .with_interrupt(self.interrupt.clone());
                    for &lit in important {
                        solver.set_important(to_var(lit));
                    }
                    let solution = solver.solve();
                    debug!("cube {i} finished");
                    let _ = thread_tx.send(solution);
                });
            }

            // receiver blocks as long as some transmitter is alive
            drop(tx);

            let mut solution = Solution::Unsat;
            for subsolution in rx {
                match subsolution {
                    Solution::Sat { .. } => {
                        // the remaining threads are joined when the scope ends
                        self.interrupt.raise();
                        return subsolution;
                    }
                    Solution::Unknown => solution = Solution::Unknown,
                    Solution::Unsat => (),
                }
            }
            solution
        });
        self.interrupt.clear();
        solution
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::SolverConfig,
        solver::verify,
        types::{Problem, Solution},
    };

    use super::{clamp_threads, cubes, split, Portfolio};

    #[test]
    fn cube_split() {
        assert_eq!(cubes(&[3, 1], 3), vec![vec![3], vec![1, -3], vec![-1, -3]]);
        assert_eq!(clamp_threads(8, 2), 4);
        assert_eq!(clamp_threads(0, 5), 1);
        assert_eq!(clamp_threads(3, 0), 1);

        let problem = Problem {
            var_count: 2,
            clauses: vec![vec![1, 2], vec![-1, 2]],
        };
        let subproblems = split(problem, 2);
        assert_eq!(subproblems[0].clauses.last(), Some(&vec![2]));
        assert_eq!(subproblems[1].clauses.last(), Some(&vec![-2]));
    }

    #[test]
    fn portfolio() {
        let config = SolverConfig {
            threads: Some(4),
            ..SolverConfig::default()
        };
        let portfolio = Portfolio::new(config);

        let sat = Problem {
            var_count: 3,
            clauses: vec![vec![1, 2], vec![-1, 3], vec![-2, -3]],
        };
        let solution = portfolio.solve(sat.clone(), &[3], None);
        assert!(verify(&sat, true, &solution));

        let unsat = Problem {
            var_count: 2,
            clauses: vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]],
        };
        assert_eq!(portfolio.solve(unsat, &[], None), Solution::Unsat);
    }

    #[test]
    fn interrupt_before_solve() {
        let config = SolverConfig {
            threads: Some(2),
            ..SolverConfig::default()
        };
        let portfolio = Portfolio::new(config);
        let problem = Problem {
            var_count: 3,
            clauses: vec![vec![1, 2], vec![-1, 3], vec![-2, -3]],
        };

        portfolio.interrupt().raise();
        assert_eq!(portfolio.solve(problem.clone(), &[], None), Solution::Unknown);

        let solution = portfolio.solve(problem.clone(), &[], None);
        assert!(verify(&problem, true, &solution));
    }
}
