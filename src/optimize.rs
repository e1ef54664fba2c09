use log::{debug, info};

use crate::{
    encoding::{ClauseLog, Constraint, VarAllocator},
    engine::SatEngine,
    error::{BoundSide, EncodeError},
    types::{Lit, Solution},
};

/// Best model found by [`minimize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Optimum {
    pub model: Vec<Lit>,
    pub value: i64,
    /// No model with a smaller value exists.
    pub optimal: bool,
}

fn drain(engine: &mut impl SatEngine, log: &ClauseLog, mark: usize, alloc: &VarAllocator) {
    engine.reserve_vars(alloc.max_var());
    engine.add_clauses(log.since(mark));
}

/// Minimizes the weighted sum of `objective` over the clauses already in
/// `engine`.
///
/// The objective needs an upper bound; it is encoded once and every
/// improvement only feeds the engine the clauses of the tightened bound.
/// Returns `None` if no model was found at all.
pub fn minimize(
    engine: &mut impl SatEngine,
    objective: &mut Constraint,
    log: &mut ClauseLog,
    alloc: &mut VarAllocator,
) -> Result<Option<Optimum>, EncodeError> {
    if objective.relation().upper().is_none() {
        return Err(EncodeError::MissingBound(BoundSide::Upper));
    }

    let mark = log.mark();
    if !objective.is_encoded() {
        objective.encode(log, alloc)?;
    }
    drain(engine, log, mark, alloc);

    let (lowest, _) = objective.range();
    let mut best: Option<Optimum> = None;

    loop {
        match engine.solve() {
            Solution::Sat { model } => {
                let value = objective.value(|lit| engine.value(lit) == Some(true));
                info!("found model with value {value}");
                let optimal = value <= lowest;
                best = Some(Optimum {
                    model,
                    value,
                    optimal,
                });
                if optimal {
                    break;
                }

                let mark = log.mark();
                objective.tighten_leq(value - 1, log, alloc)?;
                debug!("bound {} adds {} clauses", value - 1, log.len() - mark);
                drain(engine, log, mark, alloc);
            }
            Solution::Unsat => {
                if let Some(best) = best.as_mut() {
                    best.optimal = true;
                }
                break;
            }
            Solution::Unknown => break,
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use crate::{
        encoding::{ClauseLog, Constraint, Relation, VarAllocator, WeightedLit},
        engine::SatEngine,
        error::{BoundSide, EncodeError},
        solver::Solver,
    };

    use super::minimize;

    #[test]
    fn weighted_minimum() {
        // at least one of 1, 2 and at least one of 2, 3
        let mut solver = Solver::default();
        solver.add_clause(&[1, 2]);
        solver.add_clause(&[2, 3]);

        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::after(3);
        let mut objective = Constraint::new(
            vec![
                WeightedLit::new(2, 1),
                WeightedLit::new(3, 2),
                WeightedLit::new(2, 3),
            ],
            Relation::AtMost(7),
        )
        .unwrap();

        let optimum = minimize(&mut solver, &mut objective, &mut log, &mut alloc)
            .unwrap()
            .unwrap();
        assert_eq!(optimum.value, 3);
        assert!(optimum.optimal);
        assert!(optimum.model.contains(&2));
    }

    #[test]
    fn infeasible_and_unbounded() {
        let mut solver = Solver::default();
        solver.add_clause(&[1]);
        let mut log = ClauseLog::new();
        let mut alloc = VarAllocator::after(2);

        let mut objective = Constraint::at_most([1, 2], 0).unwrap();
        assert_eq!(
            minimize(&mut solver, &mut objective, &mut log, &mut alloc),
            Ok(None)
        );

        let mut objective = Constraint::at_least([1, 2], 1).unwrap();
        assert_eq!(
            minimize(&mut solver, &mut objective, &mut log, &mut alloc),
            Err(EncodeError::MissingBound(BoundSide::Upper))
        );
        assert_eq!(SatEngine::var_count(&solver), 2);
    }
}
