//! Incremental sequential counter for cardinality constraints.
//!
//! Register `r[i][j]` is implied whenever at least `j + 1` of the first
//! `i + 1` inputs are true. An upper bound `b` forbids input `i + 1` to be
//! true together with `r[i][b - 1]`. The registers are only built up to
//! the first bound, so lowering the bound later needs no new variables.

use log::trace;

use crate::types::{negate, Lit};

use super::{alloc::VarAllocator, clause_log::ClauseLog};

pub struct SequentialCounter {
    inputs: Vec<Lit>,
    registers: Vec<Vec<Lit>>,
}

impl SequentialCounter {
    /// Builds the registers of `width` columns. Requires `1 <= width < inputs.len()`.
    pub fn build(
        inputs: Vec<Lit>,
        width: usize,
        log: &mut ClauseLog,
        alloc: &mut VarAllocator,
    ) -> Self {
        let n = inputs.len();
        debug_assert!(width >= 1 && width < n);

        // the last input never feeds a register
        let registers: Vec<Vec<Lit>> = (0..n - 1)
            .map(|_| (0..width).map(|_| alloc.alloc_lit()).collect())
            .collect();
        let r = &registers;

        for i in 0..n - 1 {
            log.append(vec![negate(inputs[i]), r[i][0]]);
        }
        for j in 1..width {
            log.append(vec![negate(r[0][j])]);
        }
        for i in 1..n - 1 {
            for j in 0..width {
                log.append(vec![negate(r[i - 1][j]), r[i][j]]);
            }
        }
        for i in 1..n - 1 {
            for j in 1..width {
                log.append(vec![negate(inputs[i]), negate(r[i - 1][j - 1]), r[i][j]]);
            }
        }

        trace!("sequential counter over {n} inputs with {width} columns");

        Self { inputs, registers }
    }

    pub fn width(&self) -> usize {
        self.registers.first().map_or(0, Vec::len)
    }

    /// Appends the clauses forbidding more than `bound` true inputs.
    pub fn enforce(&self, bound: usize, log: &mut ClauseLog) {
        debug_assert!(bound >= 1 && bound <= self.width());
        for i in 1..self.inputs.len() {
            log.append(vec![
                negate(self.inputs[i]),
                negate(self.registers[i - 1][bound - 1]),
            ]);
        }
    }
}
