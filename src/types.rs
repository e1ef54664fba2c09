pub type Lit = i32;

pub type Var = usize;

pub type Clause = Vec<Lit>;

/// Positive literal of `var`.
pub fn to_lit(var: Var) -> Lit {
    assert!(var >= 1, "variables start at 1");
    Lit::try_from(var).expect("variable exceeds the literal range")
}

pub fn negate(lit: Lit) -> Lit {
    debug_assert_ne!(lit, 0);
    -lit
}

pub fn to_var(lit: Lit) -> Var {
    assert_ne!(lit, 0);
    lit.unsigned_abs() as Var
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Problem {
    pub var_count: usize,
    pub clauses: Vec<Clause>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Solution {
    Sat { model: Vec<Lit> },
    Unsat,
    Unknown,
}

impl Solution {
    pub fn is_sat(&self) -> bool {
        matches!(self, Solution::Sat { .. })
    }
}
