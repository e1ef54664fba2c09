use std::fmt;

use thiserror::Error;

use crate::types::Var;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundSide {
    Upper,
    Lower,
}

impl fmt::Display for BoundSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundSide::Upper => f.write_str("upper"),
            BoundSide::Lower => f.write_str("lower"),
        }
    }
}

/// Errors raised while building or tightening a constraint.
///
/// Bounds outside the reachable weighted sum are not errors; they are
/// turned into an empty delta or the empty clause.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("{side} bound {new} does not tighten the current bound {current}")]
    NonMonotonicBound {
        side: BoundSide,
        current: i64,
        new: i64,
    },

    #[error("constraint has no {0} bound")]
    MissingBound(BoundSide),

    #[error("constraint is already encoded")]
    AlreadyEncoded,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: missing 'p cnf' header")]
    MissingHeader { line: usize },

    #[error("line {line}: invalid header '{header}'")]
    InvalidHeader { line: usize, header: String },

    #[error("line {line}: invalid literal '{token}'")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: variable {var} exceeds the declared maximum {max_var}")]
    VarOutOfRange { line: usize, var: Var, max_var: usize },

    #[error("line {line}: more clauses than the {declared} declared")]
    TooManyClauses { line: usize, declared: usize },

    #[error("expected {declared} clauses, found {found}")]
    MissingClauses { declared: usize, found: usize },

    #[error("line {line}: last clause is not terminated by 0")]
    UnterminatedClause { line: usize },

    #[error("line {line}: 'o' section without a literal")]
    EmptySection { line: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("option '{name}' has invalid value {value}")]
    InvalidValue { name: String, value: i64 },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    #[error("handle {0} was never issued")]
    Unknown(u32),

    #[error("handle {0} refers to a released instance")]
    Stale(u32),
}
