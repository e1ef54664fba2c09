//! Pseudo-Boolean and cardinality constraints compiled to CNF.
//!
//! A [`Constraint`] builds its comparator network once, on the first
//! [`Constraint::encode`], and every later `tighten_*` call appends only the
//! clauses needed for the stricter bound. Take [`ClauseLog::mark`] before a
//! call and [`ClauseLog::since`] after it to obtain that delta.

mod alloc;
pub mod basic;
mod clause_log;
mod constraint;
mod counter;
mod encoder;
mod totalizer;

pub use self::{
    alloc::VarAllocator,
    clause_log::ClauseLog,
    constraint::{Constraint, Relation, WeightedLit},
};
