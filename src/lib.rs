//! Incremental CNF encodings of cardinality and pseudo-Boolean constraints,
//! together with the CDCL solver and DIMACS front end that consume them.

pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod io;
pub mod optimize;
pub mod parallel;
pub mod registry;
pub mod solver;
pub mod types;
