//! Compact triplet structures for 3-SAT.
//!
//! A 3-SAT formula is split into compact triplet structures, one ordered list
//! of variable windows each. The structures are unified against one another
//! and a hyper-structure system is built over the one with the fewest
//! clauses. A route through that system is a satisfying assignment.

pub mod config;
pub mod error;
pub mod sat;
pub mod var;

pub use config::{PrettyOptions, SolverConfig};
pub use error::{Error, Result};
pub use sat::{Outcome, Solver};
