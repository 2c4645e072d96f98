//! Error types for sat3

use std::io;
use thiserror::Error;

/// A structure (formula or sub-structure) ran out of octants.
///
/// This is the ordinary pruning signal of unification and hyper-structure
/// construction, not a defect. `index` names the structure inside the group
/// that was being processed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("structure #{index} has no satisfying assignment")]
pub struct EmptyStructure {
    pub index: usize,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    EmptyStructure(#[from] EmptyStructure),

    #[error("no route through tier #{tier} of the hyper-structure system")]
    RouteNotFound { tier: usize },

    #[error("a hyper-structure system needs at least two structures, got {0}")]
    TooFewStructures(usize),

    #[error("route assignment does not satisfy the formula")]
    InvalidCertificate,

    #[error("literal {0} does not fit in 32 bits")]
    LiteralOutOfRange(i64),

    #[error("{clauses} distinct clauses requested over {vars} variables, at most {max} exist")]
    TooManyClauses {
        vars: u32,
        clauses: usize,
        max: usize,
    },
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
