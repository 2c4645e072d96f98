use std::fmt;

use super::octant::Octant;
use crate::var::{Lit, Var};

/// Three distinct variables in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triple(pub(crate) [u32; 3]);

impl Triple {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        assert!(
            a != b && a != c && b != c,
            "a triple needs three distinct variables, got ({a}, {b}, {c})"
        );
        Triple([a, b, c])
    }

    pub fn names(&self) -> [u32; 3] {
        self.0
    }

    pub fn a(&self) -> u32 {
        self.0[0]
    }

    pub fn b(&self) -> u32 {
        self.0[1]
    }

    pub fn c(&self) -> u32 {
        self.0[2]
    }

    /// Order-independent identity of the variable set.
    pub fn canonical_key(&self) -> [u32; 3] {
        let mut key = self.0;
        key.sort_unstable();
        key
    }

    pub fn position_of(&self, name: u32) -> Option<usize> {
        self.0.iter().position(|n| *n == name)
    }

    pub fn contains(&self, name: u32) -> bool {
        self.0.contains(&name)
    }

    /// The variable of this triple that is neither `v1` nor `v2`.
    pub fn third(&self, v1: u32, v2: u32) -> u32 {
        *self
            .0
            .iter()
            .find(|n| **n != v1 && **n != v2)
            .expect("triple has three distinct variables")
    }

    pub fn same_variables(&self, other: &Triple) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.0[0], self.0[1], self.0[2])
    }
}

/// A 3-literal clause over three distinct variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triplet {
    pub lits: [Lit; 3],
}

impl Triplet {
    pub fn new(lits: [Lit; 3]) -> Self {
        Triple::new(lits[0].get_name(), lits[1].get_name(), lits[2].get_name());
        Self { lits }
    }

    /// Builds a clause from three non-zero DIMACS literals.
    pub fn from_dimacs(values: [i32; 3]) -> Self {
        let lits = values.map(|v| Lit::from_dimacs(v).expect("a clause literal cannot be 0"));
        Self::new(lits)
    }

    pub fn from_octant(triple: &Triple, octant: Octant) -> Self {
        let lits = [0, 1, 2].map(|pos| {
            let var = Var::new(triple.0[pos]);
            if octant.is_negated_at(pos) {
                Lit::neg(var)
            } else {
                Lit::pos(var)
            }
        });
        Self { lits }
    }

    pub fn triple(&self) -> Triple {
        Triple(self.lits.map(|l| l.get_name()))
    }

    pub fn octant(&self) -> Octant {
        Octant::from_negations(self.lits.map(|l| l.is_negated()))
    }

    pub fn to_dimacs(&self) -> [i64; 3] {
        self.lits.map(|l| l.to_dimacs())
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lits[0], self.lits[1], self.lits[2])
    }
}
