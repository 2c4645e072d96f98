use std::fmt;

/// A propositional variable, identified by a positive integer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var {
    name: u32,
}

impl Var {
    pub fn new(name: u32) -> Self {
        assert!(name > 0, "variable names must be positive");
        Self { name }
    }

    pub fn get_name(&self) -> u32 {
        self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    negated: bool,
    var: Var,
}

impl Lit {
    pub fn pos(var: Var) -> Self {
        Self {
            var,
            negated: false,
        }
    }

    pub fn neg(var: Var) -> Self {
        Self { var, negated: true }
    }

    /// Builds a literal from its DIMACS form; `0` is not a literal.
    pub fn from_dimacs(value: i32) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let var = Var::new(value.unsigned_abs());
        if value < 0 {
            Some(Self::neg(var))
        } else {
            Some(Self::pos(var))
        }
    }

    pub fn to_dimacs(&self) -> i64 {
        let name = i64::from(self.var.get_name());
        if self.negated {
            -name
        } else {
            name
        }
    }

    pub fn negate(self) -> Self {
        Self {
            var: self.var,
            negated: !self.negated,
        }
    }

    pub fn get_name(&self) -> u32 {
        self.var.get_name()
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// What every remaining octant of a tier says about one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    True,
    False,
    Mixed,
}

impl Value {
    pub fn forced(self) -> Option<bool> {
        match self {
            Value::True => Some(true),
            Value::False => Some(false),
            Value::Mixed => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        if value {
            Value::True
        } else {
            Value::False
        }
    }
}

#[cfg(test)]
mod var_test {
    use super::{Lit, Value, Var};

    #[test]
    fn dimacs_literals() {
        let lit = Lit::from_dimacs(-7).unwrap();
        assert!(lit.is_negated());
        assert_eq!(lit.get_name(), 7);
        assert_eq!(lit.to_dimacs(), -7);
        assert_eq!(lit.negate(), Lit::pos(Var::new(7)));
        assert!(Lit::from_dimacs(0).is_none());
    }

    #[test]
    fn forced_values() {
        assert_eq!(Value::True.forced(), Some(true));
        assert_eq!(Value::from(false), Value::False);
        assert_eq!(Value::Mixed.forced(), None);
    }
}
