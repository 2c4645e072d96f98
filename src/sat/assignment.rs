use std::collections::BTreeMap;
use std::fmt;

use crate::var::Lit;

/// A (possibly partial) truth assignment keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: BTreeMap<u32, bool>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: u32) -> Option<bool> {
        self.values.get(&var).copied()
    }

    pub fn assign(&mut self, var: u32, value: bool) {
        self.values.insert(var, value);
    }

    /// Value of a literal under this assignment, if its variable is set.
    pub fn lit_value(&self, lit: &Lit) -> Option<bool> {
        self.get(lit.get_name()).map(|v| v != lit.is_negated())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.values.iter().map(|(var, value)| (*var, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(u32, bool)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (u32, bool)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (var, value)) in self.iter().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            if value {
                write!(f, "{var}")?;
            } else {
                write!(f, "-{var}")?;
            }
        }
        Ok(())
    }
}
