use std::collections::HashMap;

/// Ordered mapping between variable names and canonical positions.
///
/// Formulas share a permutation through an `Rc`; growing it goes through
/// `Rc::make_mut`, so a formula that grows never changes what its sharers see.
#[derive(Debug, Clone, Default)]
pub struct Permutation {
    names: Vec<u32>,
    positions: HashMap<u32, usize>,
}

impl Permutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names(names: impl IntoIterator<Item = u32>) -> Self {
        let mut permutation = Self::new();
        for name in names {
            permutation.add(name);
        }
        permutation
    }

    /// Appends `name` unless it is already present; returns its position.
    pub fn add(&mut self, name: u32) -> usize {
        if let Some(&pos) = self.positions.get(&name) {
            return pos;
        }
        self.names.push(name);
        self.positions.insert(name, self.names.len() - 1);
        self.names.len() - 1
    }

    /// Inserts a new `name` at `pos`, shifting every later variable.
    pub fn insert(&mut self, pos: usize, name: u32) {
        assert!(
            !self.positions.contains_key(&name),
            "variable {name} already in permutation"
        );
        self.names.insert(pos, name);
        for (idx, name) in self.names.iter().enumerate().skip(pos) {
            self.positions.insert(*name, idx);
        }
    }

    pub fn index_of(&self, name: u32) -> Option<usize> {
        self.positions.get(&name).copied()
    }

    pub fn contains(&self, name: u32) -> bool {
        self.positions.contains_key(&name)
    }

    pub fn get(&self, pos: usize) -> Option<u32> {
        self.names.get(pos).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[u32] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.names.iter().copied()
    }

    /// Whether both permutations hold the same variables, in any order.
    pub fn same_variables(&self, other: &Permutation) -> bool {
        self.len() == other.len() && self.names.iter().all(|name| other.contains(*name))
    }
}

impl PartialEq for Permutation {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for Permutation {}
