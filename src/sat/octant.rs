use std::fmt;

/// One of the eight sign patterns over an ordered variable triple `(a, b, c)`.
///
/// The key packs the pattern as `(a << 2) | (b << 1) | c`. A set bit means the
/// literal is negated when the octant is read as a clause, and that the
/// variable is true when it is read as an assignment. A clause therefore
/// forbids exactly the assignment carrying its own octant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Octant(u8);

impl Octant {
    pub const ALL: [Octant; 8] = [
        Octant(0),
        Octant(1),
        Octant(2),
        Octant(3),
        Octant(4),
        Octant(5),
        Octant(6),
        Octant(7),
    ];

    pub fn from_key(key: u8) -> Self {
        assert!(key < 8, "octant key {key} out of range");
        Octant(key)
    }

    pub fn from_values(a: bool, b: bool, c: bool) -> Self {
        Octant(((a as u8) << 2) | ((b as u8) << 1) | c as u8)
    }

    /// Octant of a clause whose literals are negated as given.
    pub fn from_negations(negated: [bool; 3]) -> Self {
        Self::from_values(negated[0], negated[1], negated[2])
    }

    pub fn key(self) -> u8 {
        self.0
    }

    /// The bit this octant occupies inside a tier mask.
    pub fn bit(self) -> u8 {
        1 << self.0
    }

    /// Assignment reading: the value of the variable at `pos` (0 = a).
    pub fn value_at(self, pos: usize) -> bool {
        assert!(pos < 3, "position {pos} is outside a triple");
        self.0 & (4 >> pos) != 0
    }

    /// Clause reading: whether the literal at `pos` is negated.
    pub fn is_negated_at(self, pos: usize) -> bool {
        self.value_at(pos)
    }

    pub fn values(self) -> [bool; 3] {
        [self.value_at(0), self.value_at(1), self.value_at(2)]
    }

    /// The two octants of the next window that keep this octant's `(b, c)`
    /// as their `(a, b)`, the one with the new variable false first.
    pub fn adjoin_right_targets(self) -> [Octant; 2] {
        let base = (self.0 << 1) & 0b110;
        [Octant(base), Octant(base | 1)]
    }

    /// Same pattern with the values at positions `p` and `q` exchanged.
    pub fn with_swapped(self, p: usize, q: usize) -> Self {
        let (vp, vq) = (self.value_at(p), self.value_at(q));
        let mut values = self.values();
        values[p] = vq;
        values[q] = vp;
        Self::from_values(values[0], values[1], values[2])
    }
}

impl fmt::Display for Octant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b}", self.0)
    }
}
