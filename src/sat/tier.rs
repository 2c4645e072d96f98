use std::fmt;

use super::clause::Triple;
use super::octant::Octant;
use crate::var::Value;

const FULL: u8 = 0xFF;
// octants with the variable at position 0, 1, 2 set
const VALUE_MASKS: [u8; 3] = [0xF0, 0xCC, 0xAA];

/// A bit-packed set of octants over one variable triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    triple: Triple,
    mask: u8,
}

impl Tier {
    pub fn new(triple: Triple) -> Self {
        Self { triple, mask: 0 }
    }

    pub fn complete(triple: Triple) -> Self {
        Self { triple, mask: FULL }
    }

    pub fn with_mask(triple: Triple, mask: u8) -> Self {
        Self { triple, mask }
    }

    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn canonical_key(&self) -> [u32; 3] {
        self.triple.canonical_key()
    }

    pub fn size(&self) -> usize {
        self.mask.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn is_complete(&self) -> bool {
        self.mask == FULL
    }

    pub fn octants(&self) -> impl Iterator<Item = Octant> + '_ {
        Octant::ALL
            .into_iter()
            .filter(move |o| self.mask & o.bit() != 0)
    }

    pub fn add(&mut self, octant: Octant) {
        self.mask |= octant.bit();
    }

    pub fn remove(&mut self, octant: Octant) {
        self.mask &= !octant.bit();
    }

    pub fn contains(&self, octant: Octant) -> bool {
        self.mask & octant.bit() != 0
    }

    pub fn clear(&mut self) {
        self.mask = 0;
    }

    pub fn union(&mut self, other: &Tier) {
        self.mask |= self.aligned_mask(other);
    }

    pub fn intersect(&mut self, other: &Tier) {
        self.mask &= self.aligned_mask(other);
    }

    /// Removes the octants of `other` from a complete tier.
    pub fn subtract(&mut self, other: &Tier) {
        assert!(
            self.is_complete(),
            "subtract from tier {} which holds {} octants",
            self.triple,
            self.size()
        );
        self.mask &= !self.aligned_mask(other);
    }

    /// Keeps only the octants where `var` equals `value`.
    pub fn concretize(&mut self, var: u32, value: bool) {
        let pos = self
            .triple
            .position_of(var)
            .unwrap_or_else(|| panic!("variable {var} is not part of tier {}", self.triple));
        self.mask &= if value {
            VALUE_MASKS[pos]
        } else {
            !VALUE_MASKS[pos]
        };
    }

    /// Drops octants whose `(b, c)` does not start any octant of `next`.
    /// Returns whether the mask changed.
    pub fn adjoin_right(&mut self, next: &Tier) -> bool {
        assert!(
            self.triple.0[1..] == next.triple.0[..2],
            "tier {} does not overlap {} on the right",
            self.triple,
            next.triple
        );
        let allowed = with_trailing_pairs(leading_pairs(next.mask));
        self.restrict(allowed)
    }

    /// Drops octants whose `(a, b)` does not end any octant of `prev`.
    /// Returns whether the mask changed.
    pub fn adjoin_left(&mut self, prev: &Tier) -> bool {
        assert!(
            prev.triple.0[1..] == self.triple.0[..2],
            "tier {} does not overlap {} on the left",
            self.triple,
            prev.triple
        );
        let allowed = with_leading_pairs(trailing_pairs(prev.mask));
        self.restrict(allowed)
    }

    fn restrict(&mut self, allowed: u8) -> bool {
        let before = self.mask;
        self.mask &= allowed;
        before != self.mask
    }

    pub fn swap_ab(&mut self) {
        self.swap_positions(0, 1);
    }

    pub fn swap_ac(&mut self) {
        self.swap_positions(0, 2);
    }

    pub fn swap_bc(&mut self) {
        self.swap_positions(1, 2);
    }

    fn swap_positions(&mut self, p: usize, q: usize) {
        if p == q {
            return;
        }
        let mut mask = 0;
        for octant in self.octants() {
            mask |= octant.with_swapped(p, q).bit();
        }
        self.mask = mask;
        self.triple.0.swap(p, q);
    }

    /// Re-expresses the tier with its variables in `order`.
    pub fn transpose_to(&mut self, order: [u32; 3]) {
        for (pos, name) in order.into_iter().enumerate() {
            let current = self.triple.position_of(name).unwrap_or_else(|| {
                panic!("variable {name} is not part of tier {}", self.triple)
            });
            self.swap_positions(pos, current);
        }
    }

    pub fn transposed(&self, order: [u32; 3]) -> Tier {
        let mut tier = *self;
        tier.transpose_to(order);
        tier
    }

    fn aligned_mask(&self, other: &Tier) -> u8 {
        assert!(
            self.triple.same_variables(&other.triple),
            "tiers {} and {} cover different variables",
            self.triple,
            other.triple
        );
        other.transposed(self.triple.0).mask
    }

    pub fn value_of_a(&self) -> Value {
        self.value_at(0)
    }

    pub fn value_of_b(&self) -> Value {
        self.value_at(1)
    }

    pub fn value_of_c(&self) -> Value {
        self.value_at(2)
    }

    pub fn value_of(&self, var: u32) -> Value {
        match self.triple.position_of(var) {
            Some(pos) => self.value_at(pos),
            None => panic!("variable {var} is not part of tier {}", self.triple),
        }
    }

    fn value_at(&self, pos: usize) -> Value {
        if self.mask == 0 {
            return Value::Mixed;
        }
        let set = VALUE_MASKS[pos];
        if self.mask & !set == 0 {
            Value::True
        } else if self.mask & set == 0 {
            Value::False
        } else {
            Value::Mixed
        }
    }

    pub fn inverse(&self) -> Tier {
        Tier {
            triple: self.triple,
            mask: !self.mask,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.triple)?;
        for (idx, octant) in self.octants().enumerate() {
            if idx > 0 {
                write!(f, " ")?;
            }
            write!(f, "{octant}")?;
        }
        write!(f, "]")
    }
}

// (a, b) pairs present in `mask`, as a 4-bit set
fn leading_pairs(mask: u8) -> u8 {
    Octant::ALL
        .into_iter()
        .filter(|o| mask & o.bit() != 0)
        .fold(0, |acc, o| acc | 1 << (o.key() >> 1))
}

// (b, c) pairs present in `mask`, as a 4-bit set
fn trailing_pairs(mask: u8) -> u8 {
    Octant::ALL
        .into_iter()
        .filter(|o| mask & o.bit() != 0)
        .fold(0, |acc, o| acc | 1 << (o.key() & 0b11))
}

fn with_leading_pairs(pairs: u8) -> u8 {
    Octant::ALL
        .into_iter()
        .filter(|o| pairs & (1 << (o.key() >> 1)) != 0)
        .fold(0, |acc, o| acc | o.bit())
}

fn with_trailing_pairs(pairs: u8) -> u8 {
    Octant::ALL
        .into_iter()
        .filter(|o| pairs & (1 << (o.key() & 0b11)) != 0)
        .fold(0, |acc, o| acc | o.bit())
}

#[cfg(test)]
mod tier_test {
    use super::Tier;
    use crate::sat::clause::Triple;
    use crate::sat::octant::Octant;
    use crate::var::Value;

    fn tier(names: [u32; 3], octants: &[[bool; 3]]) -> Tier {
        let mut tier = Tier::new(Triple::new(names[0], names[1], names[2]));
        for [a, b, c] in octants {
            tier.add(Octant::from_values(*a, *b, *c));
        }
        tier
    }

    #[test]
    fn add_remove_are_idempotent() {
        let mut t = tier([1, 2, 3], &[]);
        let o = Octant::from_key(5);
        t.add(o);
        t.add(o);
        assert_eq!(t.size(), 1);
        assert!(t.contains(o));
        t.remove(o);
        t.remove(o);
        assert!(t.is_empty());
    }

    #[test]
    fn complete_minus_tier_is_its_complement() {
        let clauses = tier([1, 2, 3], &[[true, false, true], [false, false, false]]);
        let mut t = Tier::complete(Triple::new(1, 2, 3));
        t.subtract(&clauses);
        assert_eq!(t.size(), 6);
        assert_eq!(t.mask(), !clauses.mask());
        for o in Octant::ALL {
            assert_ne!(t.contains(o), clauses.contains(o));
        }
    }

    #[test]
    fn subtract_aligns_variable_order() {
        let clauses = tier([3, 1, 2], &[[true, false, false]]);
        let mut t = Tier::complete(Triple::new(1, 2, 3));
        t.subtract(&clauses);
        assert!(!t.contains(Octant::from_values(false, false, true)));
        assert_eq!(t.size(), 7);
    }

    #[test]
    #[should_panic]
    fn subtract_needs_complete_tier() {
        let mut t = tier([1, 2, 3], &[[true, true, true]]);
        t.subtract(&tier([1, 2, 3], &[[true, true, true]]));
    }

    #[test]
    #[should_panic]
    fn concretize_outside_triple() {
        let mut t = Tier::complete(Triple::new(1, 2, 3));
        t.concretize(4, true);
    }

    #[test]
    fn concretize_forces_value() {
        let mut t = Tier::complete(Triple::new(1, 2, 3));
        t.concretize(2, false);
        assert_eq!(t.size(), 4);
        assert_eq!(t.value_of(2), Value::False);
        assert_eq!(t.value_of_a(), Value::Mixed);
        t.concretize(3, true);
        assert_eq!(t.value_of_c(), Value::True);
        t.concretize(3, false);
        assert!(t.is_empty());
        assert_eq!(t.value_of_b(), Value::Mixed);
    }

    #[test]
    fn adjoin_right_uses_leading_pairs() {
        // (1 2 3) followed by (2 3 4) where (2, 3) may only be (true, false)
        let mut left = Tier::complete(Triple::new(1, 2, 3));
        let right = tier([2, 3, 4], &[[true, false, true], [true, false, false]]);
        assert!(left.adjoin_right(&right));
        assert_eq!(left.size(), 2);
        assert_eq!(left.value_of_b(), Value::True);
        assert_eq!(left.value_of_c(), Value::False);
        assert!(!left.adjoin_right(&right));
    }

    #[test]
    fn adjoin_left_uses_trailing_pairs() {
        let left = tier([1, 2, 3], &[[true, false, true]]);
        let mut right = Tier::complete(Triple::new(2, 3, 4));
        assert!(right.adjoin_left(&left));
        let expected: Vec<_> = Octant::from_values(true, false, true)
            .adjoin_right_targets()
            .to_vec();
        assert_eq!(right.octants().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn swaps_follow_the_variables() {
        let mut t = tier([1, 2, 3], &[[true, false, false]]);
        t.swap_ac();
        assert_eq!(t.triple().names(), [3, 2, 1]);
        assert_eq!(t.value_of(1), Value::True);
        assert_eq!(t.value_of_a(), Value::False);
        t.swap_ab();
        t.swap_bc();
        assert_eq!(t.value_of(1), Value::True);
        t.transpose_to([1, 2, 3]);
        assert_eq!(t, tier([1, 2, 3], &[[true, false, false]]));
    }

    #[test]
    fn union_and_intersect_transpose_operand() {
        let mut a = tier([1, 2, 3], &[[true, false, false], [false, false, false]]);
        let b = tier([2, 3, 1], &[[false, false, true], [true, true, true]]);
        let mut both = a;
        both.intersect(&b);
        assert_eq!(both.size(), 1);
        assert!(both.contains(Octant::from_values(true, false, false)));
        a.union(&b);
        assert_eq!(a.size(), 3);
        assert_eq!(a.inverse().size(), 5);
    }
}
