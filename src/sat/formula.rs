use std::collections::HashMap;
use std::rc::Rc;

use super::assignment::Assignment;
use super::clause::{Triple, Triplet};
use super::octant::Octant;
use super::permutation::Permutation;
use super::tier::Tier;
use crate::var::Value;

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStatus {
    pub changed: bool,
    /// First tier whose mask changed.
    pub from: usize,
    /// Last tier whose mask changed.
    pub to: usize,
    pub removed: usize,
}

/// An ordered list of tiers over a permutation of variables.
///
/// The same type carries two readings. Loaded from DIMACS, the tiers hold
/// clause octants (forbidden assignments). After [`Formula::complete`] it is a
/// compact triplet structure: one tier per window of three consecutive
/// variables, holding the octants that are still allowed. In both readings
/// the clause count is the number of octants held.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Formula {
    permutation: Rc<Permutation>,
    tiers: Vec<Tier>,
    tiers_index: HashMap<[u32; 3], usize>,
}

impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permutation(permutation: Rc<Permutation>) -> Self {
        Self {
            permutation,
            tiers: Vec::new(),
            tiers_index: HashMap::new(),
        }
    }

    pub fn from_clauses(clauses: &[Triplet]) -> Self {
        let mut formula = Self::new();
        for clause in clauses {
            formula.add(clause);
        }
        formula
    }

    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    pub fn shared_permutation(&self) -> Rc<Permutation> {
        Rc::clone(&self.permutation)
    }

    pub fn var_count(&self) -> usize {
        self.permutation.len()
    }

    pub fn clause_count(&self) -> usize {
        self.tiers.iter().map(Tier::size).sum()
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier(&self, idx: usize) -> &Tier {
        &self.tiers[idx]
    }

    pub fn tier_by_key(&self, key: &[u32; 3]) -> Option<&Tier> {
        self.tiers_index.get(key).map(|idx| &self.tiers[*idx])
    }

    /// Masks may be changed through this, variable order may not.
    pub(crate) fn tiers_mut(&mut self) -> &mut [Tier] {
        &mut self.tiers
    }

    pub fn is_empty(&self) -> bool {
        self.clause_count() == 0
    }

    pub fn clear(&mut self) {
        self.tiers.clear();
        self.tiers_index.clear();
    }

    /// Records a clause, growing the permutation with unseen variables.
    pub fn add(&mut self, clause: &Triplet) {
        let mut lits = clause.lits;
        for lit in lits.iter() {
            self.ensure_variable(lit.get_name());
        }
        lits.sort_by_key(|lit| self.permutation.index_of(lit.get_name()));
        let canonical = Triplet { lits };
        let mut tier = Tier::new(canonical.triple());
        tier.add(canonical.octant());
        self.add_tier(tier);
    }

    /// Unions `tier` into the tier over the same variables, creating it if
    /// needed. New tiers are stored in permutation order.
    pub fn add_tier(&mut self, tier: Tier) {
        let key = tier.canonical_key();
        if let Some(idx) = self.tiers_index.get(&key) {
            self.tiers[*idx].union(&tier);
            return;
        }
        for name in tier.triple().names() {
            self.ensure_variable(name);
        }
        let mut order = tier.triple().names();
        order.sort_by_key(|name| self.permutation.index_of(*name));
        self.tiers.push(tier.transposed(order));
        self.tiers_index.insert(key, self.tiers.len() - 1);
    }

    fn ensure_variable(&mut self, name: u32) {
        if !self.permutation.contains(name) {
            Rc::make_mut(&mut self.permutation).add(name);
        }
    }

    pub fn append_variable(&mut self, name: u32) {
        Rc::make_mut(&mut self.permutation).add(name);
    }

    pub fn prepend_variable(&mut self, name: u32) {
        Rc::make_mut(&mut self.permutation).insert(0, name);
    }

    /// Orders tiers by the position of their first variable.
    pub fn sort_tiers(&mut self) {
        let permutation = Rc::clone(&self.permutation);
        self.tiers
            .sort_by_key(|tier| permutation.index_of(tier.triple().a()));
        self.reindex();
    }

    pub fn tiers_sorted(&self) -> bool {
        self.tiers
            .windows(2)
            .all(|w| self.position(w[0].triple().a()) < self.position(w[1].triple().a()))
    }

    fn reindex(&mut self) {
        self.tiers_index = self
            .tiers
            .iter()
            .enumerate()
            .map(|(idx, tier)| (tier.canonical_key(), idx))
            .collect();
    }

    fn position(&self, name: u32) -> usize {
        self.permutation
            .index_of(name)
            .unwrap_or_else(|| panic!("variable {name} is not in the permutation"))
    }

    /// Whether `tier` spans three consecutive positions, in order.
    pub fn is_window(&self, tier: &Tier) -> bool {
        let [a, b, c] = tier.triple().names();
        match (
            self.permutation.index_of(a),
            self.permutation.index_of(b),
            self.permutation.index_of(c),
        ) {
            (Some(pa), Some(pb), Some(pc)) => pb == pa + 1 && pc == pb + 1,
            _ => false,
        }
    }

    fn window(&self, pos: usize) -> Triple {
        let name = |p| {
            self.permutation
                .get(p)
                .expect("window lies inside the permutation")
        };
        Triple::new(name(pos), name(pos + 1), name(pos + 2))
    }

    fn assert_same_permutation(&self, other: &Formula) {
        assert!(
            Rc::ptr_eq(&self.permutation, &other.permutation)
                || self.permutation == other.permutation,
            "algebra on formulas over different permutations: {:?} vs {:?}",
            self.permutation.names(),
            other.permutation.names()
        );
    }

    /// Tier-wise OR. An empty operand yields the other one.
    pub fn union(&self, other: &Formula) -> Formula {
        self.assert_same_permutation(other);
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut result = self.clone();
        for tier in other.tiers.iter() {
            result.add_tier(*tier);
        }
        result
    }

    /// Tier-wise AND followed by cleanup. An empty operand yields an empty
    /// formula.
    pub fn intersect(&self, other: &Formula) -> Formula {
        self.assert_same_permutation(other);
        let mut result = self.clone();
        if self.is_empty() || other.is_empty() {
            result.clear();
            return result;
        }
        for tier in result.tiers.iter_mut() {
            if let Some(theirs) = other.tier_by_key(&tier.canonical_key()) {
                tier.intersect(theirs);
            }
        }
        result.cleanup();
        result
    }

    /// Keeps only the octants consistent with `var == value`.
    pub fn concretize(&self, var: u32, value: bool) -> Formula {
        let mut result = self.clone();
        result.concretize_in_place(var, value);
        result
    }

    /// Keeps only the octants consistent with `triple` taking `octant`.
    pub fn concretize_octant(&self, triple: &Triple, octant: Octant) -> Formula {
        let mut result = self.clone();
        for (pos, name) in triple.names().into_iter().enumerate() {
            if result.is_empty() {
                break;
            }
            result.concretize_in_place(name, octant.value_at(pos));
        }
        result
    }

    /// Returns whether any octant was dropped.
    pub(crate) fn concretize_in_place(&mut self, var: u32, value: bool) -> bool {
        if self.is_empty() {
            return false;
        }
        assert!(
            self.permutation.contains(var),
            "variable {var} is not part of the formula"
        );
        let before = self.clause_count();
        for tier in self.tiers.iter_mut() {
            if tier.triple().contains(var) {
                tier.concretize(var, value);
            }
        }
        self.cleanup();
        before != self.clause_count()
    }

    /// Removes one octant from tier `idx` without propagating.
    pub fn remove_octant(&mut self, idx: usize, octant: Octant) {
        self.tiers[idx].remove(octant);
    }

    /// Propagates removals between neighbouring tiers until nothing changes.
    /// A tier left without octants clears the whole structure.
    pub fn cleanup(&mut self) -> CleanupStatus {
        let last = self.tiers.len().saturating_sub(1);
        self.propagate(0, last)
    }

    /// Like [`Formula::cleanup`], starting from the neighbourhood of `idx`.
    pub fn cleanup_around(&mut self, idx: usize) -> CleanupStatus {
        let last = self.tiers.len().saturating_sub(1);
        self.propagate(idx.saturating_sub(1), (idx + 1).min(last))
    }

    fn propagate(&mut self, seed_lo: usize, seed_hi: usize) -> CleanupStatus {
        let mut status = CleanupStatus::default();
        if self.tiers.is_empty() {
            return status;
        }
        assert_eq!(
            self.tiers.len() + 2,
            self.var_count(),
            "structure over {} variables has {} tiers",
            self.var_count(),
            self.tiers.len()
        );
        let before = self.clause_count();
        if let Some(idx) = self.tiers.iter().position(Tier::is_empty) {
            log::debug!("tier {idx} has no octants left, clearing structure");
            self.clear();
            return CleanupStatus {
                changed: true,
                from: idx,
                to: idx,
                removed: before,
            };
        }

        let n = self.tiers.len();
        let (mut lo, mut hi) = (seed_lo, seed_hi);
        let mut from = usize::MAX;
        let mut to = 0;
        let mut rounds = 0;
        loop {
            let mut changed = false;
            let (mut next_lo, mut next_hi) = (lo, hi);
            for idx in lo..=hi {
                let mut tier_changed = false;
                if idx > 0 {
                    let prev = self.tiers[idx - 1];
                    tier_changed |= self.tiers[idx].adjoin_left(&prev);
                }
                if idx + 1 < n {
                    let next = self.tiers[idx + 1];
                    tier_changed |= self.tiers[idx].adjoin_right(&next);
                }
                if !tier_changed {
                    continue;
                }
                changed = true;
                from = from.min(idx);
                to = to.max(idx);
                if self.tiers[idx].is_empty() {
                    log::debug!("tier {idx} has no octants left, clearing structure");
                    self.clear();
                    return CleanupStatus {
                        changed: true,
                        from,
                        to,
                        removed: before,
                    };
                }
                next_lo = next_lo.min(idx.saturating_sub(1));
                next_hi = next_hi.max((idx + 1).min(n - 1));
            }
            if !changed {
                break;
            }
            rounds += 1;
            assert!(
                rounds <= before + 1,
                "cleanup did not settle after {rounds} rounds"
            );
            lo = next_lo;
            hi = next_hi;
        }

        status.removed = before - self.clause_count();
        if status.removed > 0 {
            status.changed = true;
            status.from = from;
            status.to = to;
        }
        status
    }

    /// Subtracts the tiers of `other` from the matching complete tiers, then
    /// cleans up.
    pub fn subtract(&mut self, other: &Formula) -> CleanupStatus {
        for tier in self.tiers.iter_mut() {
            if let Some(theirs) = other.tier_by_key(&tier.canonical_key()) {
                tier.subtract(theirs);
            }
        }
        self.cleanup()
    }

    /// Turns a clause formula whose tiers are windows of its permutation into
    /// a compact triplet structure over `variables`: missing variables are
    /// appended and every window holds the octants its clauses allow.
    pub fn complete(&mut self, variables: &Permutation) -> CleanupStatus {
        for tier in self.tiers.iter() {
            assert!(
                self.is_window(tier),
                "tier {} is not a window of {:?}",
                tier.triple(),
                self.permutation.names()
            );
        }
        for name in variables.iter() {
            self.ensure_variable(name);
        }
        let clauses = std::mem::take(&mut self.tiers);
        let index = std::mem::take(&mut self.tiers_index);
        let windows = self.var_count().saturating_sub(2);
        for pos in 0..windows {
            let mut tier = Tier::complete(self.window(pos));
            if let Some(idx) = index.get(&tier.canonical_key()) {
                tier.subtract(&clauses[*idx]);
            }
            self.tiers.push(tier);
        }
        self.reindex();
        self.cleanup()
    }

    pub fn value_of(&self, var: u32) -> Value {
        self.tiers
            .iter()
            .filter(|tier| tier.triple().contains(var))
            .map(|tier| tier.value_of(var))
            .find(|value| *value != Value::Mixed)
            .unwrap_or(Value::Mixed)
    }

    /// Clause reading: every stored clause has a true literal. Variables
    /// missing from the assignment make their clauses false.
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        self.tiers.iter().all(|tier| {
            tier.octants().all(|octant| {
                Triplet::from_octant(tier.triple(), octant)
                    .lits
                    .iter()
                    .any(|lit| assignment.lit_value(lit) == Some(true))
            })
        })
    }

    /// Structure reading: the assignment's octant is allowed in every tier.
    pub fn admits(&self, assignment: &Assignment) -> bool {
        !self.is_empty()
            && self.tiers.iter().all(|tier| {
                let [a, b, c] = tier.triple().names().map(|name| assignment.get(name));
                match (a, b, c) {
                    (Some(a), Some(b), Some(c)) => tier.contains(Octant::from_values(a, b, c)),
                    _ => false,
                }
            })
    }

    /// Walks a cleaned structure from its first tier, extending each step
    /// with the first allowed successor octant.
    pub fn any_assignment(&self) -> Option<Assignment> {
        let first = self.tiers.first()?;
        let mut octant = first.octants().next()?;
        let mut assignment = Assignment::new();
        for (pos, name) in first.triple().names().into_iter().enumerate() {
            assignment.assign(name, octant.value_at(pos));
        }
        for tier in self.tiers.iter().skip(1) {
            octant = octant
                .adjoin_right_targets()
                .into_iter()
                .find(|target| tier.contains(*target))?;
            assignment.assign(tier.triple().c(), octant.value_at(2));
        }
        Some(assignment)
    }
}


#[cfg(test)]
mod formula_laws {
    use proptest::prelude::*;

    use super::Formula;
    use crate::sat::clause::Triple;
    use crate::sat::permutation::Permutation;
    use crate::sat::tier::Tier;

    const VARS: [u32; 5] = [1, 2, 3, 4, 5];

    fn structure(masks: &[u8], shared: &Formula) -> Formula {
        let mut f = Formula::with_permutation(shared.shared_permutation());
        for (pos, mask) in masks.iter().enumerate() {
            let triple = Triple::new(VARS[pos], VARS[pos + 1], VARS[pos + 2]);
            f.add_tier(Tier::with_mask(triple, *mask));
        }
        f.cleanup();
        f
    }

    fn base() -> Formula {
        Formula::with_permutation(std::rc::Rc::new(Permutation::from_names(VARS)))
    }

    fn masks() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(1u8..=255, 3)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn union_commutes(a in masks(), b in masks()) {
            let shared = base();
            let (a, b) = (structure(&a, &shared), structure(&b, &shared));
            prop_assert_eq!(a.union(&b), b.union(&a));
        }

        #[test]
        fn intersect_commutes(a in masks(), b in masks()) {
            let shared = base();
            let (a, b) = (structure(&a, &shared), structure(&b, &shared));
            prop_assert_eq!(a.intersect(&b), b.intersect(&a));
        }

        #[test]
        fn union_associates(a in masks(), b in masks(), c in masks()) {
            let shared = base();
            let [a, b, c] = [a, b, c].map(|m| structure(&m, &shared));
            prop_assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        }

        #[test]
        fn intersect_associates(a in masks(), b in masks(), c in masks()) {
            let shared = base();
            let [a, b, c] = [a, b, c].map(|m| structure(&m, &shared));
            prop_assert_eq!(a.intersect(&b).intersect(&c), a.intersect(&b.intersect(&c)));
        }

        #[test]
        fn cleanup_is_idempotent(a in masks()) {
            let mut f = structure(&a, &base());
            let snapshot = f.clone();
            let status = f.cleanup();
            prop_assert!(!status.changed);
            prop_assert_eq!(f, snapshot);
        }
    }
}
