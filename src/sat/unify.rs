use std::borrow::{Borrow, BorrowMut};
use std::collections::BTreeMap;

use itertools::Itertools;

use super::formula::Formula;
use crate::error::EmptyStructure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TierRef {
    structure: usize,
    tier: usize,
}

/// Reconciles structures over one variable set until no clause count moves.
///
/// Tiers of different structures that share a variable pair restrict each
/// other through that pair, every structure is cleaned up, and values forced
/// in one structure are concretized into the rest. The call is all or
/// nothing: on `EmptyStructure` the inputs are left as they were. Returns the
/// number of octants removed.
pub fn unify<F: BorrowMut<Formula>>(structures: &mut [F]) -> Result<usize, EmptyStructure> {
    assert!(
        structures.len() >= 2,
        "unification needs at least two structures, got {}",
        structures.len()
    );
    let mut work: Vec<Formula> = structures
        .iter()
        .map(|s| Borrow::<Formula>::borrow(s).clone())
        .collect();
    if let Some(index) = work.iter().position(Formula::is_empty) {
        return Err(EmptyStructure { index });
    }

    let initial: usize = work.iter().map(Formula::clause_count).sum();
    let mut rounds = 0;
    loop {
        let before: Vec<usize> = work.iter().map(Formula::clause_count).collect();

        for ((v1, v2), refs) in pair_index(&work) {
            let structures_involved = refs.iter().map(|r| r.structure).unique().count();
            if refs.len() < 2 || structures_involved < 2 {
                continue;
            }
            for (left, right) in refs.iter().tuple_combinations() {
                if left.structure == right.structure {
                    continue;
                }
                adjoin_through_pair(&mut work, *left, *right, v1, v2);
            }
        }

        for (index, structure) in work.iter_mut().enumerate() {
            structure.cleanup();
            if structure.is_empty() {
                log::debug!("unification emptied structure #{index}");
                return Err(EmptyStructure { index });
            }
        }

        propagate_forced_values(&mut work)?;

        let after: Vec<usize> = work.iter().map(Formula::clause_count).collect();
        log::debug!("unification round {rounds}: {before:?} -> {after:?}");
        if after == before {
            break;
        }
        rounds += 1;
        assert!(
            rounds <= initial + 1,
            "unification did not settle after {rounds} rounds"
        );
    }

    let remaining: usize = work.iter().map(Formula::clause_count).sum();
    for (structure, result) in structures.iter_mut().zip(work) {
        *BorrowMut::<Formula>::borrow_mut(structure) = result;
    }
    Ok(initial - remaining)
}

/// Unordered variable pair -> every tier mentioning both variables.
fn pair_index(structures: &[Formula]) -> BTreeMap<(u32, u32), Vec<TierRef>> {
    let mut index: BTreeMap<(u32, u32), Vec<TierRef>> = BTreeMap::new();
    for (s, structure) in structures.iter().enumerate() {
        for (t, tier) in structure.tiers().iter().enumerate() {
            for (v1, v2) in tier.canonical_key().into_iter().tuple_combinations() {
                index
                    .entry((v1, v2))
                    .or_default()
                    .push(TierRef { structure: s, tier: t });
            }
        }
    }
    index
}

// Lines both tiers up so the pair sits at (b, c) of the left tier and (a, b)
// of the right one, restricts them against each other, then restores order.
fn adjoin_through_pair(work: &mut [Formula], left: TierRef, right: TierRef, v1: u32, v2: u32) {
    let ti = *work[left.structure].tier(left.tier);
    let tj = *work[right.structure].tier(right.tier);
    let a = ti.triple().third(v1, v2);
    let c = tj.triple().third(v1, v2);

    let mut lhs = ti.transposed([a, v1, v2]);
    let mut rhs = tj.transposed([v1, v2, c]);
    let changed = lhs.adjoin_right(&rhs) | rhs.adjoin_left(&lhs);
    if !changed {
        return;
    }
    log::debug!("pair ({v1}, {v2}) restricted {ti} and {tj}");
    work[left.structure].tiers_mut()[left.tier] = lhs.transposed(ti.triple().names());
    work[right.structure].tiers_mut()[right.tier] = rhs.transposed(tj.triple().names());
}

fn propagate_forced_values(work: &mut [Formula]) -> Result<(), EmptyStructure> {
    let mut forced: BTreeMap<u32, (usize, bool)> = BTreeMap::new();
    for (s, structure) in work.iter().enumerate() {
        for name in structure.permutation().iter() {
            if let Some(value) = structure.value_of(name).forced() {
                forced.entry(name).or_insert((s, value));
            }
        }
    }
    for (name, (source, value)) in forced {
        for (index, structure) in work.iter_mut().enumerate() {
            if index == source || !structure.permutation().contains(name) {
                continue;
            }
            if structure.value_of(name).forced() == Some(value) {
                continue;
            }
            structure.concretize_in_place(name, value);
            if structure.is_empty() {
                log::debug!("forcing {name} = {value} emptied structure #{index}");
                return Err(EmptyStructure { index });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod unify_test {
    use super::unify;
    use crate::error::EmptyStructure;
    use crate::sat::clause::Triplet;
    use crate::sat::formula::Formula;
    use crate::sat::permutation::Permutation;
    use crate::var::Value;

    fn cts(list: &[[i32; 3]], variables: &[u32]) -> Formula {
        let triplets: Vec<_> = list.iter().map(|c| Triplet::from_dimacs(*c)).collect();
        let mut formula = Formula::from_clauses(&triplets);
        formula.complete(&Permutation::from_names(variables.iter().copied()));
        formula
    }

    #[test]
    fn forced_values_cross_structures() {
        // first structure forces x1, the second learns it
        let a = cts(
            &[[1, 2, 3], [1, 2, -3], [1, -2, 3], [1, -2, -3]],
            &[1, 2, 3, 4],
        );
        let b = cts(&[[-1, 4, 3]], &[4, 3, 1, 2]);
        let mut group = vec![a, b];
        let removed = unify(&mut group).unwrap();
        assert!(removed > 0);
        assert_eq!(group[0].value_of(1), Value::True);
        assert_eq!(group[1].value_of(1), Value::True);
    }

    #[test]
    fn shared_pairs_restrict_each_other() {
        // b forbids (x2, x3) = (false, false) in every completion
        let a = cts(&[[2, 3, 1]], &[2, 3, 1, 4]);
        let b = cts(&[[2, 3, 4], [2, 3, -4]], &[4, 2, 3, 1]);
        let mut group = vec![a, b];
        unify(&mut group).unwrap();
        let tier = group[0].tier_by_key(&[1, 2, 3]).unwrap();
        assert!(tier.octants().all(|o| {
            let pos2 = tier.triple().position_of(2).unwrap();
            let pos3 = tier.triple().position_of(3).unwrap();
            o.value_at(pos2) || o.value_at(pos3)
        }));
    }

    #[test]
    fn contradiction_leaves_inputs_untouched() {
        let a = cts(
            &[[1, 2, 3], [1, 2, -3], [1, -2, 3], [1, -2, -3]],
            &[1, 2, 3, 4],
        );
        let b = cts(
            &[[-1, 2, 4], [-1, 2, -4], [-1, -2, 4], [-1, -2, -4]],
            &[1, 2, 4, 3],
        );
        let snapshot = vec![a.clone(), b.clone()];
        let mut group = vec![a, b];
        let err = unify(&mut group).unwrap_err();
        assert_eq!(err, EmptyStructure { index: 0 });
        assert_eq!(group, snapshot);
    }

    #[test]
    fn works_on_borrowed_structures() {
        let mut a = cts(&[[1, 2, 3]], &[1, 2, 3, 4]);
        let mut b = cts(&[[2, 3, 4]], &[2, 3, 4, 1]);
        let mut group = vec![&mut a, &mut b];
        assert!(unify(&mut group).is_ok());
        assert!(!a.is_empty() && !b.is_empty());
    }

    #[test]
    #[should_panic]
    fn needs_two_structures() {
        let mut group = vec![cts(&[[1, 2, 3]], &[1, 2, 3])];
        let _ = unify(&mut group);
    }
}
