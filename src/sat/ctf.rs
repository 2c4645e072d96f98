//! Splitting a clause formula into compact triplet formulas.
//!
//! A compact triplet formula (CTF) is a clause formula whose tiers are exactly
//! the windows of its own permutation. Every 3-SAT formula splits into a list
//! of them, and each one completes into a compact triplet structure over the
//! full variable set.

use std::rc::Rc;

use super::formula::Formula;
use super::permutation::Permutation;
use super::tier::Tier;
use crate::error::EmptyStructure;

/// Splits `formula` into compact triplet formulas, walking its tiers in
/// order and joining each to the first formula that can take it.
pub fn create_ctf(formula: &Formula) -> Vec<Formula> {
    let mut ctf: Vec<Formula> = Vec::new();
    for tier in formula.tiers() {
        if !ctf.iter_mut().any(|compact| try_join(compact, tier)) {
            let permutation = Permutation::from_names(tier.triple().names());
            let mut compact = Formula::with_permutation(Rc::new(permutation));
            compact.add_tier(*tier);
            ctf.push(compact);
        }
    }
    log::debug!(
        "split {} tiers into {} compact formulas",
        formula.tier_count(),
        ctf.len()
    );
    ctf
}

fn try_join(compact: &mut Formula, tier: &Tier) -> bool {
    let names = tier.triple().names();
    let known = names
        .iter()
        .filter(|name| compact.permutation().contains(**name))
        .count();

    if known == 3 {
        if compact.tier_by_key(&tier.canonical_key()).is_some() {
            compact.add_tier(*tier);
            return true;
        }
        return false;
    }
    if known != 2 {
        return false;
    }

    let permutation = compact.permutation();
    let len = permutation.len();
    let last_two = [permutation.get(len - 2), permutation.get(len - 1)];
    let first_two = [permutation.get(0), permutation.get(1)];
    let covers = |pair: [Option<u32>; 2]| {
        pair.iter()
            .all(|name| name.is_some_and(|name| tier.triple().contains(name)))
    };
    let fresh = names
        .into_iter()
        .find(|name| !permutation.contains(*name))
        .expect("two of three variables are known");

    if covers(last_two) {
        compact.append_variable(fresh);
        compact.add_tier(*tier);
        true
    } else if covers(first_two) {
        compact.prepend_variable(fresh);
        compact.add_tier(*tier);
        compact.sort_tiers();
        true
    } else {
        false
    }
}

/// Completes every compact formula into a structure over `variables`.
pub fn complete_to_cts(ctf: &mut [Formula], variables: &Permutation) -> Result<(), EmptyStructure> {
    for (index, compact) in ctf.iter_mut().enumerate() {
        compact.complete(variables);
        if compact.is_empty() {
            log::debug!("compact formula #{index} has no satisfying assignment");
            return Err(EmptyStructure { index });
        }
    }
    Ok(())
}
