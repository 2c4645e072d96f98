//! Seeded random 3-SAT instances.

use rand::seq::index::sample;
use rand::Rng;

use super::clause::Triplet;
use super::formula::Formula;
use crate::error::{Error, Result};
use crate::var::{Lit, Var};

/// Number of distinct clauses over `var_count` variables: eight sign
/// patterns for every set of three variables.
pub fn max_clause_count(var_count: u32) -> usize {
    let n = var_count as usize;
    if n < 3 {
        return 0;
    }
    8 * n * (n - 1) * (n - 2) / 6
}

/// A clause over three distinct variables drawn from `1..=var_count`, each
/// negated with probability one half.
pub fn random_triplet<R: Rng + ?Sized>(rng: &mut R, var_count: u32) -> Triplet {
    assert!(var_count >= 3, "a clause needs three variables, got {var_count}");
    let picked = sample(rng, var_count as usize, 3);
    let mut lits = [Lit::pos(Var::new(1)); 3];
    for (slot, index) in lits.iter_mut().zip(picked.iter()) {
        let var = Var::new(index as u32 + 1);
        *slot = if rng.gen_bool(0.5) {
            Lit::neg(var)
        } else {
            Lit::pos(var)
        };
    }
    Triplet::new(lits)
}

/// A formula of `clause_count` distinct random clauses over variables
/// `1..=var_count`. Variables no clause picked are absent from the formula.
pub fn random_formula<R: Rng + ?Sized>(
    rng: &mut R,
    var_count: u32,
    clause_count: usize,
) -> Result<Formula> {
    let max = max_clause_count(var_count);
    if clause_count > max {
        return Err(Error::TooManyClauses {
            vars: var_count,
            clauses: clause_count,
            max,
        });
    }
    let mut formula = Formula::new();
    while formula.clause_count() < clause_count {
        formula.add(&random_triplet(rng, var_count));
    }
    log::debug!("random formula: {formula}");
    Ok(formula)
}

#[cfg(test)]
mod random_test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{max_clause_count, random_formula, random_triplet};
    use crate::error::Error;
    use crate::sat::dimacs::{load_from_file, save_to_file};

    #[test]
    fn clause_bound() {
        assert_eq!(max_clause_count(2), 0);
        assert_eq!(max_clause_count(3), 8);
        assert_eq!(max_clause_count(5), 80);
    }

    #[test]
    fn triplets_use_distinct_variables_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let clause = random_triplet(&mut rng, 4);
            let names = clause.triple().names();
            assert!(names.iter().all(|name| (1..=4).contains(name)));
            assert!(clause.triple().canonical_key().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn same_seed_same_formula() {
        let a = random_formula(&mut StdRng::seed_from_u64(7), 9, 30).unwrap();
        let b = random_formula(&mut StdRng::seed_from_u64(7), 9, 30).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.clause_count(), 30);
        assert!(a.permutation().iter().all(|name| (1..=9).contains(&name)));
    }

    #[test]
    fn every_clause_over_three_variables() {
        let formula = random_formula(&mut StdRng::seed_from_u64(1), 3, 8).unwrap();
        assert_eq!(formula.clause_count(), 8);
        assert_eq!(formula.tier_count(), 1);
    }

    #[test]
    fn rejects_more_clauses_than_exist() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            random_formula(&mut rng, 3, 9),
            Err(Error::TooManyClauses { vars: 3, clauses: 9, max: 8 })
        ));
        assert!(random_formula(&mut rng, 2, 1).is_err());
        assert!(random_formula(&mut rng, 2, 0).unwrap().is_empty());
    }

    #[test]
    fn saved_formula_loads_back() {
        let formula = random_formula(&mut StdRng::seed_from_u64(12), 8, 10).unwrap();
        let path = std::env::temp_dir().join(format!("sat3-random-{}.cnf", std::process::id()));
        save_to_file(&formula, &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.var_count(), formula.var_count());
        assert_eq!(loaded.clause_count(), 10);
        assert_eq!(loaded, formula);
    }
}
