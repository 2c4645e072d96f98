pub mod assignment;
pub mod clause;
pub mod ctf;
pub mod dimacs;
#[cfg(test)]
mod fixtures;
pub mod formula;
pub mod hss;
pub mod legacy;
pub mod octant;
pub mod permutation;
pub mod pretty;
pub mod random;
pub mod tier;
pub mod unify;

use assignment::Assignment;
use ctf::{complete_to_cts, create_ctf};
use formula::Formula;
use hss::create_hyper_structures_system;
use unify::unify;

use crate::config::SolverConfig;
use crate::error::{EmptyStructure, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Satisfiable(Assignment),
    Unsatisfiable,
}

impl Outcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, Outcome::Satisfiable(_))
    }
}

#[derive(Debug, Clone)]
pub struct Solver {
    formula: Formula,
    config: SolverConfig,
}

impl Solver {
    pub fn new(formula: Formula) -> Self {
        Self {
            formula,
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Splits the formula into compact structures over its variables.
    pub fn structures(&self) -> std::result::Result<Vec<Formula>, EmptyStructure> {
        let mut cts = create_ctf(&self.formula);
        complete_to_cts(&mut cts, self.formula.permutation())?;
        for (idx, structure) in cts.iter().enumerate() {
            log::debug!(
                "structure #{idx}: {}",
                pretty::render(structure, &self.config.pretty).trim_end()
            );
        }
        Ok(cts)
    }

    fn search(&self) -> Result<Assignment> {
        let mut cts = self.structures()?;
        if cts.len() == 1 {
            return cts[0]
                .any_assignment()
                .ok_or_else(|| EmptyStructure { index: 0 }.into());
        }

        let removed = unify(&mut cts)?;
        log::debug!("unification of {} structures removed {removed} octants", cts.len());
        let hss = create_hyper_structures_system(&cts, &self.config)?;
        let route = hss.find_route()?;
        log::debug!("route found over {} tiers", route.len());
        Ok(route.assignment())
    }

    pub fn run(self) -> Result<Outcome> {
        log::info!("solving {}", self.formula);
        if self.formula.is_empty() {
            return Ok(Outcome::Satisfiable(Assignment::new()));
        }

        let assignment = match self.search() {
            Ok(assignment) => assignment,
            Err(Error::EmptyStructure(EmptyStructure { index })) => {
                log::info!("structure #{index} is empty, formula is unsatisfiable");
                return Ok(Outcome::Unsatisfiable);
            }
            Err(err) => return Err(err),
        };

        if !self.formula.evaluate(&assignment) {
            log::warn!("certificate {assignment} does not satisfy the formula");
            return Err(Error::InvalidCertificate);
        }
        Ok(Outcome::Satisfiable(assignment))
    }
}

#[cfg(test)]
mod sat_test {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::{Outcome, Solver};
    use crate::config::SolverConfig;
    use crate::sat::assignment::Assignment;
    use crate::sat::dimacs::{formula_to_dimacs_string, parse_formula_from_dimacs_str};
    use crate::sat::fixtures::ARTICLE_EXAMPLE;
    use crate::sat::formula::Formula;
    use crate::sat::random::random_formula;

    fn solve_formula(formula: &Formula) -> Outcome {
        let _ = env_logger::builder().is_test(true).try_init();
        let outcome = Solver::new(formula.clone()).run().unwrap();
        if let Outcome::Satisfiable(assignment) = &outcome {
            assert!(formula.evaluate(assignment));
        }
        outcome
    }

    fn solve(text: &str) -> Outcome {
        solve_formula(&parse_formula_from_dimacs_str(text).unwrap())
    }

    fn satisfiable_by_enumeration(formula: &Formula, var_count: u32) -> bool {
        (0u32..1 << var_count).any(|bits| {
            let assignment: Assignment = (1..=var_count)
                .map(|var| (var, (bits >> (var - 1)) & 1 == 1))
                .collect();
            formula.evaluate(&assignment)
        })
    }

    #[test]
    fn sat_single_clause() {
        assert!(solve("p cnf 3 1\n1 2 3 0").is_sat());
    }

    #[test]
    fn empty_formula_is_sat() {
        assert!(solve("p cnf 0 0").is_sat());
    }

    #[test]
    fn unsat_simple() {
        let outcome = solve(
            "p cnf 3 8
            1 2 3 0
            1 2 -3 0
            1 -2 3 0
            1 -2 -3 0
            -1 2 3 0
            -1 2 -3 0
            -1 -2 3 0
            -1 -2 -3 0",
        );
        assert_eq!(outcome, Outcome::Unsatisfiable);
    }

    #[test]
    fn sat_chain() {
        let outcome = solve(
            "p cnf 5 4
            1 2 3 0
            -2 3 4 0
            3 -4 5 0
            -1 -2 -3 0",
        );
        assert!(outcome.is_sat());
    }

    #[test]
    fn unsat_across_structures() {
        // x1 is forced true by the first four clauses and false by the rest
        let outcome = solve(
            "p cnf 5 8
            1 2 3 0
            1 2 -3 0
            1 -2 3 0
            1 -2 -3 0
            -1 4 5 0
            -1 4 -5 0
            -1 -4 5 0
            -1 -4 -5 0",
        );
        assert_eq!(outcome, Outcome::Unsatisfiable);
    }

    #[test]
    fn sat_across_structures() {
        let outcome = solve(
            "p cnf 6 3
            1 2 3 0
            4 5 6 0
            1 3 5 0",
        );
        assert!(outcome.is_sat());
    }

    #[test]
    fn sat_article_example() {
        assert!(solve(ARTICLE_EXAMPLE).is_sat());
    }

    #[test]
    fn sat_with_checked_invariants() {
        let formula = parse_formula_from_dimacs_str(
            "p cnf 5 3
            1 2 3 0
            -3 -4 -5 0
            2 4 -5 0",
        )
        .unwrap();
        let config = SolverConfig {
            check_invariants: true,
            ..SolverConfig::default()
        };
        let outcome = Solver::new(formula).with_config(config).run().unwrap();
        assert!(outcome.is_sat());
    }

    #[test]
    fn random_instances_match_enumeration() {
        let mut rng = StdRng::seed_from_u64(2024);
        for round in 0..150 {
            let vars = rng.gen_range(4..=9);
            let clauses = rng.gen_range((vars as usize)..=(5 * vars as usize));
            let formula = random_formula(&mut rng, vars, clauses).unwrap();
            let expected = satisfiable_by_enumeration(&formula, vars);
            assert_eq!(
                solve_formula(&formula).is_sat(),
                expected,
                "round {round}:\n{}",
                formula_to_dimacs_string(&formula)
            );
        }
    }
}
