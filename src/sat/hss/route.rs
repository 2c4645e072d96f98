use super::{HyperStructureSystem, TierMap};
use crate::error::{Error, Result};
use crate::sat::assignment::Assignment;
use crate::sat::clause::Triple;
use crate::sat::formula::Formula;
use crate::sat::octant::Octant;

/// One octant per basic tier, chained through adjoin targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    steps: Vec<(Triple, Octant)>,
}

impl Route {
    pub fn steps(&self) -> &[(Triple, Octant)] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn assignment(&self) -> Assignment {
        let mut assignment = Assignment::new();
        for (triple, octant) in self.steps.iter() {
            for (pos, name) in triple.names().into_iter().enumerate() {
                assignment.assign(name, octant.value_at(pos));
            }
        }
        assignment
    }
}

/// Whether the route's assignment satisfies every clause formula.
pub fn evaluate(formulas: &[Formula], route: &Route) -> bool {
    let assignment = route.assignment();
    formulas.iter().all(|formula| formula.evaluate(&assignment))
}

fn all_meet(witness: &[Formula], vertices: &[&TierMap], octant: Octant) -> Option<Vec<Formula>> {
    witness
        .iter()
        .zip(vertices.iter())
        .map(|(w, tier)| {
            let vertex = tier.get(&octant)?;
            let meet = w.intersect(&vertex.structure);
            (!meet.is_empty()).then_some(meet)
        })
        .collect()
}

impl HyperStructureSystem {
    fn tier_maps(&self, t: usize) -> Vec<&TierMap> {
        self.structures.iter().map(|hs| &hs.tiers[t]).collect()
    }

    /// Every later tier still has, in every hyper-structure, a vertex that
    /// meets the witness.
    fn forward_check(&self, t: usize, witness: &[Formula]) -> bool {
        (t + 1..self.tier_count()).all(|u| {
            self.structures.iter().zip(witness).all(|(hs, w)| {
                hs.tiers[u]
                    .values()
                    .any(|vertex| !w.intersect(&vertex.structure).is_empty())
            })
        })
    }

    /// Finds a chain of vertices, one per tier, whose sub-structures keep a
    /// common non-empty intersection in every hyper-structure.
    pub fn find_route(&self) -> Result<Route> {
        let tier_count = self.tier_count();
        if tier_count == 0 || self.structures.is_empty() {
            return Err(Error::RouteNotFound { tier: 0 });
        }
        assert_eq!(
            self.structures[0].tiers.len(),
            tier_count,
            "route search on a partially built system"
        );
        let last = tier_count - 1;
        let last_tiers = self.tier_maps(last);
        let mut deepest = 0;

        for &last_octant in self.structures[0].tiers[last].keys() {
            let witness: Vec<Formula> = last_tiers
                .iter()
                .map(|tier| tier[&last_octant].structure.clone())
                .collect();
            if tier_count == 1 {
                let route = Route {
                    steps: vec![(*self.basic.tier(0).triple(), last_octant)],
                };
                if self.admits(&route) {
                    return Ok(route);
                }
                continue;
            }

            let first_tiers = self.tier_maps(0);
            for &first in self.structures[0].tiers[0].keys() {
                let Some(start) = all_meet(&witness, &first_tiers, first) else {
                    continue;
                };
                match self.walk(first, start, last_octant) {
                    Ok(route) if self.admits(&route) => return Ok(route),
                    Ok(_) => log::debug!("route ending in {last_octant} is not admitted"),
                    Err(tier) => deepest = deepest.max(tier),
                }
            }
        }
        log::info!("no route found, deepest tier reached: {deepest}");
        Err(Error::RouteNotFound { tier: deepest })
    }

    // Greedy walk from `first` on tier 0 down to `last_octant` on the last
    // tier. Fails with the tier where no candidate fitted.
    fn walk(
        &self,
        first: Octant,
        mut witness: Vec<Formula>,
        last_octant: Octant,
    ) -> std::result::Result<Route, usize> {
        let last = self.tier_count() - 1;
        let mut steps = vec![(*self.basic.tier(0).triple(), first)];
        let mut prev = first;

        for t in 1..last {
            let maps = self.tier_maps(t);
            let source = &self.structures[0].tiers[t - 1][&prev];
            let chosen = source.targets().find_map(|target| {
                let meet = all_meet(&witness, &maps, target)?;
                self.forward_check(t, &meet).then_some((target, meet))
            });
            let Some((target, meet)) = chosen else {
                return Err(t);
            };
            steps.push((*self.basic.tier(t).triple(), target));
            witness = meet;
            prev = target;
        }

        let reaches_last = self.structures[0].tiers[last - 1][&prev]
            .targets()
            .any(|target| target == last_octant);
        if !reaches_last {
            return Err(last);
        }
        steps.push((*self.basic.tier(last).triple(), last_octant));
        Ok(Route { steps })
    }

    fn admits(&self, route: &Route) -> bool {
        let assignment = route.assignment();
        self.basic.admits(&assignment)
            && self
                .structures
                .iter()
                .all(|hs| hs.other.admits(&assignment))
    }
}

#[cfg(test)]
mod route_test {
    use super::evaluate;
    use crate::config::SolverConfig;
    use crate::sat::clause::Triplet;
    use crate::sat::formula::Formula;
    use crate::sat::hss::create_hyper_structures_system;
    use crate::sat::permutation::Permutation;

    fn clauses(list: &[[i32; 3]]) -> Formula {
        let triplets: Vec<_> = list.iter().map(|c| Triplet::from_dimacs(*c)).collect();
        Formula::from_clauses(&triplets)
    }

    #[test]
    fn route_satisfies_both_formulas() {
        let _ = env_logger::builder().is_test(true).try_init();
        let first = clauses(&[[1, 2, 3]]);
        let second = clauses(&[[-2, -3, -4]]);
        let mut a = first.clone();
        a.complete(&Permutation::from_names([1, 2, 3, 4]));
        let mut b = second.clone();
        b.complete(&Permutation::from_names([2, 3, 4, 1]));

        let hss = create_hyper_structures_system(&[a, b], &SolverConfig::default()).unwrap();
        let route = hss.find_route().unwrap();
        assert_eq!(route.len(), 2);
        let assignment = route.assignment();
        assert_eq!(assignment.len(), 4);
        assert!(evaluate(&[first, second], &route));
    }

    #[test]
    fn route_through_longer_chain() {
        let first = clauses(&[[1, 2, 3], [-2, 3, 4], [3, -4, 5], [-1, -2, -3]]);
        let second = clauses(&[[-5, 4, 1], [-4, 1, -2]]);
        let variables = first.permutation().clone();
        let mut a = first.clone();
        a.complete(&variables);
        let mut b = second.clone();
        b.complete(&variables);

        let hss = create_hyper_structures_system(&[a, b], &SolverConfig::default()).unwrap();
        let route = hss.find_route().unwrap();
        assert_eq!(route.len(), 3);
        assert!(evaluate(&[first, second], &route));
    }
}
