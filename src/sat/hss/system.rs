use std::borrow::{Borrow, BorrowMut};
use std::collections::btree_map::Entry;

use super::vertex::{Edge, Vertex};
use super::{HyperStructureSystem, TierMap};
use crate::error::EmptyStructure;
use crate::sat::formula::Formula;
use crate::sat::octant::Octant;
use crate::sat::unify::unify;

/// Unifies a group of coincident vertex structures. A lone structure only
/// has to be non-empty.
pub(crate) fn unify_group<F: BorrowMut<Formula>>(group: &mut [F]) -> Result<(), EmptyStructure> {
    match group.len() {
        0 => Ok(()),
        1 if Borrow::<Formula>::borrow(&group[0]).is_empty() => Err(EmptyStructure { index: 0 }),
        1 => Ok(()),
        _ => unify(group).map(|_| ()),
    }
}

impl HyperStructureSystem {
    pub(super) fn build(&mut self) -> Result<(), EmptyStructure> {
        let tier_count = self.basic.tier_count();
        let cap = (self.basic.clause_count() + 1) * (tier_count + 1) * 2;

        self.seed_first_tier()?;
        self.check_mirrors_basic();

        let mut j = 1;
        let mut steps = 0;
        while j < tier_count {
            steps += 1;
            assert!(steps <= cap, "hyper-structure construction did not settle");
            log::info!("building tier {j} of {tier_count}");

            self.shift_tier(j);
            self.prune_unreached(j)?;
            if self.count_dirty_tiers() == 0 {
                self.clear_leaf_vertices(j - 1)?;
            }
            if self.count_dirty_tiers() == 0 {
                self.unify_tier(j)?;
            }

            let dirty = self.count_dirty_tiers();
            if dirty == 0 {
                self.check_mirrors_basic();
                j += 1;
                continue;
            }
            let kept = self.built_tiers() - dirty;
            log::info!("{dirty} dirty tiers, rebuilding from tier {kept}");
            self.truncate(kept);
            if kept == 0 {
                self.stats.reseeds += 1;
                self.seed_first_tier()?;
                j = 1;
            } else {
                self.stats.rebuilds += 1;
                j = kept;
            }
        }
        Ok(())
    }

    fn built_tiers(&self) -> usize {
        self.structures.first().map_or(0, |hs| hs.tiers.len())
    }

    fn seed_first_tier(&mut self) -> Result<(), EmptyStructure> {
        let rounds = self.basic.clause_count() + 1;
        for _ in 0..rounds {
            let tier = *self.basic.tier(0);
            for hs in self.structures.iter_mut() {
                let vertices: TierMap = tier
                    .octants()
                    .map(|octant| {
                        let structure = hs.other.concretize_octant(tier.triple(), octant);
                        (octant, Vertex::new(octant, structure))
                    })
                    .collect();
                hs.tiers = vec![vertices];
            }
            self.unify_tier(0)?;
            if self.count_dirty_tiers() == 0 {
                return Ok(());
            }
            log::info!("tier 0 went dirty, seeding again");
        }
        panic!("seeding tier 0 did not settle after {rounds} rounds");
    }

    /// Builds tier `j` from the vertices of tier `j - 1`.
    fn shift_tier(&mut self, j: usize) {
        let targets = *self.basic.tier(j);
        let new_var = targets.triple().c();
        for hs in self.structures.iter_mut() {
            hs.tiers.truncate(j);
            for vertex in hs.tiers[j - 1].values_mut() {
                vertex.reset_edges();
            }
            hs.tiers.push(TierMap::new());
        }

        let sources: Vec<Octant> = self.structures[0].tiers[j - 1].keys().copied().collect();
        for source in sources {
            for (slot, target) in source.adjoin_right_targets().into_iter().enumerate() {
                if !targets.contains(target) {
                    continue;
                }
                let edge = match self.concordant_shift(j, source, new_var, target.value_at(2)) {
                    Ok(shifted) => {
                        for (hs, structure) in self.structures.iter_mut().zip(shifted) {
                            match hs.tiers[j].entry(target) {
                                Entry::Occupied(mut entry) => {
                                    let vertex = entry.get_mut();
                                    vertex.structure = vertex.structure.union(&structure);
                                }
                                Entry::Vacant(entry) => {
                                    entry.insert(Vertex::new(target, structure));
                                }
                            }
                        }
                        Edge::Target(target)
                    }
                    Err(_) => {
                        log::debug!("shift {source} -> {target} at tier {j} is empty");
                        Edge::Empty
                    }
                };
                for hs in self.structures.iter_mut() {
                    if let Some(vertex) = hs.tiers[j - 1].get_mut(&source) {
                        vertex.bottom[slot] = edge;
                    }
                }
            }
        }
    }

    /// Moves the vertices of `source` at tier `j - 1` onto `var = value`,
    /// then filters them against every earlier tier.
    fn concordant_shift(
        &self,
        j: usize,
        source: Octant,
        var: u32,
        value: bool,
    ) -> Result<Vec<Formula>, EmptyStructure> {
        let mut shifted: Vec<Formula> = self
            .structures
            .iter()
            .map(|hs| hs.tiers[j - 1][&source].structure.concretize(var, value))
            .collect();
        unify_group(&mut shifted)?;

        for t in 0..j.saturating_sub(1) {
            let keys: Vec<Octant> = self.structures[0].tiers[t].keys().copied().collect();
            let mut filtered: Vec<Option<Formula>> = vec![None; shifted.len()];
            for key in keys {
                let mut group: Vec<Formula> = self
                    .structures
                    .iter()
                    .zip(shifted.iter())
                    .map(|(hs, structure)| structure.intersect(&hs.tiers[t][&key].structure))
                    .collect();
                if unify_group(&mut group).is_err() {
                    continue;
                }
                for (acc, part) in filtered.iter_mut().zip(group) {
                    *acc = Some(match acc.take() {
                        Some(union) => union.union(&part),
                        None => part,
                    });
                }
            }
            shifted = filtered
                .into_iter()
                .enumerate()
                .map(|(index, f)| f.ok_or(EmptyStructure { index }))
                .collect::<Result<_, _>>()?;
            unify_group(&mut shifted)?;
        }
        Ok(shifted)
    }

    /// Drops basic octants of tier `j` that some hyper-structure never reached.
    fn prune_unreached(&mut self, j: usize) -> Result<(), EmptyStructure> {
        let octants: Vec<Octant> = self.basic.tier(j).octants().collect();
        for octant in octants {
            if self.count_dirty_tiers() > 0 {
                break;
            }
            if self
                .structures
                .iter()
                .all(|hs| hs.tiers[j].contains_key(&octant))
            {
                continue;
            }
            log::debug!("octant {octant} of tier {j} is unreachable");
            self.remove_vertex(j, octant)?;
        }
        Ok(())
    }

    /// Clears vertices of tier `t` with no live edge into tier `t + 1`, then
    /// unifies tier `t` so they are removed everywhere.
    fn clear_leaf_vertices(&mut self, t: usize) -> Result<(), EmptyStructure> {
        let mut cleared = false;
        for hs in self.structures.iter_mut() {
            let (head, tail) = hs.tiers.split_at_mut(t + 1);
            let next = &tail[0];
            for vertex in head[t].values_mut() {
                if !vertex.targets().any(|target| next.contains_key(&target)) {
                    log::debug!("vertex {} of tier {t} is a leaf", vertex.octant);
                    vertex.structure.clear();
                    cleared = true;
                }
            }
        }
        if cleared {
            self.unify_tier(t)?;
        }
        Ok(())
    }

    /// Unifies coincident vertices of tier `t` across every hyper-structure,
    /// removing the octants whose group has no satisfying assignment.
    fn unify_tier(&mut self, t: usize) -> Result<(), EmptyStructure> {
        let octants: Vec<Octant> = self.structures[0].tiers[t].keys().copied().collect();
        for octant in octants {
            if self.count_dirty_tiers() > 0 {
                break;
            }
            let result = {
                let mut group: Vec<&mut Formula> = self
                    .structures
                    .iter_mut()
                    .map(|hs| {
                        let vertex = hs.tiers[t]
                            .get_mut(&octant)
                            .expect("coincident vertices exist in every hyper-structure");
                        &mut vertex.structure
                    })
                    .collect();
                unify_group(&mut group)
            };
            if let Err(err) = result {
                log::debug!(
                    "vertex {octant} of tier {t} is empty in hyper-structure #{}",
                    err.index
                );
                self.remove_vertex(t, octant)?;
            }
        }
        Ok(())
    }

    /// Removes `octant` from tier `t` of every hyper-structure and of the
    /// basic structure. When the basic cleanup reaches other tiers, every
    /// tier from the one before the first change onwards goes dirty.
    fn remove_vertex(&mut self, t: usize, octant: Octant) -> Result<(), EmptyStructure> {
        for hs in self.structures.iter_mut() {
            hs.tiers[t].remove(&octant);
        }
        self.basic.remove_octant(t, octant);
        let status = self.basic.cleanup_around(t);
        if self.basic.is_empty() {
            log::info!("basic structure emptied removing {octant} from tier {t}");
            return Err(EmptyStructure {
                index: self.basic_index,
            });
        }
        if status.changed {
            let start = status.from.saturating_sub(1).min(t);
            log::debug!(
                "basic cleanup changed tiers {}..={}, tiers from {start} are dirty",
                status.from,
                status.to
            );
            self.mark_dirty(start);
        }
        Ok(())
    }

    fn mark_dirty(&mut self, start: usize) {
        for hs in self.structures.iter_mut() {
            for tier in hs.tiers.iter_mut().skip(start) {
                for vertex in tier.values_mut() {
                    vertex.dirty = true;
                }
            }
        }
    }

    fn tier_is_dirty(&self, t: usize) -> bool {
        self.structures
            .iter()
            .any(|hs| hs.tiers[t].values().any(|vertex| vertex.dirty))
    }

    /// Number of trailing built tiers that are dirty.
    fn count_dirty_tiers(&self) -> usize {
        (0..self.built_tiers())
            .rev()
            .take_while(|t| self.tier_is_dirty(*t))
            .count()
    }

    fn truncate(&mut self, len: usize) {
        for hs in self.structures.iter_mut() {
            hs.tiers.truncate(len);
            if let Some(last) = hs.tiers.last_mut() {
                for vertex in last.values_mut() {
                    vertex.reset_edges();
                }
            }
        }
    }

    fn check_mirrors_basic(&self) {
        if !self.check_invariants {
            return;
        }
        for (idx, hs) in self.structures.iter().enumerate() {
            for (t, tier) in hs.tiers.iter().enumerate() {
                let basic: Vec<Octant> = self.basic.tier(t).octants().collect();
                let keys: Vec<Octant> = tier.keys().copied().collect();
                assert_eq!(
                    keys, basic,
                    "tier {t} of hyper-structure #{idx} does not mirror the basic structure"
                );
            }
        }
    }
}

#[cfg(test)]
mod system_test {
    use crate::config::SolverConfig;
    use crate::error::Error;
    use crate::sat::clause::Triplet;
    use crate::sat::ctf::{complete_to_cts, create_ctf};
    use crate::sat::dimacs::parse_formula_from_dimacs_str;
    use crate::sat::formula::Formula;
    use crate::sat::hss::{create_hyper_structures_system, BuildStats};
    use crate::sat::octant::Octant;
    use crate::sat::permutation::Permutation;
    use crate::sat::unify::unify;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cts(list: &[[i32; 3]], variables: &[u32]) -> Formula {
        let triplets: Vec<_> = list.iter().map(|c| Triplet::from_dimacs(*c)).collect();
        let mut formula = Formula::from_clauses(&triplets);
        formula.complete(&Permutation::from_names(variables.iter().copied()));
        formula
    }

    fn checked() -> SolverConfig {
        SolverConfig {
            check_invariants: true,
            ..SolverConfig::default()
        }
    }

    #[test]
    fn builds_every_tier() {
        init();
        let a = cts(&[[1, 2, 3]], &[1, 2, 3, 4]);
        let b = cts(&[[-2, -3, -4]], &[2, 3, 4, 1]);
        let hss = create_hyper_structures_system(&[a, b], &checked()).unwrap();
        assert_eq!(hss.basic_index(), 0);
        assert_eq!(hss.tier_count(), 2);
        let hs = &hss.structures()[0];
        assert_eq!(hs.tiers().len(), 2);
        let first: Vec<Octant> = hs.tiers()[0].keys().copied().collect();
        let basic_first: Vec<Octant> = hss.basic().tier(0).octants().collect();
        assert_eq!(first, basic_first);
        // every vertex of tier 0 keeps at least one way down
        for vertex in hs.tiers()[0].values() {
            assert!(vertex
                .targets()
                .any(|target| hs.vertex(1, target).is_some()));
        }
    }

    #[test]
    fn contradicting_structures_raise_empty_structure() {
        init();
        let a = cts(
            &[[1, 2, 3], [1, 2, -3], [1, -2, 3], [1, -2, -3]],
            &[1, 2, 3, 4],
        );
        let b = cts(
            &[[-1, 2, 4], [-1, 2, -4], [-1, -2, 4], [-1, -2, -4]],
            &[1, 2, 4, 3],
        );
        let err = create_hyper_structures_system(&[a, b], &checked()).unwrap_err();
        assert!(matches!(err, Error::EmptyStructure(_)));
    }

    #[test]
    fn needs_two_structures() {
        let a = cts(&[[1, 2, 3]], &[1, 2, 3]);
        let err = create_hyper_structures_system(&[a], &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, Error::TooFewStructures(1)));
    }

    #[test]
    fn dirty_tiers_rebuild_and_reseed() {
        init();
        let formula = parse_formula_from_dimacs_str(
            "p cnf 6 12
            3 5 1 0
            -5 1 -2 0
            -6 1 2 0
            -3 -2 1 0
            5 6 -3 0
            4 1 2 0
            -2 6 -5 0
            6 -3 5 0
            4 2 -5 0
            -5 4 -3 0
            5 3 4 0
            -4 -1 -2 0",
        )
        .unwrap();
        let mut structures = create_ctf(&formula);
        complete_to_cts(&mut structures, formula.permutation()).unwrap();
        assert_eq!(structures.len(), 3);
        unify(&mut structures).unwrap();

        let hss = create_hyper_structures_system(&structures, &checked()).unwrap();
        // one restart from a later tier, one from tier 0
        assert_eq!(
            hss.stats(),
            BuildStats {
                rebuilds: 1,
                reseeds: 1
            }
        );
        assert_eq!(hss.tier_count(), 4);
        for hs in hss.structures() {
            assert_eq!(hs.tiers().len(), 4);
        }
        let route = hss.find_route().unwrap();
        assert!(formula.evaluate(&route.assignment()));
    }

    #[test]
    fn clean_build_needs_no_restart() {
        let a = cts(&[[1, 2, 3]], &[1, 2, 3, 4]);
        let b = cts(&[[-2, -3, -4]], &[2, 3, 4, 1]);
        let hss = create_hyper_structures_system(&[a, b], &SolverConfig::default()).unwrap();
        assert_eq!(hss.stats(), BuildStats::default());
    }
}
