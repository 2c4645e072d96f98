//! Hyper-structure systems.
//!
//! A hyper-structure pairs the basic structure (the one with the fewest
//! clauses) with one other structure. Its tiers mirror the basic tiers: for
//! every octant still allowed by a basic tier there is a vertex holding the
//! part of the other structure that stays satisfiable once that octant is
//! chosen. Every hyper-structure of a system shares the same basic
//! structure, and the system is built tier by tier so that coincident
//! vertices stay unified across all of them.

mod route;
mod system;
mod vertex;

use std::collections::BTreeMap;

use itertools::Itertools;

pub use route::{evaluate, Route};
pub use vertex::{Edge, Vertex};

use super::formula::Formula;
use super::octant::Octant;
use crate::config::SolverConfig;
use crate::error::{EmptyStructure, Error, Result};

pub type TierMap = BTreeMap<Octant, Vertex>;

#[derive(Debug, Clone)]
pub struct HyperStructure {
    other: Formula,
    tiers: Vec<TierMap>,
}

impl HyperStructure {
    pub fn new(other: Formula) -> Self {
        Self {
            other,
            tiers: Vec::new(),
        }
    }

    pub fn other(&self) -> &Formula {
        &self.other
    }

    pub fn tiers(&self) -> &[TierMap] {
        &self.tiers
    }

    pub fn vertex(&self, tier: usize, octant: Octant) -> Option<&Vertex> {
        self.tiers.get(tier)?.get(&octant)
    }
}

/// How often construction had to throw built tiers away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Restarts from a tier after the first.
    pub rebuilds: usize,
    /// Restarts from tier 0.
    pub reseeds: usize,
}

#[derive(Debug, Clone)]
pub struct HyperStructureSystem {
    basic: Formula,
    basic_index: usize,
    structures: Vec<HyperStructure>,
    check_invariants: bool,
    stats: BuildStats,
}

impl HyperStructureSystem {
    pub fn basic(&self) -> &Formula {
        &self.basic
    }

    /// Position of the basic structure in the list the system was built from.
    pub fn basic_index(&self) -> usize {
        self.basic_index
    }

    pub fn structures(&self) -> &[HyperStructure] {
        &self.structures
    }

    pub fn tier_count(&self) -> usize {
        self.basic.tier_count()
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }
}

/// Index of the structure with the fewest clauses, the first one on ties.
pub fn choose_basic_structure(cts: &[Formula]) -> Option<usize> {
    cts.iter().position_min_by_key(|f| f.clause_count())
}

/// Builds the hyper-structure system of a list of compact triplet
/// structures over one variable set.
pub fn create_hyper_structures_system(
    cts: &[Formula],
    config: &SolverConfig,
) -> Result<HyperStructureSystem> {
    if cts.len() < 2 {
        return Err(Error::TooFewStructures(cts.len()));
    }
    let basic_index = choose_basic_structure(cts).ok_or(Error::TooFewStructures(0))?;
    if let Some(index) = cts.iter().position(Formula::is_empty) {
        return Err(EmptyStructure { index }.into());
    }
    if config.check_invariants {
        let variables = cts[basic_index].permutation();
        assert!(
            cts.iter().all(|f| f.permutation().same_variables(variables)),
            "structures range over different variables"
        );
    }
    let structures = cts
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != basic_index)
        .map(|(_, other)| HyperStructure::new(other.clone()))
        .collect();

    let mut hss = HyperStructureSystem {
        basic: cts[basic_index].clone(),
        basic_index,
        structures,
        check_invariants: config.check_invariants,
        stats: BuildStats::default(),
    };
    log::info!(
        "basic structure #{basic_index}: {}, {} hyper-structures",
        hss.basic,
        hss.structures.len()
    );
    hss.build()?;
    log::debug!(
        "built with {} rebuilds and {} reseeds",
        hss.stats.rebuilds,
        hss.stats.reseeds
    );
    Ok(hss)
}
