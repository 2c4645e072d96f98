//! Solver configuration types.

/// Configuration for the solver pipeline and hyper-structure construction
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// Re-check that every hyper-structure tier mirrors the basic structure
    /// after each construction step (slow, meant for debugging)
    pub check_invariants: bool,
    pub pretty: PrettyOptions,
}

/// Options for diagnostic rendering of formulas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrettyOptions {
    /// Render every octant as a row under the variable legend
    pub grid: bool,
    /// Name variables `x1, x2, ...` instead of `a, b, ..., aa, ab, ...`
    pub universal_names: bool,
}
