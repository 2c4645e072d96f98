use crate::sat::formula::Formula;
use crate::sat::octant::Octant;

/// A bottom edge from a vertex to the next tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    /// The adjoin target is not allowed by the basic structure.
    #[default]
    Absent,
    /// The shift towards the target left nothing.
    Empty,
    Target(Octant),
}

impl Edge {
    pub fn target(self) -> Option<Octant> {
        match self {
            Edge::Target(octant) => Some(octant),
            Edge::Absent | Edge::Empty => None,
        }
    }
}

/// One octant of a basic tier inside a hyper-structure, with what remains
/// of the other structure once that octant is chosen.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub octant: Octant,
    pub structure: Formula,
    pub bottom: [Edge; 2],
    pub dirty: bool,
}

impl Vertex {
    pub fn new(octant: Octant, structure: Formula) -> Self {
        Self {
            octant,
            structure,
            bottom: [Edge::Absent; 2],
            dirty: false,
        }
    }

    pub fn targets(&self) -> impl Iterator<Item = Octant> + '_ {
        self.bottom.iter().filter_map(|edge| edge.target())
    }

    pub fn reset_edges(&mut self) {
        self.bottom = [Edge::Absent; 2];
    }
}
