//! Per-run simulation state.
//!
//! A [`LayoutState`] belongs to exactly one topology version of one graph.
//! Only the engine mutates it; callers hold it between steps and may read
//! progress counters, nothing more.

use forcegraph_core::Position;

/// Positions, force accumulators and convergence counters for one layout run.
#[derive(Debug, Clone)]
pub struct LayoutState {
    pub(crate) positions: Vec<Position>,
    /// Net force per node from the last step.
    pub(crate) forces: Vec<(f64, f64)>,
    /// Current per-node displacement cap.
    pub(crate) temperature: f64,
    pub(crate) iteration: usize,
    pub(crate) last_max_displacement: f64,
    pub(crate) topology_version: u64,
}

impl LayoutState {
    pub(crate) fn new(positions: Vec<Position>, temperature: f64, topology_version: u64) -> Self {
        let forces = vec![(0.0, 0.0); positions.len()];
        LayoutState {
            positions,
            forces,
            temperature,
            iteration: 0,
            last_max_displacement: f64::INFINITY,
            topology_version,
        }
    }

    /// Slot-ordered positions computed so far.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Steps taken since this state was created.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Largest per-node displacement of the last step (infinite before the
    /// first step).
    pub fn last_max_displacement(&self) -> f64 {
        self.last_max_displacement
    }

    /// Topology version of the graph this state was built for.
    pub fn topology_version(&self) -> u64 {
        self.topology_version
    }
}
