//! Fruchterman-Reingold style force-directed layout.
//!
//! Each step accumulates three forces per node:
//! - repulsion between every pair, `repulsion · k² / d`;
//! - attraction along every edge, `attraction · w · d² / k`, so heavier edges
//!   settle their endpoints closer together;
//! - gravity toward the centroid, `gravity · |centroid - p|`.
//!
//! Force is turned into displacement by `time_step` and capped by the current
//! temperature, which decays by `cooling` after every step.
//!
//! # Numeric safety
//!
//! Distances are floored at `min_distance` before dividing, and coincident
//! nodes are pushed apart along a deterministic golden-angle direction. Every
//! pairwise force is clamped to [`FORCE_CEILING`], so extreme weights cannot
//! produce infinities. Zero-weight edges exert no attraction at all: a zero
//! weight means "no link". Self-loops are ignored.
//!
//! Positions are kept inside `[-POSITION_BOUND, POSITION_BOUND]` on both
//! axes, both when a warm start adopts the graph's coordinates and after
//! every integration. Differences, squared distances and the centroid sum
//! stay finite for any graph that fits in memory.

use std::f64::consts::TAU;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use forcegraph_core::{Graph, Position};

use crate::config::{LayoutConfig, Placement};
use crate::error::LayoutError;
use crate::state::LayoutState;

/// Upper bound on any single pairwise force magnitude.
pub const FORCE_CEILING: f64 = 1e9;

/// Largest absolute coordinate the simulation works with.
pub const POSITION_BOUND: f64 = 1e12;

/// Fractional part of the golden ratio; spreads fallback directions evenly.
const GOLDEN: f64 = 0.618_033_988_749_895;

/// Result of a single [`LayoutEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Iteration count after this step.
    pub iteration: usize,
    /// Largest per-node displacement applied by this step.
    pub max_displacement: f64,
    /// `max_displacement` fell below the configured epsilon.
    pub converged: bool,
}

/// Result of [`LayoutEngine::run`] / [`LayoutEngine::settle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub iterations: usize,
    pub converged: bool,
    pub max_displacement: f64,
}

/// The layout engine. Stateless apart from its configuration: all
/// simulation state lives in the [`LayoutState`] the caller passes in.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(LayoutEngine { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // State construction
    // -----------------------------------------------------------------------

    /// Builds fresh layout state with the configured initial placement.
    ///
    /// Must be called again whenever the graph's topology version changes.
    pub fn initialize(&self, graph: &Graph) -> LayoutState {
        let n = graph.node_count();
        let k = self.config.ideal_distance;
        let positions = match self.config.placement {
            Placement::Circle => circle(n, k),
            Placement::Random { seed } => scatter(n, k, seed),
        };
        debug!(
            nodes = n,
            topology_version = graph.topology_version(),
            placement = ?self.config.placement,
            "layout initialized"
        );
        LayoutState::new(
            positions,
            self.config.initial_temperature,
            graph.topology_version(),
        )
    }

    /// Builds layout state from the graph's current positions.
    ///
    /// Valid after weight-only changes: the previous layout is reused as the
    /// starting point and only a small temperature is allowed.
    pub fn warm_start(&self, graph: &Graph) -> LayoutState {
        let positions = graph.positions().into_iter().map(bounded).collect();
        LayoutState::new(
            positions,
            self.config.warm_temperature,
            graph.topology_version(),
        )
    }

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Performs one simulation iteration on `state`.
    ///
    /// Reads edge weights from `graph` on every call, so weight edits take
    /// effect on the next step. Fails if `state` belongs to another topology.
    pub fn step(&self, graph: &Graph, state: &mut LayoutState) -> Result<StepOutcome, LayoutError> {
        if state.topology_version != graph.topology_version()
            || state.positions.len() != graph.node_count()
        {
            return Err(LayoutError::StaleLayoutState {
                expected: graph.topology_version(),
                found: state.topology_version,
            });
        }

        let cfg = &self.config;
        let k = cfg.ideal_distance;
        let n = state.positions.len();
        state.forces.iter_mut().for_each(|f| *f = (0.0, 0.0));

        // Repulsion between all pairs
        for i in 0..n {
            for j in (i + 1)..n {
                let ((ux, uy), dist) = self.separation(&state.positions, i, j);
                let force = (cfg.repulsion * k * k / dist).min(FORCE_CEILING);
                state.forces[i].0 += ux * force;
                state.forces[i].1 += uy * force;
                state.forces[j].0 -= ux * force;
                state.forces[j].1 -= uy * force;
            }
        }

        // Attraction along edges
        for (a, b, weight) in graph.weighted_links() {
            if weight <= 0.0 {
                continue;
            }
            let ((ux, uy), dist) = self.separation(&state.positions, a, b);
            let force = (cfg.attraction * weight * dist * dist / k).min(FORCE_CEILING);
            state.forces[a].0 -= ux * force;
            state.forces[a].1 -= uy * force;
            state.forces[b].0 += ux * force;
            state.forces[b].1 += uy * force;
        }

        // Gravity toward the centroid
        if cfg.gravity > 0.0 && n > 1 {
            let (sx, sy) = state
                .positions
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            let (cx, cy) = (sx / n as f64, sy / n as f64);
            for (force, p) in state.forces.iter_mut().zip(&state.positions) {
                force.0 += (cfg.gravity * (cx - p.x)).clamp(-FORCE_CEILING, FORCE_CEILING);
                force.1 += (cfg.gravity * (cy - p.y)).clamp(-FORCE_CEILING, FORCE_CEILING);
            }
        }

        // Integrate, capping each node's displacement at the temperature
        let mut max_displacement: f64 = 0.0;
        for (p, &(fx, fy)) in state.positions.iter_mut().zip(&state.forces) {
            let (mut dx, mut dy) = (fx * cfg.time_step, fy * cfg.time_step);
            let len = dx.hypot(dy);
            if len > state.temperature {
                let scale = state.temperature / len;
                dx *= scale;
                dy *= scale;
            }
            *p = bounded(Position::new(p.x + dx, p.y + dy));
            max_displacement = max_displacement.max(dx.hypot(dy));
        }

        state.temperature *= cfg.cooling;
        state.iteration += 1;
        state.last_max_displacement = max_displacement;

        Ok(StepOutcome {
            iteration: state.iteration,
            max_displacement,
            converged: max_displacement < cfg.epsilon,
        })
    }

    /// Initializes a fresh state and steps it to convergence or the
    /// iteration cap, then writes the positions into `graph`.
    pub fn run(&self, graph: &mut Graph) -> Result<RunReport, LayoutError> {
        let mut state = self.initialize(graph);
        self.settle(graph, &mut state)
    }

    /// Steps an existing state until convergence or until it has taken
    /// `max_iterations` steps in total, then writes the positions into
    /// `graph`.
    pub fn settle(
        &self,
        graph: &mut Graph,
        state: &mut LayoutState,
    ) -> Result<RunReport, LayoutError> {
        let mut converged = false;
        while state.iteration < self.config.max_iterations {
            if self.step(graph, state)?.converged {
                converged = true;
                break;
            }
        }
        graph.apply_positions(&state.positions)?;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            components = graph.component_count(),
            iterations = state.iteration,
            converged,
            "layout settled"
        );
        Ok(RunReport {
            iterations: state.iteration,
            converged,
            max_displacement: state.last_max_displacement,
        })
    }

    /// Unit vector from node `j` to node `i`, and their distance floored at
    /// `min_distance`.
    fn separation(&self, positions: &[Position], i: usize, j: usize) -> ((f64, f64), f64) {
        let dx = positions[i].x - positions[j].x;
        let dy = positions[i].y - positions[j].y;
        let dist = dx.hypot(dy);
        let floor = self.config.min_distance;
        if dist > floor * 1e-6 {
            ((dx / dist, dy / dist), dist.max(floor))
        } else {
            let angle = ((i as f64) * GOLDEN + (j as f64) * GOLDEN * GOLDEN).fract() * TAU;
            ((angle.cos(), angle.sin()), floor)
        }
    }
}

fn bounded(p: Position) -> Position {
    Position::new(
        p.x.clamp(-POSITION_BOUND, POSITION_BOUND),
        p.y.clamp(-POSITION_BOUND, POSITION_BOUND),
    )
}

/// Evenly spaced positions on a circle around the origin.
fn circle(n: usize, k: f64) -> Vec<Position> {
    if n == 1 {
        return vec![Position::ORIGIN];
    }
    let radius = (k * n as f64 / TAU).max(k / 2.0);
    (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            Position::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Uniform positions in a square that grows with `sqrt(n)`.
fn scatter(n: usize, k: f64, seed: u64) -> Vec<Position> {
    let half = k * (n.max(1) as f64).sqrt();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| Position::new(rng.gen_range(-half..=half), rng.gen_range(-half..=half)))
        .collect()
}
