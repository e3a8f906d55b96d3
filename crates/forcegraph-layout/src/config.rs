//! Layout configuration.
//!
//! Every field has a default, so a partial JSON object (or none at all)
//! deserializes into a usable [`LayoutConfig`].

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Initial node placement used by [`LayoutEngine::initialize`](crate::LayoutEngine::initialize).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Nodes evenly spaced on a circle around the origin, in load order.
    #[default]
    Circle,
    /// Uniformly scattered positions drawn from a ChaCha8 PRNG. The same
    /// seed always yields the same placement.
    Random { seed: u64 },
}

/// Force-directed layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Natural edge length `k` in layout units.
    pub ideal_distance: f64,
    /// Scale of the all-pairs repulsive force `k² / d`.
    pub repulsion: f64,
    /// Scale of the edge attractive force `w · d² / k`.
    pub attraction: f64,
    /// Pull toward the layout centroid. Zero disables it.
    pub gravity: f64,
    /// Converts force into displacement.
    pub time_step: f64,
    /// Per-node displacement cap for the first step after `initialize`.
    pub initial_temperature: f64,
    /// Per-node displacement cap for the first step after `warm_start`.
    pub warm_temperature: f64,
    /// Damping: the displacement cap is multiplied by this after every step.
    pub cooling: f64,
    /// Distances below this are floored before dividing.
    pub min_distance: f64,
    /// Convergence threshold on the largest per-node displacement.
    pub epsilon: f64,
    /// Hard cap on iterations per run.
    pub max_iterations: usize,
    pub placement: Placement,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            ideal_distance: 30.0,
            repulsion: 1.0,
            attraction: 1.0,
            gravity: 0.05,
            time_step: 0.05,
            initial_temperature: 10.0,
            warm_temperature: 2.0,
            cooling: 0.98,
            min_distance: 0.01,
            epsilon: 0.01,
            max_iterations: 500,
            placement: Placement::Circle,
        }
    }
}

impl LayoutConfig {
    /// Checks that every parameter keeps the simulation finite and bounded.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let positive = [
            ("ideal_distance", self.ideal_distance),
            ("repulsion", self.repulsion),
            ("attraction", self.attraction),
            ("time_step", self.time_step),
            ("initial_temperature", self.initial_temperature),
            ("warm_temperature", self.warm_temperature),
            ("min_distance", self.min_distance),
            ("epsilon", self.epsilon),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{} must be positive and finite, got {}", name, value)));
            }
        }
        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            return Err(invalid(format!("gravity must be non-negative, got {}", self.gravity)));
        }
        if !(self.cooling > 0.0 && self.cooling <= 1.0) {
            return Err(invalid(format!("cooling must be in (0, 1], got {}", self.cooling)));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> LayoutError {
    LayoutError::InvalidConfig { reason }
}
