//! Nodes and their 2D positions.
//!
//! A [`Node`]'s position is written only by the layout engine (through
//! [`Graph::apply_positions`](crate::graph::Graph::apply_positions)); its
//! display attributes are carried through untouched.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Opaque display attributes (label, color, size, ...). Never interpreted by
/// the core.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A point in layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns `true` if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A node in the graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Node {
            id,
            position: Position::ORIGIN,
            attributes: Attributes::new(),
        }
    }
}
