//! Load payloads exchanged with the remote store.
//!
//! [`GraphPayload`] is what a graph load consumes; [`EdgeRecord`] doubles as
//! the canonical edge the remote store returns after persisting a weight.

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};
use crate::node::{Attributes, Position};

/// A node as delivered by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    /// Initial position, if the store remembers one. Used as a warm start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl NodeRecord {
    pub fn new(id: impl Into<NodeId>) -> Self {
        NodeRecord {
            id: id.into(),
            position: None,
            attributes: Attributes::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }
}

/// An edge as delivered by (or returned from) the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl EdgeRecord {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        weight: f64,
    ) -> Self {
        EdgeRecord {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            weight,
            attributes: Attributes::new(),
        }
    }
}

/// A complete graph: the input of [`Graph::load`](crate::graph::Graph::load).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphPayload {
    pub fn new(nodes: Vec<NodeRecord>, edges: Vec<EdgeRecord>) -> Self {
        GraphPayload { nodes, edges }
    }

    /// Finds an edge record by id.
    pub fn edge(&self, id: &EdgeId) -> Option<&EdgeRecord> {
        self.edges.iter().find(|e| &e.id == id)
    }

    /// Finds an edge record by id, mutably.
    pub fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut EdgeRecord> {
        self.edges.iter_mut().find(|e| &e.id == id)
    }
}
