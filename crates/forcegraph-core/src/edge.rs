//! Weighted edges.
//!
//! An [`Edge`] joins an ordered pair of nodes and carries a weight. The weight
//! is the only field the edit session may change; endpoints are fixed for the
//! lifetime of a load.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::id::{EdgeId, NodeId};
use crate::node::Attributes;

/// An edge in the graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Edge {
    /// Returns `true` if both endpoints are the same node.
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }

    /// Returns `true` if `id`, `source` and `target` all match this edge.
    pub fn same_link(&self, id: &EdgeId, source: &NodeId, target: &NodeId) -> bool {
        &self.id == id && &self.source == source && &self.target == target
    }
}

/// Validates an edge weight: finite and non-negative.
pub fn check_weight(id: &EdgeId, weight: f64) -> Result<(), GraphError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidWeight {
            id: id.clone(),
            weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_zero_and_positive_weights() {
        let id = EdgeId::from("e1");
        assert!(check_weight(&id, 0.0).is_ok());
        assert!(check_weight(&id, 2.5).is_ok());
        assert!(check_weight(&id, 1e300).is_ok());
    }

    #[test]
    fn rejects_negative_and_non_finite_weights() {
        let id = EdgeId::from("e1");
        for bad in [-0.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = check_weight(&id, bad).unwrap_err();
            assert!(matches!(err, GraphError::InvalidWeight { .. }), "{bad}");
        }
    }

    #[test]
    fn loop_detection() {
        let edge = Edge {
            id: EdgeId::from("l"),
            source: NodeId::from("a"),
            target: NodeId::from("a"),
            weight: 1.0,
            attributes: Attributes::new(),
        };
        assert!(edge.is_loop());
    }
}
