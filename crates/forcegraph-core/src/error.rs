//! Core error types for forcegraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of the graph store: stale references and malformed input.

use thiserror::Error;

use crate::id::{EdgeId, NodeId};

/// Errors produced by the graph store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A node id was not found in the graph.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// An edge id was not found in the graph.
    #[error("edge not found: {id}")]
    EdgeNotFound { id: EdgeId },

    /// A load was rejected: dangling endpoint or colliding id.
    #[error("invalid topology: {reason}")]
    InvalidTopology { reason: String },

    /// A weight was negative, NaN, or infinite.
    #[error("invalid weight {weight} for edge {id}")]
    InvalidWeight { id: EdgeId, weight: f64 },

    /// A position had a non-finite coordinate.
    #[error("invalid position for node {id}")]
    InvalidPosition { id: NodeId },

    /// A position batch did not cover every node exactly once.
    #[error("position count mismatch: expected {expected}, found {found}")]
    PositionCountMismatch { expected: usize, found: usize },
}

impl GraphError {
    /// Returns `true` for the not-found variants (stale or bogus references).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::NodeNotFound { .. } | GraphError::EdgeNotFound { .. }
        )
    }
}
