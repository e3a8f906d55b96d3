//! Session error types.
//!
//! [`SessionError`] is what callers of the edit session and controller see.
//! Graph errors are folded in with the same mapping the session contract
//! uses: a missing edge is `NotFound`, a bad weight is `InvalidWeight`.

use thiserror::Error;

use forcegraph_core::{EdgeId, GraphError};
use forcegraph_layout::LayoutError;

/// Errors surfaced by the edit session and the edit controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The referenced edge does not exist in the current graph.
    #[error("edge not found: {edge}")]
    NotFound { edge: EdgeId },

    /// An edit is in flight; retry once it settles.
    #[error("session busy: edit on edge {edge} is still in flight")]
    SessionBusy { edge: EdgeId },

    /// `submit` was called without a selected edge.
    #[error("no edge selected")]
    NoSelection,

    /// `next_outcome` was called with nothing in flight.
    #[error("no edit in flight")]
    NothingPending,

    /// The proposed weight was negative, NaN, or infinite.
    #[error("invalid weight {weight} for edge {edge}")]
    InvalidWeight { edge: EdgeId, weight: f64 },

    /// The remote store refused the change; the optimistic edit was rolled back.
    #[error("remote store rejected edit on {edge}: {reason}")]
    RemoteRejected { edge: EdgeId, reason: String },

    /// The remote store could not be reached or timed out; the optimistic
    /// edit was rolled back. Safe to retry.
    #[error("remote store unreachable for edge {edge}: {reason}")]
    RemoteUnreachable { edge: EdgeId, reason: String },

    /// Fetching the initial graph failed.
    #[error("graph load failed: {reason}")]
    LoadFailed { reason: String },

    /// The controller was created outside a Tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,

    #[error(transparent)]
    Graph(GraphError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl SessionError {
    /// Returns `true` for failures the caller may simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::SessionBusy { .. } | SessionError::RemoteUnreachable { .. }
        )
    }
}

impl From<GraphError> for SessionError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::EdgeNotFound { id } => SessionError::NotFound { edge: id },
            GraphError::InvalidWeight { id, weight } => {
                SessionError::InvalidWeight { edge: id, weight }
            }
            other => SessionError::Graph(other),
        }
    }
}
