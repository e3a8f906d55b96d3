//! The remote store contract.
//!
//! The session never talks to a transport directly. Everything that leaves
//! the process goes through [`RemoteStore`], whose calls are asynchronous and
//! are always wrapped in a caller-side timeout.

use async_trait::async_trait;
use thiserror::Error;

use forcegraph_core::{EdgeId, EdgeRecord, GraphPayload};

/// Failures reported by a remote store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// Server-side validation failed. Do not retry.
    #[error("rejected: {reason}")]
    Rejected { reason: String },

    /// The request did not complete (network, timeout). May be retried.
    #[error("transport failure: {reason}")]
    Transport { reason: String },
}

impl RemoteError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Transport { .. })
    }
}

/// Persistence backend for graphs and edge weights.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the whole graph for an initial load.
    async fn fetch_graph(&self) -> Result<GraphPayload, RemoteError>;

    /// Persists a new weight and returns the authoritative edge. The returned
    /// weight may differ from `weight` if the store normalizes it.
    async fn persist_edge_weight(
        &self,
        edge: &EdgeId,
        weight: f64,
    ) -> Result<EdgeRecord, RemoteError>;
}
