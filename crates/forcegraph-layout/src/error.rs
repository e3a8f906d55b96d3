//! Layout error types.

use forcegraph_core::GraphError;
use thiserror::Error;

/// Errors produced by the layout engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A configuration parameter was out of range.
    #[error("invalid layout config: {reason}")]
    InvalidConfig { reason: String },

    /// The layout state was built for a different topology and must be
    /// re-initialized before stepping.
    #[error("stale layout state: graph is at topology version {expected}, state was built for {found}")]
    StaleLayoutState { expected: u64, found: u64 },

    /// Writing positions back into the graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
