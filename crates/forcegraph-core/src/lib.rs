//! Core graph model for forcegraph.
//!
//! Holds the canonical node/edge store ([`Graph`]), the payload types the
//! remote store speaks ([`GraphPayload`], [`EdgeRecord`]), owned read-only
//! snapshots for render adapters, and edge-list ingestion.

pub mod edge;
pub mod edgelist;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod payload;
pub mod snapshot;

// Re-export commonly used types
pub use edge::Edge;
pub use edgelist::{parse_edge_list, Normalize, ParseError};
pub use error::GraphError;
pub use graph::Graph;
pub use id::{EdgeId, NodeId};
pub use node::{Attributes, Node, Position};
pub use payload::{EdgeRecord, GraphPayload, NodeRecord};
pub use snapshot::{EdgeView, GraphSnapshot};
