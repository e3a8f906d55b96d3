//! Read-only graph snapshots for render adapters.
//!
//! A [`GraphSnapshot`] is an owned copy taken on read, so holding one never
//! blocks further mutation of the store. The edit session decorates it with
//! the current selection and the `pending` flag of an in-flight edge.

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::id::{EdgeId, NodeId};
use crate::node::Node;

/// An edge as seen by a render adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    #[serde(flatten)]
    pub edge: Edge,
    /// `true` while an optimistic weight change on this edge awaits the
    /// remote store.
    pub pending: bool,
}

/// An immutable view of the whole graph at one revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Store revision the snapshot was taken at.
    pub revision: u64,
    /// Topology version (changes only on load).
    pub topology_version: u64,
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<EdgeId>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&EdgeView> {
        self.edges.iter().find(|e| &e.edge.id == id)
    }

    /// Flags `id` as awaiting the remote store. Unknown ids are ignored.
    pub fn mark_pending(&mut self, id: &EdgeId) {
        if let Some(view) = self.edges.iter_mut().find(|e| &e.edge.id == id) {
            view.pending = true;
        }
    }

    pub fn with_selection(mut self, selected: Option<EdgeId>) -> Self {
        self.selected = selected;
        self
    }

    /// Returns the id of the pending edge, if any.
    pub fn pending_edge(&self) -> Option<&EdgeId> {
        self.edges.iter().find(|e| e.pending).map(|e| &e.edge.id)
    }
}
