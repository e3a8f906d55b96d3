//! Events a rendering adapter forwards to the controller.

use serde::{Deserialize, Serialize};

use forcegraph_core::EdgeId;

/// User intent reported by a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterEvent {
    /// The user clicked an edge.
    EdgeSelected { edge: EdgeId },
    /// The user confirmed a new weight for `edge`.
    EditSubmitted { edge: EdgeId, weight: f64 },
    SelectionCleared,
    CancelRequested,
}
