//! Stable ID newtypes for graph entities.
//!
//! Ids are assigned by the remote store and are opaque to the core, so both
//! wrap a `String`. They are distinct types so that a `NodeId` cannot be
//! passed where an `EdgeId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Stable edge identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        EdgeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        EdgeId(id.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(id: String) -> Self {
        EdgeId(id)
    }
}
