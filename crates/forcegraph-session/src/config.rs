//! Controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use forcegraph_layout::LayoutConfig;

/// Timeouts and pacing for an [`EditController`](crate::EditController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on one `persist_edge_weight` call.
    pub persist_timeout_ms: u64,
    /// Upper bound on one `fetch_graph` call.
    pub fetch_timeout_ms: u64,
    /// Layout steps taken per `tick`.
    pub steps_per_tick: usize,
    pub layout: LayoutConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            persist_timeout_ms: 5_000,
            fetch_timeout_ms: 10_000,
            steps_per_tick: 5,
            layout: LayoutConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
