//! In-process [`RemoteStore`] used by the CLI and by tests.
//!
//! The store keeps its own copy of the graph payload and applies a small
//! [`StorePolicy`] on every write, so it can stand in for a server that
//! validates or normalizes weights.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use forcegraph_core::{EdgeId, EdgeRecord, GraphPayload};

use crate::remote::{RemoteError, RemoteStore};

/// Server-side rules applied to persisted weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePolicy {
    /// Weights above this are rejected.
    pub max_weight: Option<f64>,
    /// Accepted weights are rounded to this many decimal places.
    pub precision: Option<u32>,
    /// Artificial delay before every response.
    pub latency_ms: u64,
}

impl StorePolicy {
    fn canonical(&self, weight: f64) -> Result<f64, RemoteError> {
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(RemoteError::Rejected {
                reason: format!("weight {} is not a finite non-negative number", weight),
            });
        }
        if let Some(max) = self.max_weight {
            if weight > max {
                return Err(RemoteError::Rejected {
                    reason: format!("weight {} exceeds maximum {}", weight, max),
                });
            }
        }
        Ok(match self.precision {
            Some(places) => {
                let factor = 10f64.powi(places as i32);
                (weight * factor).round() / factor
            }
            None => weight,
        })
    }
}

/// A [`RemoteStore`] backed by a payload held in memory.
pub struct MemoryRemoteStore {
    graph: Mutex<GraphPayload>,
    policy: StorePolicy,
    offline: AtomicBool,
    persist_calls: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new(payload: GraphPayload) -> Self {
        Self::with_policy(payload, StorePolicy::default())
    }

    pub fn with_policy(payload: GraphPayload, policy: StorePolicy) -> Self {
        MemoryRemoteStore {
            graph: Mutex::new(payload),
            policy,
            offline: AtomicBool::new(false),
            persist_calls: AtomicUsize::new(0),
        }
    }

    /// While offline every call fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `persist_edge_weight` calls received so far.
    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    /// The stored copy of one edge.
    pub async fn edge(&self, id: &EdgeId) -> Option<EdgeRecord> {
        self.graph.lock().await.edge(id).cloned()
    }

    async fn delay(&self) -> Result<(), RemoteError> {
        if self.policy.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.policy.latency_ms)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport {
                reason: "store offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch_graph(&self) -> Result<GraphPayload, RemoteError> {
        self.delay().await?;
        Ok(self.graph.lock().await.clone())
    }

    async fn persist_edge_weight(
        &self,
        edge: &EdgeId,
        weight: f64,
    ) -> Result<EdgeRecord, RemoteError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await?;
        let canonical = self.policy.canonical(weight)?;

        let mut graph = self.graph.lock().await;
        let record = graph.edge_mut(edge).ok_or_else(|| RemoteError::Rejected {
            reason: format!("unknown edge {}", edge),
        })?;
        record.weight = canonical;
        debug!(edge = %edge, weight, canonical, "stored edge weight");
        Ok(record.clone())
    }
}
