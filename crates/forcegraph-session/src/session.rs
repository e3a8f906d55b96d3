//! The edge edit state machine.
//!
//! ```text
//! Idle --select--> Selected --submit--> Pending --resolve(ok)--> Idle
//!                     ^  |                 |
//!                     |  +--clear--> Idle  +--resolve(err) / cancel--> Idle (rolled back)
//!                     +--select (re-target)
//! ```
//!
//! Submitting applies the new weight to the graph immediately and records
//! the previous one. Every submission gets a fresh sequence number; a
//! response whose number is not the one currently pending is stale and is
//! ignored. At most one edit is in flight: `select` and `submit` while
//! pending fail with [`SessionError::SessionBusy`], and only
//! [`EditSession::cancel`] abandons the in-flight edit.
//!
//! The session holds no I/O. It hands out [`PersistRequest`]s and is told the
//! outcome through [`EditSession::resolve`].

use tracing::{debug, info, warn};

use forcegraph_core::{Edge, EdgeId, EdgeRecord, Graph};

use crate::error::SessionError;
use crate::remote::RemoteError;

/// Where the session is in the edit cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Selected(EdgeId),
    Pending {
        edge: EdgeId,
        proposed: f64,
        previous: f64,
        seq: u64,
    },
}

/// A write the caller must send to the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistRequest {
    pub seq: u64,
    pub edge: EdgeId,
    pub weight: f64,
}

/// What `resolve` did with a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The canonical weight is now in the graph.
    Committed { seq: u64, edge: Edge },
    /// The previous weight was restored; `error` says why.
    RolledBack {
        seq: u64,
        restored: f64,
        error: SessionError,
    },
    /// The response did not match the pending edit and was dropped.
    Stale { seq: u64 },
}

/// The edit abandoned by `cancel`.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelledEdit {
    pub seq: u64,
    pub edge: EdgeId,
    pub restored: f64,
}

/// Selection and in-flight edit for one graph.
#[derive(Debug, Clone)]
pub struct EditSession {
    state: SessionState,
    last_seq: u64,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        EditSession {
            state: SessionState::Idle,
            last_seq: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The selected edge, including the one whose edit is in flight.
    pub fn selected(&self) -> Option<&EdgeId> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Selected(edge) | SessionState::Pending { edge, .. } => Some(edge),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SessionState::Pending { .. })
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Selects `edge` for editing, replacing any previous selection.
    ///
    /// An unknown edge leaves the state unchanged.
    pub fn select(&mut self, graph: &Graph, edge: &EdgeId) -> Result<(), SessionError> {
        if let SessionState::Pending { edge: pending, .. } = &self.state {
            return Err(SessionError::SessionBusy {
                edge: pending.clone(),
            });
        }
        if !graph.contains_edge(edge) {
            return Err(SessionError::NotFound { edge: edge.clone() });
        }
        debug!(edge = %edge, "edge selected");
        self.state = SessionState::Selected(edge.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), SessionError> {
        if let SessionState::Pending { edge, .. } = &self.state {
            return Err(SessionError::SessionBusy { edge: edge.clone() });
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Drops the selection after the graph was replaced. The caller cancels
    /// any in-flight edit first.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Applies `proposed` to the selected edge and returns the write to send.
    ///
    /// Nothing changes if the weight is invalid or the edge has disappeared.
    pub fn submit(&mut self, graph: &mut Graph, proposed: f64) -> Result<PersistRequest, SessionError> {
        let edge = match &self.state {
            SessionState::Idle => return Err(SessionError::NoSelection),
            SessionState::Pending { edge, .. } => {
                return Err(SessionError::SessionBusy { edge: edge.clone() })
            }
            SessionState::Selected(edge) => edge.clone(),
        };

        let previous = graph.edge(&edge)?.weight;
        graph.set_edge_weight(&edge, proposed)?;

        self.last_seq += 1;
        let seq = self.last_seq;
        info!(seq, edge = %edge, previous, proposed, "optimistic edit applied");
        self.state = SessionState::Pending {
            edge: edge.clone(),
            proposed,
            previous,
            seq,
        };
        Ok(PersistRequest {
            seq,
            edge,
            weight: proposed,
        })
    }

    /// Applies the remote store's answer for request `seq`.
    ///
    /// A success adopts the canonical weight. A failure, or a canonical edge
    /// whose id or endpoints differ from the local one, restores the previous
    /// weight. Either way the session returns to `Idle`.
    pub fn resolve(
        &mut self,
        graph: &mut Graph,
        seq: u64,
        result: Result<EdgeRecord, RemoteError>,
    ) -> Resolution {
        let (edge, previous) = match &self.state {
            SessionState::Pending {
                edge,
                previous,
                seq: pending,
                ..
            } if *pending == seq => (edge.clone(), *previous),
            _ => {
                warn!(seq, "ignoring stale persistence response");
                return Resolution::Stale { seq };
            }
        };
        self.state = SessionState::Idle;

        let error = match result {
            Ok(canonical) => match commit(graph, &edge, &canonical) {
                Ok(committed) => {
                    info!(seq, edge = %edge, weight = committed.weight, "edit committed");
                    return Resolution::Committed {
                        seq,
                        edge: committed,
                    };
                }
                Err(reason) => SessionError::RemoteRejected {
                    edge: edge.clone(),
                    reason,
                },
            },
            Err(RemoteError::Rejected { reason }) => SessionError::RemoteRejected {
                edge: edge.clone(),
                reason,
            },
            Err(RemoteError::Transport { reason }) => SessionError::RemoteUnreachable {
                edge: edge.clone(),
                reason,
            },
        };

        rollback(graph, &edge, previous);
        warn!(seq, restored = previous, error = %error, "edit rolled back");
        Resolution::RolledBack {
            seq,
            restored: previous,
            error,
        }
    }

    /// Abandons the in-flight edit and restores its previous weight. Any
    /// later response for it is stale. Returns `None` if nothing was pending.
    pub fn cancel(&mut self, graph: &mut Graph) -> Option<CancelledEdit> {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Pending {
                edge,
                previous,
                seq,
                ..
            } => {
                rollback(graph, &edge, previous);
                info!(seq, edge = %edge, restored = previous, "edit cancelled");
                Some(CancelledEdit {
                    seq,
                    edge,
                    restored: previous,
                })
            }
            other => {
                self.state = other;
                None
            }
        }
    }
}

fn commit(graph: &mut Graph, edge: &EdgeId, canonical: &EdgeRecord) -> Result<Edge, String> {
    let local = graph.edge(edge).map_err(|err| err.to_string())?;
    if !local.same_link(&canonical.id, &canonical.source, &canonical.target) {
        return Err(format!(
            "canonical edge {} ({} -> {}) does not match local edge {} ({} -> {})",
            canonical.id, canonical.source, canonical.target, local.id, local.source, local.target
        ));
    }
    graph
        .set_edge_weight(edge, canonical.weight)
        .map_err(|err| err.to_string())
}

fn rollback(graph: &mut Graph, edge: &EdgeId, previous: f64) {
    // The previous weight was valid when recorded; only a vanished edge fails.
    if let Err(err) = graph.set_edge_weight(edge, previous) {
        warn!(edge = %edge, error = %err, "rollback skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forcegraph_core::{GraphPayload, NodeRecord};

    fn graph() -> Graph {
        Graph::load(GraphPayload::new(
            vec![NodeRecord::new("a"), NodeRecord::new("b"), NodeRecord::new("c")],
            vec![
                EdgeRecord::new("a-b", "a", "b", 2.0),
                EdgeRecord::new("b-c", "b", "c", 1.0),
            ],
        ))
        .unwrap()
    }

    fn ab() -> EdgeId {
        EdgeId::from("a-b")
    }

    fn weight(graph: &Graph, id: &str) -> f64 {
        graph.edge(&EdgeId::from(id)).unwrap().weight
    }

    #[test]
    fn select_unknown_edge_keeps_state() {
        let graph = graph();
        let mut session = EditSession::new();
        let missing = EdgeId::from("a-c");
        assert_eq!(
            session.select(&graph, &missing),
            Err(SessionError::NotFound {
                edge: missing.clone()
            })
        );
        assert_eq!(session.state(), &SessionState::Idle);

        session.select(&graph, &ab()).unwrap();
        assert!(session.select(&graph, &missing).is_err());
        assert_eq!(session.state(), &SessionState::Selected(ab()));
    }

    #[test]
    fn submit_without_selection_fails() {
        let mut graph = graph();
        let mut session = EditSession::new();
        assert_eq!(session.submit(&mut graph, 3.0), Err(SessionError::NoSelection));
    }

    #[test]
    fn submit_applies_weight_optimistically() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        let request = session.submit(&mut graph, 5.0).unwrap();

        assert_eq!(request.edge, ab());
        assert_eq!(request.weight, 5.0);
        assert_eq!(weight(&graph, "a-b"), 5.0);
        assert_eq!(
            session.state(),
            &SessionState::Pending {
                edge: ab(),
                proposed: 5.0,
                previous: 2.0,
                seq: request.seq
            }
        );
    }

    #[test]
    fn invalid_weight_leaves_graph_and_state_alone() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = session.submit(&mut graph, bad).unwrap_err();
            assert!(matches!(err, SessionError::InvalidWeight { .. }));
        }
        assert_eq!(weight(&graph, "a-b"), 2.0);
        assert_eq!(session.state(), &SessionState::Selected(ab()));
    }

    #[test]
    fn success_adopts_canonical_weight() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        let request = session.submit(&mut graph, 0.333).unwrap();

        let canonical = EdgeRecord::new("a-b", "a", "b", 0.3);
        let resolution = session.resolve(&mut graph, request.seq, Ok(canonical));

        assert!(matches!(resolution, Resolution::Committed { ref edge, .. } if edge.weight == 0.3));
        assert_eq!(weight(&graph, "a-b"), 0.3);
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn rejection_restores_previous_weight() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        let request = session.submit(&mut graph, 5.0).unwrap();

        let resolution = session.resolve(
            &mut graph,
            request.seq,
            Err(RemoteError::Rejected {
                reason: "too heavy".into(),
            }),
        );

        assert_eq!(
            resolution,
            Resolution::RolledBack {
                seq: request.seq,
                restored: 2.0,
                error: SessionError::RemoteRejected {
                    edge: ab(),
                    reason: "too heavy".into()
                },
            }
        );
        assert_eq!(weight(&graph, "a-b"), 2.0);
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn transport_failure_is_unreachable() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        let request = session.submit(&mut graph, 5.0).unwrap();

        let resolution = session.resolve(
            &mut graph,
            request.seq,
            Err(RemoteError::Transport {
                reason: "timed out".into(),
            }),
        );
        match resolution {
            Resolution::RolledBack { error, .. } => assert!(error.is_transient()),
            other => panic!("expected rollback, got {:?}", other),
        }
        assert_eq!(weight(&graph, "a-b"), 2.0);
    }

    #[test]
    fn mismatched_canonical_edge_is_rolled_back() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        let request = session.submit(&mut graph, 5.0).unwrap();

        let wrong = EdgeRecord::new("a-b", "b", "a", 5.0);
        let resolution = session.resolve(&mut graph, request.seq, Ok(wrong));

        assert!(matches!(
            resolution,
            Resolution::RolledBack {
                error: SessionError::RemoteRejected { .. },
                ..
            }
        ));
        assert_eq!(weight(&graph, "a-b"), 2.0);
    }

    #[test]
    fn busy_while_pending() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        session.submit(&mut graph, 5.0).unwrap();

        let busy = SessionError::SessionBusy { edge: ab() };
        assert_eq!(session.submit(&mut graph, 6.0), Err(busy.clone()));
        assert_eq!(session.select(&graph, &EdgeId::from("b-c")), Err(busy.clone()));
        assert_eq!(session.clear_selection(), Err(busy));
        assert_eq!(weight(&graph, "a-b"), 5.0);
    }

    #[test]
    fn cancelled_edit_ignores_late_response() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        let first = session.submit(&mut graph, 5.0).unwrap();

        let cancelled = session.cancel(&mut graph).unwrap();
        assert_eq!(cancelled.seq, first.seq);
        assert_eq!(cancelled.restored, 2.0);
        assert_eq!(weight(&graph, "a-b"), 2.0);

        session.select(&graph, &ab()).unwrap();
        let second = session.submit(&mut graph, 7.0).unwrap();
        assert!(second.seq > first.seq);

        // The abandoned request answers after the new one was issued.
        let late = EdgeRecord::new("a-b", "a", "b", 5.0);
        assert_eq!(
            session.resolve(&mut graph, first.seq, Ok(late)),
            Resolution::Stale { seq: first.seq }
        );
        assert_eq!(weight(&graph, "a-b"), 7.0);
        assert!(session.is_pending());

        let fresh = EdgeRecord::new("a-b", "a", "b", 7.0);
        assert!(matches!(
            session.resolve(&mut graph, second.seq, Ok(fresh)),
            Resolution::Committed { .. }
        ));
    }

    #[test]
    fn cancel_without_pending_keeps_selection() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        assert!(session.cancel(&mut graph).is_none());
        assert_eq!(session.state(), &SessionState::Selected(ab()));
    }

    #[test]
    fn response_when_idle_is_stale() {
        let mut graph = graph();
        let mut session = EditSession::new();
        let record = EdgeRecord::new("a-b", "a", "b", 9.0);
        assert_eq!(
            session.resolve(&mut graph, 1, Ok(record)),
            Resolution::Stale { seq: 1 }
        );
        assert_eq!(weight(&graph, "a-b"), 2.0);
    }

    #[test]
    fn edits_leave_other_edges_untouched() {
        let mut graph = graph();
        let mut session = EditSession::new();
        session.select(&graph, &ab()).unwrap();
        let request = session.submit(&mut graph, 5.0).unwrap();
        session.resolve(
            &mut graph,
            request.seq,
            Err(RemoteError::Rejected { reason: "no".into() }),
        );
        assert_eq!(weight(&graph, "b-c"), 1.0);
    }
}
