//! The edit controller: graph, layout, session and remote store wired together.
//!
//! [`EditController`] owns the authoritative [`Graph`] and is the only thing
//! that mutates it. Remote writes run as spawned Tokio tasks bounded by
//! [`SessionConfig::persist_timeout`]; their results come back over an mpsc
//! channel and are applied on the controller's own task by
//! [`EditController::next_outcome`] or [`EditController::poll_outcomes`]. Renderers
//! observe the graph through immutable [`GraphSnapshot`]s published on a
//! `watch` channel after every change.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use forcegraph_core::{Edge, EdgeId, EdgeRecord, Graph, GraphPayload, GraphSnapshot};
use forcegraph_layout::{LayoutEngine, LayoutState, StepOutcome};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::AdapterEvent;
use crate::remote::{RemoteError, RemoteStore};
use crate::session::{CancelledEdit, EditSession, PersistRequest, Resolution, SessionState};

/// A finished remote write, tagged with the request it answers.
#[derive(Debug)]
struct Completion {
    seq: u64,
    result: Result<EdgeRecord, RemoteError>,
}

/// Reports the outcome of one remote write exactly once. If the task ends
/// without an answer (aborted, or the store panicked) the drop reports a
/// transport failure, so a pending edit always resolves.
struct CompletionGuard {
    seq: u64,
    tx: Option<mpsc::UnboundedSender<Completion>>,
}

impl CompletionGuard {
    fn complete(mut self, result: Result<EdgeRecord, RemoteError>) {
        self.send(result);
    }

    fn send(&mut self, result: Result<EdgeRecord, RemoteError>) {
        if let Some(tx) = self.tx.take() {
            // The receiver lives as long as the controller.
            let _ = tx.send(Completion {
                seq: self.seq,
                result,
            });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.send(Err(RemoteError::Transport {
            reason: "remote write ended without a response".to_string(),
        }));
    }
}

#[derive(Debug)]
struct InFlight {
    seq: u64,
    task: JoinHandle<()>,
}

/// Drives one interactive editing session against a remote store.
pub struct EditController {
    graph: Graph,
    session: EditSession,
    layout: LayoutEngine,
    layout_state: Option<LayoutState>,
    remote: Arc<dyn RemoteStore>,
    config: SessionConfig,
    runtime: Handle,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: Option<InFlight>,
    snapshots: watch::Sender<Arc<GraphSnapshot>>,
}

impl EditController {
    /// Creates a controller with an empty graph.
    ///
    /// Must be called from within a Tokio runtime; remote writes are spawned
    /// onto it.
    pub fn new(remote: Arc<dyn RemoteStore>, config: SessionConfig) -> Result<Self, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        let layout = LayoutEngine::new(config.layout.clone())?;
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(Arc::new(GraphSnapshot::default()));
        Ok(EditController {
            graph: Graph::default(),
            session: EditSession::new(),
            layout,
            layout_state: None,
            remote,
            config,
            runtime,
            completions_tx,
            completions_rx,
            in_flight: None,
            snapshots,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn session_state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Subscribes to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GraphSnapshot>> {
        self.snapshots.subscribe()
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Fetches the graph from the remote store and loads it.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        let limit = self.config.fetch_timeout();
        let payload = match tokio::time::timeout(limit, self.remote.fetch_graph()).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(err)) => {
                return Err(SessionError::LoadFailed {
                    reason: err.to_string(),
                })
            }
            Err(_) => {
                return Err(SessionError::LoadFailed {
                    reason: format!("fetch timed out after {} ms", limit.as_millis()),
                })
            }
        };
        self.load_payload(payload)
    }

    /// Replaces the graph with `payload`.
    ///
    /// The payload is validated first; a rejected payload changes nothing.
    /// Otherwise any in-flight edit is cancelled and the selection is
    /// dropped. If every node carries a position the layout warm-starts from
    /// them; otherwise nodes are placed afresh.
    pub fn load_payload(&mut self, payload: GraphPayload) -> Result<(), SessionError> {
        let placed = !payload.nodes.is_empty() && payload.nodes.iter().all(|n| n.position.is_some());
        let fresh = Graph::load(payload)?;

        self.abort_in_flight();
        self.session.cancel(&mut self.graph);
        self.graph.install(fresh);
        self.session.reset();

        let state = if placed {
            self.layout.warm_start(&self.graph)
        } else {
            self.layout.initialize(&self.graph)
        };
        self.graph.apply_positions(state.positions())?;
        self.layout_state = Some(state);

        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            topology_version = self.graph.topology_version(),
            warm = placed,
            "graph loaded"
        );
        self.publish();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn select(&mut self, edge: &EdgeId) -> Result<(), SessionError> {
        self.session.select(&self.graph, edge)?;
        self.publish();
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), SessionError> {
        self.session.clear_selection()?;
        self.publish();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Applies `weight` to the selected edge optimistically and starts the
    /// remote write. Returns the request's sequence number.
    pub fn submit(&mut self, weight: f64) -> Result<u64, SessionError> {
        let PersistRequest { seq, edge, weight } = self.session.submit(&mut self.graph, weight)?;

        let remote = Arc::clone(&self.remote);
        let guard = CompletionGuard {
            seq,
            tx: Some(self.completions_tx.clone()),
        };
        let limit = self.config.persist_timeout();
        debug!(seq, edge = %edge, weight, "persisting edge weight");
        let task = self.runtime.spawn(async move {
            let result = match tokio::time::timeout(limit, remote.persist_edge_weight(&edge, weight)).await {
                Ok(result) => result,
                Err(_) => Err(RemoteError::Transport {
                    reason: format!("timed out after {} ms", limit.as_millis()),
                }),
            };
            guard.complete(result);
        });
        self.in_flight = Some(InFlight { seq, task });

        self.rewarm();
        self.publish();
        Ok(seq)
    }

    /// Waits for the in-flight edit to finish.
    ///
    /// Returns the committed canonical edge, or the rollback reason
    /// ([`SessionError::RemoteRejected`] or [`SessionError::RemoteUnreachable`]).
    pub async fn next_outcome(&mut self) -> Result<Edge, SessionError> {
        loop {
            if !self.session.is_pending() {
                return Err(SessionError::NothingPending);
            }
            // Never `None`: the controller holds a sender.
            let Some(completion) = self.completions_rx.recv().await else {
                return Err(SessionError::NothingPending);
            };
            if let Some(outcome) = self.apply_completion(completion) {
                return outcome;
            }
        }
    }

    /// Applies any completions that have already arrived, without waiting.
    /// Returns the outcome of the in-flight edit if it finished.
    pub fn poll_outcomes(&mut self) -> Option<Result<Edge, SessionError>> {
        while let Ok(completion) = self.completions_rx.try_recv() {
            if let Some(outcome) = self.apply_completion(completion) {
                return Some(outcome);
            }
        }
        None
    }

    /// Abandons the in-flight edit: the remote task is aborted, the previous
    /// weight restored, and any response that still arrives is ignored.
    pub fn cancel(&mut self) -> Option<CancelledEdit> {
        self.abort_in_flight();
        let cancelled = self.session.cancel(&mut self.graph)?;
        self.rewarm();
        self.publish();
        Some(cancelled)
    }

    /// Dispatches an adapter event.
    pub fn handle_event(&mut self, event: AdapterEvent) -> Result<(), SessionError> {
        match event {
            AdapterEvent::EdgeSelected { edge } => self.select(&edge),
            AdapterEvent::EditSubmitted { edge, weight } => {
                if self.session.selected() != Some(&edge) {
                    self.select(&edge)?;
                }
                self.submit(weight).map(|_| ())
            }
            AdapterEvent::SelectionCleared => self.clear_selection(),
            AdapterEvent::CancelRequested => {
                self.cancel();
                Ok(())
            }
        }
    }

    fn apply_completion(&mut self, completion: Completion) -> Option<Result<Edge, SessionError>> {
        let Completion { seq, result } = completion;
        match self.session.resolve(&mut self.graph, seq, result) {
            Resolution::Stale { .. } => None,
            Resolution::Committed { edge, .. } => {
                self.finish(seq);
                Some(Ok(edge))
            }
            Resolution::RolledBack { error, .. } => {
                self.finish(seq);
                Some(Err(error))
            }
        }
    }

    fn finish(&mut self, seq: u64) {
        if self.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            self.in_flight = None;
        }
        self.rewarm();
        self.publish();
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(seq = in_flight.seq, "aborting remote write");
            in_flight.task.abort();
        }
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Advances the layout by up to `steps_per_tick` steps and publishes the
    /// new positions. Returns `None` once the layout has settled.
    pub fn tick(&mut self) -> Result<Option<StepOutcome>, SessionError> {
        let topology_version = self.graph.topology_version();
        if self
            .layout_state
            .as_ref()
            .is_some_and(|s| s.topology_version() != topology_version)
        {
            warn!(topology_version, "layout state outlived its topology, reinitializing");
            self.layout_state = None;
        }
        let layout = &self.layout;
        let graph = &self.graph;
        let state = self.layout_state.get_or_insert_with(|| layout.initialize(graph));

        let config = self.layout.config();
        let mut last = None;
        for _ in 0..self.config.steps_per_tick.max(1) {
            if state.iteration() >= config.max_iterations
                || state.last_max_displacement() < config.epsilon
            {
                break;
            }
            let outcome = self.layout.step(&self.graph, state)?;
            last = Some(outcome);
            if outcome.converged {
                break;
            }
        }

        if last.is_some() {
            self.graph.apply_positions(state.positions())?;
            self.publish();
        }
        Ok(last)
    }

    /// Returns `true` once the layout has converged or used its iteration budget.
    pub fn layout_settled(&self) -> bool {
        let config = self.layout.config();
        self.layout_state.as_ref().is_some_and(|s| {
            s.topology_version() == self.graph.topology_version()
                && (s.iteration() >= config.max_iterations
                    || s.last_max_displacement() < config.epsilon)
        })
    }

    /// Restarts the layout from the current positions after a weight change.
    fn rewarm(&mut self) {
        self.layout_state = Some(self.layout.warm_start(&self.graph));
    }

    fn publish(&self) {
        let mut snapshot = self
            .graph
            .snapshot()
            .with_selection(self.session.selected().cloned());
        if let SessionState::Pending { edge, .. } = self.session.state() {
            snapshot.mark_pending(edge);
        }
        self.snapshots.send_replace(Arc::new(snapshot));
    }
}

impl Drop for EditController {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
