//! Graph: the canonical in-memory store of nodes and weighted edges.
//!
//! [`Graph`] is the single owner of graph state. Topology lives in a petgraph
//! `StableGraph`; two `IndexMap`s resolve stable ids to petgraph indices and
//! keep load order, which the layout engine relies on for reproducible
//! placement.
//!
//! # Ownership split
//!
//! Two writers touch a loaded graph, each confined to its own field:
//! - the layout engine writes node positions via [`Graph::apply_positions`];
//! - the edit session writes edge weights via [`Graph::set_edge_weight`].
//!
//! Anything else (adding or removing nodes/edges) only happens through a
//! wholesale [`Graph::replace`], which bumps the topology version so that
//! stale layout state can be detected.

use indexmap::IndexMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::unionfind::UnionFind;
use petgraph::Directed;

use crate::edge::{check_weight, Edge};
use crate::error::GraphError;
use crate::id::{EdgeId, NodeId};
use crate::node::{Node, Position};
use crate::payload::GraphPayload;
use crate::snapshot::{EdgeView, GraphSnapshot};

/// The graph store.
///
/// Node slots (see [`Graph::node_slot`]) are dense `0..node_count()` in load
/// order. The underlying `StableGraph` is rebuilt from scratch on every load
/// and never has nodes removed, so a node's slot equals its `NodeIndex`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    topology: StableGraph<Node, Edge, Directed, u32>,
    nodes: IndexMap<NodeId, NodeIndex<u32>>,
    edges: IndexMap<EdgeId, EdgeIndex<u32>>,
    /// Incremented on every load.
    topology_version: u64,
    /// Incremented on every mutation, including loads.
    revision: u64,
}

impl Graph {
    /// Builds a graph from a payload.
    ///
    /// Fails with [`GraphError::InvalidTopology`] if a node or edge id repeats
    /// or an edge references a missing node, and with
    /// [`GraphError::InvalidWeight`] / [`GraphError::InvalidPosition`] for
    /// malformed values. Nothing is partially applied.
    pub fn load(payload: GraphPayload) -> Result<Graph, GraphError> {
        let mut topology = StableGraph::<Node, Edge, Directed, u32>::with_capacity(
            payload.nodes.len(),
            payload.edges.len(),
        );
        let mut nodes = IndexMap::with_capacity(payload.nodes.len());
        let mut edges = IndexMap::with_capacity(payload.edges.len());

        for record in payload.nodes {
            if nodes.contains_key(&record.id) {
                return Err(GraphError::InvalidTopology {
                    reason: format!("duplicate node id '{}'", record.id),
                });
            }
            let position = record.position.unwrap_or_default();
            if !position.is_finite() {
                return Err(GraphError::InvalidPosition { id: record.id });
            }
            let idx = topology.add_node(Node {
                id: record.id.clone(),
                position,
                attributes: record.attributes,
            });
            nodes.insert(record.id, idx);
        }

        for record in payload.edges {
            if edges.contains_key(&record.id) {
                return Err(GraphError::InvalidTopology {
                    reason: format!("duplicate edge id '{}'", record.id),
                });
            }
            let source = *nodes
                .get(&record.source)
                .ok_or_else(|| dangling(&record.id, &record.source))?;
            let target = *nodes
                .get(&record.target)
                .ok_or_else(|| dangling(&record.id, &record.target))?;
            check_weight(&record.id, record.weight)?;

            let idx = topology.add_edge(
                source,
                target,
                Edge {
                    id: record.id.clone(),
                    source: record.source,
                    target: record.target,
                    weight: record.weight,
                    attributes: record.attributes,
                },
            );
            edges.insert(record.id, idx);
        }

        Ok(Graph {
            topology,
            nodes,
            edges,
            topology_version: 1,
            revision: 1,
        })
    }

    /// Replaces all state with a freshly loaded payload.
    ///
    /// On error the current graph is left untouched.
    pub fn replace(&mut self, payload: GraphPayload) -> Result<(), GraphError> {
        let fresh = Graph::load(payload)?;
        self.install(fresh);
        Ok(())
    }

    /// Swaps in an already validated graph, continuing this graph's
    /// `topology_version` and `revision` sequences.
    pub fn install(&mut self, mut fresh: Graph) {
        fresh.topology_version = self.topology_version + 1;
        fresh.revision = self.revision + 1;
        *self = fresh;
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn topology_version(&self) -> u64 {
        self.topology_version
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &NodeId) -> Result<&Node, GraphError> {
        self.nodes
            .get(id)
            .map(|idx| &self.topology[*idx])
            .ok_or_else(|| GraphError::NodeNotFound { id: id.clone() })
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: &EdgeId) -> Result<&Edge, GraphError> {
        self.edges
            .get(id)
            .map(|idx| &self.topology[*idx])
            .ok_or_else(|| GraphError::EdgeNotFound { id: id.clone() })
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Nodes in load order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().map(move |idx| &self.topology[*idx])
    }

    /// Edges in load order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values().map(move |idx| &self.topology[*idx])
    }

    // -----------------------------------------------------------------------
    // Topology helpers for the layout engine
    // -----------------------------------------------------------------------

    /// Dense slot of a node, in load order.
    pub fn node_slot(&self, id: &NodeId) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    /// Current node positions, indexed by slot.
    pub fn positions(&self) -> Vec<Position> {
        self.nodes().map(|n| n.position).collect()
    }

    /// Every edge except self-loops as `(source_slot, target_slot, weight)`.
    pub fn weighted_links(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.topology.edge_indices().filter_map(move |idx| {
            let edge = &self.topology[idx];
            if edge.is_loop() {
                return None;
            }
            let (source, target) = self.topology.edge_endpoints(idx)?;
            Some((source.index(), target.index(), edge.weight))
        })
    }

    /// Number of connected components, ignoring edge direction.
    pub fn component_count(&self) -> usize {
        let mut sets = UnionFind::<usize>::new(self.node_count());
        for (a, b, _) in self.weighted_links() {
            sets.union(a, b);
        }
        let mut labels = sets.into_labeling();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Sets an edge's weight in place and returns the updated edge.
    pub fn set_edge_weight(&mut self, id: &EdgeId, weight: f64) -> Result<Edge, GraphError> {
        let idx = *self
            .edges
            .get(id)
            .ok_or_else(|| GraphError::EdgeNotFound { id: id.clone() })?;
        check_weight(id, weight)?;

        let edge = &mut self.topology[idx];
        edge.weight = weight;
        let updated = edge.clone();
        self.revision += 1;
        Ok(updated)
    }

    /// Writes a full set of slot-ordered positions back into the nodes.
    ///
    /// All positions are validated before any is written.
    pub fn apply_positions(&mut self, positions: &[Position]) -> Result<(), GraphError> {
        if positions.len() != self.nodes.len() {
            return Err(GraphError::PositionCountMismatch {
                expected: self.nodes.len(),
                found: positions.len(),
            });
        }
        if let Some((id, _)) = self.nodes.keys().zip(positions).find(|(_, p)| !p.is_finite()) {
            return Err(GraphError::InvalidPosition { id: id.clone() });
        }

        for (idx, position) in self.nodes.values().zip(positions) {
            self.topology[*idx].position = *position;
        }
        self.revision += 1;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Copies the current state into an owned snapshot.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            revision: self.revision,
            topology_version: self.topology_version,
            nodes: self.nodes().cloned().collect(),
            edges: self
                .edges()
                .map(|edge| EdgeView {
                    edge: edge.clone(),
                    pending: false,
                })
                .collect(),
            selected: None,
        }
    }
}

fn dangling(edge: &EdgeId, node: &NodeId) -> GraphError {
    GraphError::InvalidTopology {
        reason: format!("edge '{}' references missing node '{}'", edge, node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{EdgeRecord, NodeRecord};

    fn triangle() -> GraphPayload {
        GraphPayload::new(
            vec![NodeRecord::new("a"), NodeRecord::new("b"), NodeRecord::new("c")],
            vec![
                EdgeRecord::new("e1", "a", "b", 2.0),
                EdgeRecord::new("e2", "b", "c", 1.0),
                EdgeRecord::new("e3", "c", "a", 0.5),
            ],
        )
    }

    #[test]
    fn load_resolves_every_endpoint() {
        let graph = Graph::load(triangle()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        for edge in graph.edges() {
            assert!(graph.node(&edge.source).is_ok());
            assert!(graph.node(&edge.target).is_ok());
        }
    }

    #[test]
    fn load_rejects_dangling_edge() {
        let mut payload = triangle();
        payload.edges.push(EdgeRecord::new("e4", "a", "zz", 1.0));
        let err = Graph::load(payload).unwrap_err();
        assert!(matches!(err, GraphError::InvalidTopology { .. }));
        assert!(err.to_string().contains("zz"));
    }

    #[test]
    fn load_rejects_duplicate_node_id() {
        let mut payload = triangle();
        payload.nodes.push(NodeRecord::new("a"));
        assert!(matches!(
            Graph::load(payload),
            Err(GraphError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn load_rejects_duplicate_edge_id() {
        let mut payload = triangle();
        payload.edges.push(EdgeRecord::new("e1", "b", "a", 1.0));
        assert!(matches!(
            Graph::load(payload),
            Err(GraphError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn load_rejects_invalid_weight() {
        let mut payload = triangle();
        payload.edges[0].weight = -1.0;
        assert!(matches!(
            Graph::load(payload),
            Err(GraphError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn failed_replace_keeps_previous_graph() {
        let mut graph = Graph::load(triangle()).unwrap();
        let before = graph.snapshot();

        let mut bad = triangle();
        bad.edges.push(EdgeRecord::new("e9", "nope", "a", 1.0));
        assert!(graph.replace(bad).is_err());

        assert_eq!(graph.snapshot(), before);
        assert_eq!(graph.topology_version(), 1);
    }

    #[test]
    fn replace_bumps_topology_version() {
        let mut graph = Graph::load(triangle()).unwrap();
        graph.replace(triangle()).unwrap();
        assert_eq!(graph.topology_version(), 2);
    }

    #[test]
    fn get_edge_not_found() {
        let graph = Graph::load(triangle()).unwrap();
        let err = graph.edge(&EdgeId::from("missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn set_edge_weight_updates_in_place() {
        let mut graph = Graph::load(triangle()).unwrap();
        let rev = graph.revision();
        let updated = graph.set_edge_weight(&EdgeId::from("e1"), 5.0).unwrap();
        assert_eq!(updated.weight, 5.0);
        assert_eq!(graph.edge(&EdgeId::from("e1")).unwrap().weight, 5.0);
        assert_eq!(graph.revision(), rev + 1);
        // Weight changes never touch topology.
        assert_eq!(graph.topology_version(), 1);
    }

    #[test]
    fn set_edge_weight_rejects_bad_values() {
        let mut graph = Graph::load(triangle()).unwrap();
        let id = EdgeId::from("e1");
        assert!(matches!(
            graph.set_edge_weight(&id, f64::NAN),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert!(matches!(
            graph.set_edge_weight(&id, -3.0),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert_eq!(graph.edge(&id).unwrap().weight, 2.0);
    }

    #[test]
    fn set_edge_weight_unknown_edge() {
        let mut graph = Graph::load(triangle()).unwrap();
        assert!(matches!(
            graph.set_edge_weight(&EdgeId::from("x"), 1.0),
            Err(GraphError::EdgeNotFound { .. })
        ));
    }

    #[test]
    fn weighted_links_use_load_order_slots() {
        let graph = Graph::load(triangle()).unwrap();
        let links: Vec<_> = graph.weighted_links().collect();
        assert_eq!(links, vec![(0, 1, 2.0), (1, 2, 1.0), (2, 0, 0.5)]);
        assert_eq!(graph.node_slot(&NodeId::from("c")), Some(2));
    }

    #[test]
    fn weighted_links_skip_self_loops() {
        let mut payload = triangle();
        payload.edges.push(EdgeRecord::new("loop", "b", "b", 3.0));
        let graph = Graph::load(payload).unwrap();
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.weighted_links().count(), 3);
        assert!(graph.weighted_links().all(|(a, b, _)| a != b));
    }

    #[test]
    fn install_continues_version_sequence() {
        let mut graph = Graph::load(triangle()).unwrap();
        graph.replace(triangle()).unwrap();
        let fresh = Graph::load(triangle()).unwrap();
        graph.install(fresh);
        assert_eq!(graph.topology_version(), 3);
        assert_eq!(graph.revision(), 3);
    }

    #[test]
    fn component_count_ignores_direction() {
        let payload = GraphPayload::new(
            vec![
                NodeRecord::new("a"),
                NodeRecord::new("b"),
                NodeRecord::new("c"),
                NodeRecord::new("d"),
            ],
            vec![EdgeRecord::new("e1", "b", "a", 1.0)],
        );
        let graph = Graph::load(payload).unwrap();
        assert_eq!(graph.component_count(), 3);
    }

    #[test]
    fn apply_positions_validates_before_writing() {
        let mut graph = Graph::load(triangle()).unwrap();
        let err = graph
            .apply_positions(&[
                Position::new(1.0, 1.0),
                Position::new(f64::NAN, 0.0),
                Position::new(2.0, 2.0),
            ])
            .unwrap_err();
        assert_eq!(err, GraphError::InvalidPosition { id: NodeId::from("b") });
        assert!(graph.nodes().all(|n| n.position == Position::ORIGIN));

        assert!(matches!(
            graph.apply_positions(&[Position::ORIGIN]),
            Err(GraphError::PositionCountMismatch { expected: 3, found: 1 })
        ));

        graph
            .apply_positions(&[
                Position::new(1.0, 1.0),
                Position::new(2.0, 0.0),
                Position::new(3.0, 3.0),
            ])
            .unwrap();
        assert_eq!(
            graph.node(&NodeId::from("b")).unwrap().position,
            Position::new(2.0, 0.0)
        );
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let mut graph = Graph::load(triangle()).unwrap();
        let snap = graph.snapshot();
        graph.set_edge_weight(&EdgeId::from("e2"), 9.0).unwrap();

        assert_eq!(snap.edge(&EdgeId::from("e2")).unwrap().edge.weight, 1.0);
        assert!(snap.edges.iter().all(|e| !e.pending));
        assert_eq!(graph.snapshot().edge(&EdgeId::from("e2")).unwrap().edge.weight, 9.0);
    }

    #[test]
    fn initial_positions_are_carried_from_records() {
        let payload = GraphPayload::new(
            vec![NodeRecord::new("a").at(3.0, -1.0), NodeRecord::new("b")],
            vec![],
        );
        let graph = Graph::load(payload).unwrap();
        assert_eq!(graph.positions(), vec![Position::new(3.0, -1.0), Position::ORIGIN]);
    }
}
