//! Property tests for layout termination and numeric safety.

use proptest::prelude::*;

use forcegraph_core::{EdgeRecord, Graph, GraphPayload, NodeRecord, Position};
use forcegraph_layout::{LayoutConfig, LayoutEngine, Placement, POSITION_BOUND};

fn weight() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        0.0..10.0f64,
        1e6..1e300f64,
    ]
}

fn graph_strategy() -> impl Strategy<Value = GraphPayload> {
    (1usize..=20).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n, weight()), 0..40).prop_map(move |links| {
            let nodes = (0..n).map(|i| NodeRecord::new(format!("n{}", i))).collect();
            let edges = links
                .into_iter()
                .enumerate()
                .map(|(i, (a, b, w))| {
                    EdgeRecord::new(format!("e{}", i), format!("n{}", a), format!("n{}", b), w)
                })
                .collect();
            GraphPayload::new(nodes, edges)
        })
    })
}

fn coordinate() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(f64::MAX),
        Just(-f64::MAX),
        1e300..1e308f64,
        -1e308..-1e300f64,
        -1e3..1e3f64,
    ]
}

/// The same shapes as `graph_strategy`, with every node placed at a
/// possibly huge but finite coordinate.
fn placed_graph_strategy() -> impl Strategy<Value = GraphPayload> {
    graph_strategy().prop_flat_map(|payload| {
        let n = payload.nodes.len();
        prop::collection::vec((coordinate(), coordinate()), n).prop_map(move |coords| {
            let mut payload = payload.clone();
            for (node, (x, y)) in payload.nodes.iter_mut().zip(coords) {
                node.position = Some(Position::new(x, y));
            }
            payload
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn run_terminates_within_cap_with_finite_positions(
        payload in graph_strategy(),
        seed in any::<u64>(),
        cap in 1usize..300,
    ) {
        let mut graph = Graph::load(payload).unwrap();
        let engine = LayoutEngine::new(LayoutConfig {
            max_iterations: cap,
            placement: Placement::Random { seed },
            ..Default::default()
        })
        .unwrap();

        let report = engine.run(&mut graph).unwrap();

        prop_assert!(report.iterations <= cap);
        prop_assert!(report.max_displacement.is_finite());
        prop_assert!(graph.nodes().all(|n| n.position.is_finite()));
    }

    #[test]
    fn steps_from_coincident_start_stay_finite(payload in graph_strategy()) {
        // Every node starts on the same point: the worst case for 1/d terms.
        let graph = Graph::load(payload).unwrap();
        let engine = LayoutEngine::default();
        let mut state = engine.warm_start(&graph);
        for _ in 0..25 {
            engine.step(&graph, &mut state).unwrap();
        }
        prop_assert!(state.positions().iter().all(Position::is_finite));
    }

    #[test]
    fn same_seed_same_layout(payload in graph_strategy(), seed in any::<u64>()) {
        let engine = LayoutEngine::new(LayoutConfig {
            max_iterations: 40,
            placement: Placement::Random { seed },
            ..Default::default()
        })
        .unwrap();
        let mut first = Graph::load(payload.clone()).unwrap();
        let mut second = Graph::load(payload).unwrap();
        engine.run(&mut first).unwrap();
        engine.run(&mut second).unwrap();
        prop_assert_eq!(first.positions(), second.positions());
    }

    #[test]
    fn extreme_warm_start_settles_to_finite_positions(payload in placed_graph_strategy()) {
        let mut graph = Graph::load(payload).unwrap();
        let engine = LayoutEngine::new(LayoutConfig {
            max_iterations: 60,
            ..Default::default()
        })
        .unwrap();
        let mut state = engine.warm_start(&graph);

        engine.settle(&mut graph, &mut state).unwrap();

        prop_assert!(graph.nodes().all(|n| n.position.is_finite()));
        prop_assert!(state
            .positions()
            .iter()
            .all(|p| p.x.abs() <= POSITION_BOUND && p.y.abs() <= POSITION_BOUND));
    }
}
