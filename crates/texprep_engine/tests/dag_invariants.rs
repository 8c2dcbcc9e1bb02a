// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property tests: rewrites never leave dangling connections or cycles.

use proptest::prelude::*;
use std::collections::HashSet;
use texprep_engine::{ColorSwitchPolicy, EngineConfig, GraphRewriter, ProceduralSpread, Session, SubgraphReplicator};
use texprep_graph::library::{self, create_compositing_registry};
use texprep_graph::{Graph, NodeId, NodeRegistry, Position, PropertyValue};

const LABELS: [&str; 6] = ["Height", "Normal", "Roughness", "Base Color", "Specular Level", "Metallic"];

struct Built {
    graph: Graph,
    transforms: Vec<(NodeId, NodeId, NodeId)>,
}

/// One bitmap → transform → output chain per label, with optional levels taps on the bitmaps
fn build(registry: &NodeRegistry, labels: &[usize], grayscale: &[bool], taps: &[bool]) -> Built {
    let mut graph = Graph::new("prop");
    let mut transforms = Vec::new();
    for (row, &label) in labels.iter().enumerate() {
        let y = row as f32 * 300.0;
        let bitmap = graph.instantiate(registry.get(library::BITMAP).unwrap(), Position::new(0.0, y));
        let transform = graph.instantiate(registry.get(library::TRANSFORM_2D).unwrap(), Position::new(200.0, y));
        let sink = graph.instantiate(registry.get(library::OUTPUT_SINK).unwrap(), Position::new(400.0, y));
        graph
            .set_annotation(sink, "label", PropertyValue::String(LABELS[label].to_string()))
            .unwrap();
        graph.connect(bitmap, "unique_filter_output", transform, "input1").unwrap();
        graph
            .connect(transform, "unique_filter_output", sink, "inputNodeOutput")
            .unwrap();

        if grayscale.get(row).copied().unwrap_or(false) {
            graph.set_input(bitmap, "colorswitch", PropertyValue::Bool(false)).unwrap();
        }
        if taps.get(row).copied().unwrap_or(false) {
            let levels = graph.instantiate(registry.get(library::LEVELS).unwrap(), Position::new(200.0, y + 150.0));
            graph.connect(bitmap, "unique_filter_output", levels, "input1").unwrap();
        }
        transforms.push((bitmap, transform, sink));
    }
    Built { graph, transforms }
}

fn assert_invariants(graph: &Graph) {
    let mut fed = HashSet::new();
    for connection in graph.connections() {
        assert!(graph.contains_node(connection.from_node), "dangling producer");
        assert!(graph.contains_node(connection.to_node), "dangling consumer");
        assert!(
            fed.insert((connection.to_node, connection.to_property.clone())),
            "input fed twice"
        );
    }
    assert!(graph.topological_order().is_ok(), "cycle");
}

fn graph_shape() -> impl Strategy<Value = (Vec<usize>, Vec<bool>, Vec<bool>)> {
    (1usize..6).prop_flat_map(|rows| {
        (
            prop::collection::vec(0..LABELS.len(), rows),
            prop::collection::vec(any::<bool>(), rows),
            prop::collection::vec(any::<bool>(), rows),
        )
    })
}

proptest! {
    #[test]
    fn delete_subchain_leaves_no_dangling_inputs(
        (labels, grayscale, taps) in graph_shape(),
        picks in prop::collection::vec(any::<bool>(), 40),
    ) {
        let registry = create_compositing_registry();
        let Built { mut graph, .. } = build(&registry, &labels, &grayscale, &taps);
        let doomed: Vec<NodeId> = graph
            .node_ids()
            .zip(picks.iter().cycle())
            .filter_map(|(id, &pick)| pick.then_some(id))
            .collect();
        let before = graph.node_count();

        let removed = GraphRewriter::new(&registry).delete_subchain(&mut graph, &doomed).unwrap();

        prop_assert_eq!(removed.len(), doomed.len());
        prop_assert_eq!(graph.node_count(), before - doomed.len());
        for id in &doomed {
            prop_assert!(graph.connections_for_node(*id).next().is_none());
        }
        assert_invariants(&graph);
    }

    #[test]
    fn splice_keeps_the_graph_acyclic(
        (labels, grayscale, taps) in graph_shape(),
        adapt in prop::collection::vec(any::<bool>(), 6),
    ) {
        let registry = create_compositing_registry();
        let Built { mut graph, transforms } = build(&registry, &labels, &grayscale, &taps);
        let rewriter = GraphRewriter::new(&registry);
        let before = graph.node_count();
        let mut adapters = 0;

        for (row, &(bitmap, transform, sink)) in transforms.iter().enumerate() {
            let outcome = rewriter
                .splice_replacement(&mut graph, transform, bitmap, sink, library::SAFE_TRANSFORM, adapt[row])
                .unwrap();
            prop_assert_eq!(outcome.adapter.is_some(), adapt[row]);
            adapters += usize::from(adapt[row]);
        }

        prop_assert_eq!(graph.node_count(), before + adapters);
        assert_invariants(&graph);
    }

    #[test]
    fn pipelines_preserve_invariants(
        (labels, grayscale, taps) in graph_shape(),
        count in 0usize..5,
    ) {
        let registry = create_compositing_registry();
        let Built { mut graph, transforms } = build(&registry, &labels, &grayscale, &taps);
        let session = Session::new(&registry, EngineConfig::default());

        session.prepare_material(&mut graph).unwrap();
        assert_invariants(&graph);

        let (source, _, _) = transforms[0];
        if graph.contains_node(source) {
            SubgraphReplicator::new(&registry)
                .replicate(&mut graph, source, count, &ProceduralSpread::default(), Position::default())
                .unwrap();
            assert_invariants(&graph);
        }

        // Cleanup on an already clean graph changes nothing structural
        let nodes = graph.node_count();
        let rewriter = GraphRewriter::new(&registry);
        texprep_engine::passes::cleanup::run(&mut graph, &rewriter, &ColorSwitchPolicy::default(), session.config());
        prop_assert_eq!(graph.node_count(), nodes);
    }
}
