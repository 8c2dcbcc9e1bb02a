// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph fixtures shared by the unit tests.

use texprep_graph::library::{self, create_compositing_registry};
use texprep_graph::{Graph, NodeId, NodeRegistry, Position, PropertyValue};

/// An empty graph and the built-in registry
pub(crate) fn fixture() -> (Graph, NodeRegistry) {
    (Graph::new("fixture"), create_compositing_registry())
}

/// bitmap → transform → output sink labelled `label`, laid out on row `y`
pub(crate) fn chain_to_output(
    graph: &mut Graph,
    registry: &NodeRegistry,
    label: &str,
    y: f32,
) -> (NodeId, NodeId, NodeId) {
    let bitmap = graph.instantiate(registry.get(library::BITMAP).unwrap(), Position::new(0.0, y));
    let transform = graph.instantiate(registry.get(library::TRANSFORM_2D).unwrap(), Position::new(200.0, y));
    let sink = graph.instantiate(registry.get(library::OUTPUT_SINK).unwrap(), Position::new(400.0, y));
    graph
        .set_annotation(sink, "label", PropertyValue::String(label.to_string()))
        .unwrap();
    graph
        .connect(bitmap, "unique_filter_output", transform, "input1")
        .unwrap();
    graph
        .connect(transform, "unique_filter_output", sink, "inputNodeOutput")
        .unwrap();
    (bitmap, transform, sink)
}
