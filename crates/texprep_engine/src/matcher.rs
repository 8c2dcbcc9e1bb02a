// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural pattern matching over a graph.
//!
//! Scans return nodes in the graph's native order. Callers should only rely
//! on each match being visited once.

use crate::error::{Result, RewriteError};
use texprep_graph::{Graph, Node, NodeId, PropertyCategory};

/// Follow incoming connections upstream from `input` for `hops` hops.
///
/// The first hop follows `input`; each further hop follows the producer's
/// primary input. Returns the node reached by the last hop.
pub fn find_upstream(graph: &Graph, node: NodeId, input: &str, hops: usize) -> Result<NodeId> {
    let chain = upstream_chain(graph, node, input, hops)?;
    chain
        .last()
        .copied()
        .ok_or_else(|| RewriteError::pattern("upstream search with zero hops"))
}

/// Like [`find_upstream`], returning every node visited, nearest first.
pub fn upstream_chain(graph: &Graph, node: NodeId, input: &str, hops: usize) -> Result<Vec<NodeId>> {
    if hops == 0 {
        return Err(RewriteError::pattern("upstream search with zero hops"));
    }
    let start = graph
        .node(node)
        .ok_or_else(|| RewriteError::pattern(format!("node {node} is not in the graph")))?;
    if start.property_in(input, PropertyCategory::Input).is_none() {
        return Err(RewriteError::pattern(format!(
            "'{}' has no input '{input}'",
            start.label()
        )));
    }

    let mut chain = Vec::with_capacity(hops);
    let mut current = node;
    let mut port = input.to_string();
    for hop in 1..=hops {
        let connection = graph.incoming(current, &port).ok_or_else(|| {
            RewriteError::pattern(format!("nothing connected to '{port}' (hop {hop} of {hops})"))
        })?;
        current = connection.from_node;
        chain.push(current);

        if hop < hops {
            port = graph
                .node(current)
                .and_then(Node::primary_input)
                .ok_or_else(|| RewriteError::pattern(format!("chain ends after hop {hop} of {hops}")))?
                .to_string();
        }
    }
    Ok(chain)
}

/// Every node whose type key is in `type_keys`
pub fn find_nodes_by_type<S: AsRef<str>>(graph: &Graph, type_keys: &[S]) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|n| type_keys.iter().any(|key| key.as_ref() == n.definition))
        .map(|n| n.id)
        .collect()
}

/// Every output sink whose label is in `labels`
pub fn find_outputs_by_label<S: AsRef<str>>(graph: &Graph, labels: &[S]) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|n| n.is_output() && labels.iter().any(|label| label.as_ref() == n.label()))
        .map(|n| n.id)
        .collect()
}

/// The first output sink with the given label
pub fn find_output_by_label(graph: &Graph, label: &str) -> Result<NodeId> {
    graph
        .nodes()
        .find(|n| n.is_output() && n.label() == label)
        .map(|n| n.id)
        .ok_or_else(|| RewriteError::pattern(format!("no output labelled '{label}'")))
}

/// The output sink carrying an export identifier, if any
pub fn find_output_by_identifier(graph: &Graph, identifier: &str) -> Option<NodeId> {
    graph
        .nodes()
        .find(|n| n.is_output() && n.identifier() == Some(identifier))
        .map(|n| n.id)
}

/// The first consumer of `output`, with the input it feeds
pub fn find_downstream(graph: &Graph, node: NodeId, output: &str) -> Result<(NodeId, String)> {
    graph
        .outgoing(node, output)
        .next()
        .map(|c| (c.to_node, c.to_property.clone()))
        .ok_or_else(|| RewriteError::pattern(format!("nothing consumes '{output}' of node {node}")))
}
