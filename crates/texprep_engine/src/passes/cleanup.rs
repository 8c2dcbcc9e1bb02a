// SPDX-License-Identifier: MIT OR Apache-2.0
//! Removal of obsolete source chains and replacement of placeholder transforms.
//!
//! Runs in two phases. Phase 1 collects and deletes every obsolete output
//! together with its transform and bitmap; only once that removal is
//! complete does phase 2 splice safe transforms over the remaining
//! placeholders, so adapter decisions see the graph after phase 1.
//!
//! A transform or bitmap that still feeds a node outside the removal set is
//! kept and reported as a skip.

use crate::config::EngineConfig;
use crate::error::{Result, RewriteError};
use crate::layout::DEFAULT_ANCHOR;
use crate::matcher;
use crate::report::PassReport;
use crate::rewriter::{AdapterPolicy, GraphRewriter, RemovedNode, SpliceOutcome};
use texprep_graph::{library, Graph, NodeId, Position};

/// Pass name in reports
pub const NAME: &str = "cleanup";

/// What the cleanup pass did
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupOutcome {
    /// Pass report
    pub report: PassReport,
    /// Nodes deleted in phase 1
    pub removed: Vec<RemovedNode>,
    /// Splices made in phase 2
    pub splices: Vec<SpliceOutcome>,
    /// Where the displacement output goes
    pub displacement_anchor: Position,
}

/// Run both phases
pub fn run(
    graph: &mut Graph,
    rewriter: &GraphRewriter<'_>,
    policy: &dyn AdapterPolicy,
    config: &EngineConfig,
) -> CleanupOutcome {
    let mut outcome = CleanupOutcome {
        report: PassReport::new(NAME),
        removed: Vec::new(),
        splices: Vec::new(),
        displacement_anchor: DEFAULT_ANCHOR,
    };

    remove_obsolete(graph, rewriter, config, &mut outcome);
    if outcome.report.aborted.is_none() {
        replace_placeholders(graph, rewriter, policy, config, &mut outcome);
    }

    tracing::info!(
        "Cleanup removed {} nodes and spliced {} transforms",
        outcome.removed.len(),
        outcome.splices.len()
    );
    outcome
}

fn remove_obsolete(
    graph: &mut Graph,
    rewriter: &GraphRewriter<'_>,
    config: &EngineConfig,
    outcome: &mut CleanupOutcome,
) {
    let mut doomed = Vec::new();
    let mut anchor = None;

    for sink in matcher::find_outputs_by_label(graph, config.obsolete_outputs.as_slice()) {
        match source_chain(graph, sink, config) {
            Ok(chain) => {
                let node = graph.node(sink);
                if anchor.is_none() && node.is_some_and(|n| n.label() == config.anchor_label) {
                    anchor = node.map(|n| n.position);
                }
                doomed.extend(chain);
            }
            Err(err) => outcome.report.skip(graph, sink, err),
        }
    }

    loop {
        let Some((shared, consumer)) = doomed
            .iter()
            .find_map(|&id| outside_consumer(graph, id, &doomed).map(|consumer| (id, consumer)))
        else {
            break;
        };
        doomed.retain(|&id| id != shared);
        let consumer = graph.node(consumer).map_or_else(|| consumer.to_string(), |n| n.label().to_string());
        outcome
            .report
            .skip(graph, shared, RewriteError::invariant(format!("still feeds '{consumer}'")));
    }

    match rewriter.delete_subchain(graph, &doomed) {
        Ok(removed) => {
            outcome.report.removed.extend(removed.iter().map(|r| r.id));
            outcome.removed = removed;
        }
        Err(err) => outcome.report.skip_unit("obsolete outputs", err),
    }
    if let Some(anchor) = anchor {
        outcome.displacement_anchor = anchor;
    }
}

/// The sink, its placeholder transform and its bitmap
fn source_chain(graph: &Graph, sink: NodeId, config: &EngineConfig) -> Result<Vec<NodeId>> {
    let input = primary_input(graph, sink)?;
    let upstream = matcher::upstream_chain(graph, sink, &input, 2)?;
    let &[transform, bitmap] = upstream.as_slice() else {
        return Err(RewriteError::pattern("source chain is not two nodes long"));
    };
    expect_type(graph, transform, &config.placeholder_type)?;
    expect_type(graph, bitmap, library::BITMAP)?;
    Ok(vec![sink, transform, bitmap])
}

fn expect_type(graph: &Graph, node: NodeId, type_key: &str) -> Result<()> {
    let node = graph.require(node)?;
    if node.definition == type_key {
        Ok(())
    } else {
        Err(RewriteError::pattern(format!(
            "'{}' is a {}, not a {type_key}",
            node.label(),
            node.definition
        )))
    }
}

/// A node fed by `node` that is not itself being removed
fn outside_consumer(graph: &Graph, node: NodeId, doomed: &[NodeId]) -> Option<NodeId> {
    graph
        .connections()
        .find(|c| c.from_node == node && !doomed.contains(&c.to_node))
        .map(|c| c.to_node)
}

fn replace_placeholders(
    graph: &mut Graph,
    rewriter: &GraphRewriter<'_>,
    policy: &dyn AdapterPolicy,
    config: &EngineConfig,
    outcome: &mut CleanupOutcome,
) {
    for transform in matcher::find_nodes_by_type(graph, &[&config.placeholder_type]) {
        let splice = locate(graph, transform).and_then(|(producer, consumer)| {
            let adapt = policy.needs_adapter(graph, producer);
            rewriter.splice_replacement(graph, transform, producer, consumer, &config.safe_transform, adapt)
        });
        let splice = match splice {
            Ok(splice) => splice,
            Err(err) => {
                if outcome.report.absorb(graph, transform, err) {
                    continue;
                }
                return;
            }
        };

        outcome.report.removed.push(transform);
        outcome.report.created.push(splice.replacement);
        outcome.report.created.extend(splice.adapter);

        for (id, value) in &config.safe_transform_settings {
            if let Err(err) = graph.set_input(splice.replacement, id, value.clone()) {
                outcome.report.skip(graph, splice.replacement, err.into());
            }
        }
        outcome.splices.push(splice);
    }
}

/// Producer and first consumer of a placeholder; the splice rewires the rest
fn locate(graph: &Graph, transform: NodeId) -> Result<(NodeId, NodeId)> {
    let input = primary_input(graph, transform)?;
    let producer = matcher::find_upstream(graph, transform, &input, 1)?;
    let output = graph
        .require(transform)?
        .primary_output()
        .ok_or_else(|| RewriteError::pattern("placeholder has no output"))?
        .to_string();
    let (consumer, _) = matcher::find_downstream(graph, transform, &output)?;
    Ok((producer, consumer))
}

fn primary_input(graph: &Graph, node: NodeId) -> Result<String> {
    let node = graph.require(node)?;
    node.primary_input()
        .map(str::to_string)
        .ok_or_else(|| RewriteError::pattern(format!("'{}' has no image input", node.label())))
}
