// SPDX-License-Identifier: MIT OR Apache-2.0
//! Displacement output derived from the normal map.

use crate::config::EngineConfig;
use crate::error::{Result, RewriteError};
use crate::layout;
use crate::matcher;
use crate::report::PassReport;
use crate::rewriter::{atomically, GraphRewriter, OutputTags};
use texprep_graph::{library, Graph, NodeDefinition, NodeId, Position, Usage};

/// Pass name in reports
pub const NAME: &str = "displacement";

/// Nodes created for the displacement output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementChain {
    /// Normal intensity node between the producer and its consumers
    pub normal_intensity: NodeId,
    /// Normal to height node
    pub normal_to_height: NodeId,
    /// New displacement output
    pub displacement: NodeId,
}

/// Build normal intensity → normal to height → displacement output.
///
/// Looks the normal output and its producer up before creating anything,
/// so a graph without them is reported and left untouched.
pub fn run(
    graph: &mut Graph,
    rewriter: &GraphRewriter<'_>,
    config: &EngineConfig,
    anchor: Position,
) -> PassReport {
    let mut report = PassReport::new(NAME);
    match build(graph, rewriter, config, anchor) {
        Ok(chain) => {
            tracing::info!("Displacement output created");
            report
                .created
                .extend([chain.normal_intensity, chain.normal_to_height, chain.displacement]);
            report
        }
        Err(err) if err.is_fatal() => report.abort(err),
        Err(err) => {
            report.skip_unit(config.normal_label.as_str(), err);
            report
        }
    }
}

fn build(
    graph: &mut Graph,
    rewriter: &GraphRewriter<'_>,
    config: &EngineConfig,
    anchor: Position,
) -> Result<DisplacementChain> {
    let normal = matcher::find_output_by_label(graph, &config.normal_label)?;
    let normal_node = graph.require(normal)?;
    let normal_position = normal_node.position;
    let normal_input = normal_node
        .primary_input()
        .ok_or_else(|| RewriteError::pattern("normal output has no input"))?
        .to_string();
    let feed = graph
        .incoming(normal, &normal_input)
        .ok_or_else(|| RewriteError::pattern("nothing feeds the normal output"))?;
    let (producer, producer_output) = (feed.from_node, feed.from_property.clone());
    let producer_position = graph.require(producer)?.position;

    let intensity_def = rewriter.template(&config.normal_intensity)?;
    let height_def = rewriter.template(&config.normal_to_height)?;
    let sink_def = rewriter.template(library::OUTPUT_SINK)?;
    let (intensity_in, intensity_out) = ports(intensity_def)?;
    let (height_in, height_out) = ports(height_def)?;
    let sink_in = sink_def
        .primary_input()
        .ok_or_else(|| RewriteError::invariant("output sink has no input"))?;

    let tags = &config.displacement;
    let tags = OutputTags::new(&tags.label, &tags.identifier)
        .with_group(&tags.group)
        .with_usage(Usage::new(&tags.usage, &tags.components));
    let placement = layout::displacement_layout(anchor, normal_position, producer_position);

    atomically(graph, |graph| {
        let normal_intensity = graph.instantiate(intensity_def, placement.normal_intensity);
        let normal_to_height = graph.instantiate(height_def, placement.normal_to_height);
        let displacement = graph.instantiate(sink_def, placement.displacement);
        rewriter.tag_output(graph, displacement, &tags)?;

        graph.disconnect_input(normal, &normal_input);
        graph.connect(producer, &producer_output, normal_intensity, intensity_in)?;
        graph.connect(normal_intensity, intensity_out, normal, &normal_input)?;
        graph.connect(normal_intensity, intensity_out, normal_to_height, height_in)?;
        graph.connect(normal_to_height, height_out, displacement, sink_in)?;

        for (id, value) in &config.normal_to_height_settings {
            graph.set_input(normal_to_height, id, value.clone())?;
        }
        graph.set_position(normal, placement.normal_output)?;

        Ok(DisplacementChain {
            normal_intensity,
            normal_to_height,
            displacement,
        })
    })
}

fn ports(definition: &NodeDefinition) -> Result<(&str, &str)> {
    let input = definition
        .primary_input()
        .ok_or_else(|| RewriteError::invariant(format!("'{}' has no image input", definition.id)))?;
    let output = definition
        .primary_output()
        .ok_or_else(|| RewriteError::invariant(format!("'{}' has no output", definition.id)))?;
    Ok((input, output))
}
