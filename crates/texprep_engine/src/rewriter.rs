// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph rewriting primitives.
//!
//! Each primitive either applies completely or leaves the graph as it found
//! it. A sequence of primitives is not atomic: earlier steps stay applied
//! when a later one fails.

use crate::error::{Result, RewriteError};
use crate::layout;
use crate::matcher;
use texprep_graph::{
    Graph, NodeDefinition, NodeId, Position, PropertyCategory, PropertyValue, TemplateProvider, Usage,
};

/// Decides whether a producer needs an adapter before a spliced replacement
pub trait AdapterPolicy {
    /// Whether to insert an adapter after `producer`
    fn needs_adapter(&self, graph: &Graph, producer: NodeId) -> bool;
}

impl<F> AdapterPolicy for F
where
    F: Fn(&Graph, NodeId) -> bool,
{
    fn needs_adapter(&self, graph: &Graph, producer: NodeId) -> bool {
        self(graph, producer)
    }
}

/// Adapts grayscale producers, read from the producer's color-mode switch.
///
/// The switch is `true` for color output. A producer without the switch is
/// treated as color, so no adapter is inserted.
#[derive(Debug, Clone)]
pub struct ColorSwitchPolicy {
    /// Boolean input holding the color mode
    pub property: String,
}

impl ColorSwitchPolicy {
    /// Policy reading the given boolean input
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

impl Default for ColorSwitchPolicy {
    fn default() -> Self {
        Self::new("colorswitch")
    }
}

impl AdapterPolicy for ColorSwitchPolicy {
    fn needs_adapter(&self, graph: &Graph, producer: NodeId) -> bool {
        graph
            .value(producer, &self.property, PropertyCategory::Input)
            .ok()
            .flatten()
            .and_then(PropertyValue::as_bool)
            .is_some_and(|color| !color)
    }
}

/// Annotations defining how an output sink is exported
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTags {
    /// Display label
    pub label: String,
    /// Export identifier, unique among outputs
    pub identifier: String,
    /// Group
    pub group: String,
    /// Usage tags
    pub usages: Vec<Usage>,
}

impl OutputTags {
    /// Tags with the given label and identifier, no group and no usages
    pub fn new(label: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identifier: identifier.into(),
            group: String::new(),
            usages: Vec::new(),
        }
    }

    /// Set the group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Add a usage tag
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usages.push(usage);
        self
    }
}

/// A node as it was just before removal
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    /// Former ID
    pub id: NodeId,
    /// Type key
    pub definition: String,
    /// Label
    pub label: String,
    /// Former position
    pub position: Position,
}

/// Result of a splice
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceOutcome {
    /// The node that was replaced
    pub removed: RemovedNode,
    /// Node instantiated from the template
    pub replacement: NodeId,
    /// Adapter between producer and replacement, if inserted
    pub adapter: Option<NodeId>,
    /// Upstream producer
    pub producer: NodeId,
    /// Downstream consumer
    pub consumer: NodeId,
    /// Consumer input now fed by the replacement
    pub consumer_input: String,
    /// Every input the removed node fed, now fed by the replacement
    pub rewired: Vec<(NodeId, String)>,
}

/// Run `op` against the graph, restoring the previous state if it fails
pub(crate) fn atomically<T>(graph: &mut Graph, op: impl FnOnce(&mut Graph) -> Result<T>) -> Result<T> {
    let snapshot = graph.clone();
    match op(graph) {
        Ok(value) => Ok(value),
        Err(err) => {
            *graph = snapshot;
            Err(err)
        }
    }
}

/// Applies delete, splice and tagging primitives
pub struct GraphRewriter<'t> {
    templates: &'t dyn TemplateProvider,
    adapter_type: String,
}

impl<'t> GraphRewriter<'t> {
    /// Create a rewriter using the default gradient adapter
    pub fn new(templates: &'t dyn TemplateProvider) -> Self {
        Self {
            templates,
            adapter_type: texprep_graph::library::GRADIENT.to_string(),
        }
    }

    /// Use a different adapter type
    pub fn with_adapter_type(mut self, key: impl Into<String>) -> Self {
        self.adapter_type = key.into();
        self
    }

    /// Resolve a template or fail with [`RewriteError::TemplateUnresolved`]
    pub fn template(&self, key: &str) -> Result<&'t NodeDefinition> {
        self.templates
            .resolve(key)
            .ok_or_else(|| RewriteError::TemplateUnresolved(key.to_string()))
    }

    /// Remove the nodes and every connection touching them
    pub fn delete_subchain(&self, graph: &mut Graph, nodes: &[NodeId]) -> Result<Vec<RemovedNode>> {
        let mut records = Vec::with_capacity(nodes.len());
        for &id in nodes {
            if records.iter().any(|r: &RemovedNode| r.id == id) {
                continue;
            }
            let node = graph
                .node(id)
                .ok_or_else(|| RewriteError::invariant(format!("cannot delete missing node {id}")))?;
            records.push(RemovedNode {
                id,
                definition: node.definition.clone(),
                label: node.label().to_string(),
                position: node.position,
            });
        }

        for record in &records {
            graph.remove_node(record.id);
            tracing::debug!("Deleted '{}' ({})", record.label, record.definition);
        }
        Ok(records)
    }

    /// Replace `removed` with a node from `template`, keeping producer and consumers wired.
    ///
    /// `consumer` must be fed by `removed`. Any other node fed by `removed` is
    /// rewired to the replacement as well.
    pub fn splice_replacement(
        &self,
        graph: &mut Graph,
        removed: NodeId,
        producer: NodeId,
        consumer: NodeId,
        template: &str,
        adapt: bool,
    ) -> Result<SpliceOutcome> {
        let definition = self.template(template)?;
        let adapter = if adapt {
            Some(self.template(&self.adapter_type)?)
        } else {
            None
        };

        let producer_output = graph
            .connections()
            .find(|c| c.from_node == producer && c.to_node == removed)
            .map(|c| c.from_property.clone())
            .ok_or_else(|| RewriteError::pattern(format!("node {producer} does not feed node {removed}")))?;
        let rewired: Vec<(NodeId, String)> = graph
            .connections()
            .filter(|c| c.from_node == removed)
            .map(|c| (c.to_node, c.to_property.clone()))
            .collect();
        let consumer_input = rewired
            .iter()
            .find(|(node, _)| *node == consumer)
            .map(|(_, input)| input.clone())
            .ok_or_else(|| RewriteError::pattern(format!("node {removed} does not feed node {consumer}")))?;

        let (replacement_input, replacement_output) = image_ports(definition)?;
        let adapter_ports = adapter.map(image_ports).transpose()?;

        atomically(graph, |graph| {
            let removed = self
                .delete_subchain(graph, &[removed])?
                .pop()
                .ok_or_else(|| RewriteError::invariant("splice removed nothing"))?;
            let replacement = graph.instantiate(definition, removed.position);

            let adapter_id = match (adapter, adapter_ports) {
                (Some(adapter), Some((adapter_input, adapter_output))) => {
                    let id = graph.instantiate(adapter, layout::adapter_position(removed.position));
                    graph.connect(producer, &producer_output, id, adapter_input)?;
                    graph.connect(id, adapter_output, replacement, replacement_input)?;
                    Some(id)
                }
                _ => {
                    graph.connect(producer, &producer_output, replacement, replacement_input)?;
                    None
                }
            };
            for (node, input) in &rewired {
                graph.connect(replacement, replacement_output, *node, input)?;
            }

            tracing::debug!(
                "Spliced '{}' over '{}' feeding {} input(s){}",
                definition.id,
                removed.label,
                rewired.len(),
                if adapter_id.is_some() { " with adapter" } else { "" }
            );

            Ok(SpliceOutcome {
                removed,
                replacement,
                adapter: adapter_id,
                producer,
                consumer,
                consumer_input: consumer_input.clone(),
                rewired: rewired.clone(),
            })
        })
    }

    /// Overwrite the export annotations of an output sink
    pub fn tag_output(&self, graph: &mut Graph, node: NodeId, tags: &OutputTags) -> Result<()> {
        let sink = graph
            .node(node)
            .ok_or_else(|| RewriteError::invariant(format!("cannot tag missing node {node}")))?;
        if !sink.is_output() {
            return Err(RewriteError::invariant(format!("'{}' is not an output", sink.label())));
        }
        if let Some(other) = matcher::find_output_by_identifier(graph, &tags.identifier) {
            if other != node {
                return Err(RewriteError::invariant(format!(
                    "output identifier '{}' is already in use",
                    tags.identifier
                )));
            }
        }

        atomically(graph, |graph| {
            graph.set_annotation(node, "label", PropertyValue::String(tags.label.clone()))?;
            graph.set_annotation(node, "identifier", PropertyValue::String(tags.identifier.clone()))?;
            graph.set_annotation(node, "group", PropertyValue::String(tags.group.clone()))?;
            let usages = tags.usages.iter().cloned().map(PropertyValue::Usage).collect();
            graph.set_annotation(node, "usages", PropertyValue::Array(usages))?;
            Ok(())
        })
    }
}

fn image_ports(definition: &NodeDefinition) -> Result<(&str, &str)> {
    let input = definition
        .primary_input()
        .ok_or_else(|| RewriteError::invariant(format!("template '{}' has no image input", definition.id)))?;
    let output = definition
        .primary_output()
        .ok_or_else(|| RewriteError::invariant(format!("template '{}' has no output", definition.id)))?;
    Ok((input, output))
}
