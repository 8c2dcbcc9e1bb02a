// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generation of parametric subgraph families.

use crate::color::{ColorResolver, ResolvedColor};
use crate::error::{Result, RewriteError};
use crate::layout;
use crate::matcher;
use crate::report::PassReport;
use crate::rewriter::atomically;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use texprep_graph::{library, Graph, Node, NodeDefinition, NodeId, Position, PropertyValue, TemplateProvider};

/// Which nodes make up one replicated row, and how they are configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationTemplate {
    /// Constant color node type
    pub constant: String,
    /// Color input on the constant node
    pub constant_color: String,
    /// Match node template
    pub matcher: String,
    /// Match node input receiving the source
    pub matcher_content: String,
    /// Match node input receiving the constant color
    pub matcher_target: String,
    /// Inputs written on every match node
    pub matcher_settings: IndexMap<String, PropertyValue>,
    /// Output sink type
    pub sink: String,
    /// Prefix of the generated output identifiers
    pub identifier_prefix: String,
}

impl Default for ReplicationTemplate {
    fn default() -> Self {
        Self {
            constant: library::UNIFORM_COLOR.to_string(),
            constant_color: "outputcolor".to_string(),
            matcher: library::COLOR_MATCH.to_string(),
            matcher_content: "input".to_string(),
            matcher_target: "input_target_color".to_string(),
            // Match in the second target color space, unmasked
            matcher_settings: IndexMap::from([
                ("target_color_mode".to_string(), PropertyValue::Int(1)),
                ("use_mask".to_string(), PropertyValue::Bool(false)),
            ]),
            sink: library::OUTPUT_SINK.to_string(),
            identifier_prefix: "COL_".to_string(),
        }
    }
}

impl ReplicationTemplate {
    /// Identifier of the `index`-th replica (zero-based)
    pub fn identifier(&self, index: usize) -> String {
        format!("{}{}", self.identifier_prefix, index + 1)
    }
}

/// One generated replica
#[derive(Debug, Clone, PartialEq)]
pub struct OutputHandle {
    /// Export identifier of the sink
    pub identifier: String,
    /// Output sink
    pub sink: NodeId,
    /// Constant color node
    pub constant: NodeId,
    /// Match node
    pub matcher: NodeId,
    /// Color carried by the constant node
    pub color: ResolvedColor,
}

/// Instantiates replicated subgraphs from a shared source
pub struct SubgraphReplicator<'t> {
    templates: &'t dyn TemplateProvider,
    template: ReplicationTemplate,
}

impl<'t> SubgraphReplicator<'t> {
    /// Replicator using the default color-match rows
    pub fn new(templates: &'t dyn TemplateProvider) -> Self {
        Self {
            templates,
            template: ReplicationTemplate::default(),
        }
    }

    /// Use a different row template
    pub fn with_template(mut self, template: ReplicationTemplate) -> Self {
        self.template = template;
        self
    }

    fn resolve(&self, key: &str) -> Result<&'t NodeDefinition> {
        self.templates
            .resolve(key)
            .ok_or_else(|| RewriteError::TemplateUnresolved(key.to_string()))
    }

    /// Create `count` rows of constant color → match → output fed by `source`.
    ///
    /// Colors are resolved and identifiers checked before anything is
    /// created; a failure part-way restores the graph.
    pub fn replicate(
        &self,
        graph: &mut Graph,
        source: NodeId,
        count: usize,
        colors: &dyn ColorResolver,
        anchor: Position,
    ) -> Result<Vec<OutputHandle>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let source_output = graph
            .node(source)
            .ok_or_else(|| RewriteError::pattern(format!("source node {source} is not in the graph")))?
            .primary_output()
            .ok_or_else(|| RewriteError::pattern("source node has no output"))?
            .to_string();

        let t = &self.template;
        let constant_def = self.resolve(&t.constant)?;
        let matcher_def = self.resolve(&t.matcher)?;
        let sink_def = self.resolve(&t.sink)?;
        let constant_output = output_of(constant_def)?;
        let matcher_output = output_of(matcher_def)?;
        let sink_input = sink_def
            .primary_input()
            .ok_or_else(|| RewriteError::invariant(format!("'{}' has no image input", sink_def.id)))?;

        let colors = (0..count)
            .map(|i| colors.resolve(i, count))
            .collect::<Result<Vec<_>>>()?;

        let identifiers: Vec<String> = (0..count).map(|i| t.identifier(i)).collect();
        if let Some(taken) = identifiers
            .iter()
            .find(|id| matcher::find_output_by_identifier(graph, id).is_some())
        {
            return Err(RewriteError::invariant(format!("output identifier '{taken}' is already in use")));
        }

        let rows = layout::replica_rows(anchor, count);

        let handles = atomically(graph, |graph| {
            let mut handles = Vec::with_capacity(count);
            for ((identifier, color), row) in identifiers.into_iter().zip(colors).zip(rows) {
                let constant = graph.instantiate(constant_def, row.constant);
                graph.set_input(constant, &t.constant_color, PropertyValue::Color(color.rgba))?;

                let matcher = graph.instantiate(matcher_def, row.matcher);
                for (id, value) in &t.matcher_settings {
                    graph.set_input(matcher, id, value.clone())?;
                }
                graph.connect(source, &source_output, matcher, &t.matcher_content)?;
                graph.connect(constant, constant_output, matcher, &t.matcher_target)?;

                let sink = graph.instantiate(sink_def, row.sink);
                graph.connect(matcher, matcher_output, sink, sink_input)?;
                graph.set_annotation(sink, "identifier", PropertyValue::String(identifier.clone()))?;

                handles.push(OutputHandle {
                    identifier,
                    sink,
                    constant,
                    matcher,
                    color,
                });
            }
            Ok(handles)
        })?;

        tracing::info!("Replicated {} color variants", handles.len());
        Ok(handles)
    }

    /// Give every other bitmap its own output, named after its file
    pub fn expose_source_maps(&self, graph: &mut Graph, source: NodeId) -> PassReport {
        let mut report = PassReport::new("expose-maps");
        let sink_def = match self.resolve(&self.template.sink) {
            Ok(definition) => definition,
            Err(err) => return report.abort(err),
        };
        let Some(sink_input) = sink_def.primary_input() else {
            return report.abort(RewriteError::invariant(format!("'{}' has no image input", sink_def.id)));
        };

        for bitmap in matcher::find_nodes_by_type(graph, &[library::BITMAP]) {
            if bitmap == source {
                continue;
            }
            if let Err(err) = self.expose_one(graph, bitmap, sink_def, sink_input, &mut report) {
                report.skip(graph, bitmap, err);
            }
        }
        report
    }

    fn expose_one(
        &self,
        graph: &mut Graph,
        bitmap: NodeId,
        sink_def: &NodeDefinition,
        sink_input: &str,
        report: &mut PassReport,
    ) -> Result<()> {
        let node = graph.require(bitmap)?;
        let identifier = node
            .value("resource_path")
            .and_then(PropertyValue::as_str)
            .and_then(map_identifier)
            .ok_or_else(|| RewriteError::pattern(format!("'{}' has no resource path", node.label())))?;
        let output = output_of_node(node)?;
        let position = layout::beside(node.position, layout::MAP_OUTPUT_OFFSET);

        if matcher::find_output_by_identifier(graph, &identifier).is_some() {
            return Err(RewriteError::invariant(format!("output identifier '{identifier}' is already in use")));
        }

        let sink = atomically(graph, |graph| {
            let sink = graph.instantiate(sink_def, position);
            graph.connect(bitmap, &output, sink, sink_input)?;
            graph.set_annotation(sink, "identifier", PropertyValue::String(identifier.clone()))?;
            Ok(sink)
        })?;
        tracing::debug!("Exposed map '{identifier}'");
        report.created.push(sink);
        Ok(())
    }
}

fn output_of(definition: &NodeDefinition) -> Result<&str> {
    definition
        .primary_output()
        .ok_or_else(|| RewriteError::invariant(format!("'{}' has no output", definition.id)))
}

fn output_of_node(node: &Node) -> Result<String> {
    node.primary_output()
        .map(str::to_string)
        .ok_or_else(|| RewriteError::invariant(format!("'{}' has no output", node.label())))
}

/// Export identifier for a bitmap file: the last `-`-separated part of its stem, upper-cased
pub fn map_identifier(resource_path: &str) -> Option<String> {
    let stem = Path::new(resource_path).file_stem()?.to_str()?;
    let suffix = stem.rsplit('-').next()?.trim();
    if suffix.is_empty() {
        return None;
    }
    Some(suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorSpec, ExplicitList, ProceduralSpread};
    use crate::test_support::fixture;
    use texprep_graph::{NodeRegistry, Rgba};

    fn source(graph: &mut Graph, registry: &NodeRegistry) -> NodeId {
        graph.instantiate(registry.get(library::BITMAP).unwrap(), Position::new(0.0, 0.0))
    }

    #[test]
    fn test_replicate_builds_rows() {
        let (mut graph, registry) = fixture();
        let src = source(&mut graph, &registry);
        let replicator = SubgraphReplicator::new(&registry);

        let handles = replicator
            .replicate(&mut graph, src, 3, &ProceduralSpread::default(), Position::default())
            .unwrap();

        assert_eq!(handles.len(), 3);
        assert_eq!(graph.node_count(), 1 + 3 * 3);
        let ids: Vec<_> = handles.iter().map(|h| h.identifier.as_str()).collect();
        assert_eq!(ids, ["COL_1", "COL_2", "COL_3"]);

        for handle in &handles {
            let sink = graph.node(handle.sink).unwrap();
            assert_eq!(sink.identifier(), Some(handle.identifier.as_str()));
            assert_eq!(graph.incoming(handle.sink, "inputNodeOutput").unwrap().from_node, handle.matcher);
            assert_eq!(graph.incoming(handle.matcher, "input").unwrap().from_node, src);
            assert_eq!(
                graph.incoming(handle.matcher, "input_target_color").unwrap().from_node,
                handle.constant
            );
            let matcher = graph.node(handle.matcher).unwrap();
            assert_eq!(matcher.value("target_color_mode"), Some(&PropertyValue::Int(1)));
            assert_eq!(matcher.value("use_mask"), Some(&PropertyValue::Bool(false)));
            assert_eq!(
                graph.node(handle.constant).unwrap().value("outputcolor"),
                Some(&PropertyValue::Color(handle.color.rgba))
            );
        }
        assert_eq!(graph.outgoing(src, "unique_filter_output").count(), 3);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_replicate_zero_creates_nothing() {
        let (mut graph, registry) = fixture();
        let src = source(&mut graph, &registry);
        let replicator = SubgraphReplicator::new(&registry);

        let handles = replicator
            .replicate(&mut graph, src, 0, &ProceduralSpread::default(), Position::default())
            .unwrap();
        assert!(handles.is_empty());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_replicate_is_stable_across_runs() {
        let (mut first, registry) = fixture();
        let (mut second, _) = fixture();
        let a = source(&mut first, &registry);
        let b = source(&mut second, &registry);
        let replicator = SubgraphReplicator::new(&registry);
        let spread = ProceduralSpread::default();

        let one = replicator.replicate(&mut first, a, 4, &spread, Position::default()).unwrap();
        let two = replicator.replicate(&mut second, b, 4, &spread, Position::default()).unwrap();
        for (x, y) in one.iter().zip(&two) {
            assert_eq!(x.identifier, y.identifier);
            assert_eq!(x.color, y.color);
            assert_eq!(first.node(x.sink).unwrap().position, second.node(y.sink).unwrap().position);
        }
    }

    #[test]
    fn test_replicate_rejects_identifier_collision() {
        let (mut graph, registry) = fixture();
        let src = source(&mut graph, &registry);
        let replicator = SubgraphReplicator::new(&registry);
        let spread = ProceduralSpread::default();

        replicator.replicate(&mut graph, src, 2, &spread, Position::default()).unwrap();
        let before = graph.node_count();
        let err = replicator
            .replicate(&mut graph, src, 3, &spread, Position::new(0.0, 1000.0))
            .unwrap_err();
        assert!(matches!(err, RewriteError::InvariantViolation(_)));
        assert_eq!(graph.node_count(), before);
    }

    #[test]
    fn test_replicate_short_color_list_creates_nothing() {
        let (mut graph, registry) = fixture();
        let src = source(&mut graph, &registry);
        let replicator = SubgraphReplicator::new(&registry);
        let colors = ExplicitList::new(vec![ColorSpec::Rgba(Rgba::rgb(1.0, 0.0, 0.0))]);

        let err = replicator
            .replicate(&mut graph, src, 2, &colors, Position::default())
            .unwrap_err();
        assert!(matches!(err, RewriteError::ParameterMismatch(_)));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_replicate_missing_template() {
        let (mut graph, mut registry) = fixture();
        registry.unregister(library::COLOR_MATCH);
        let src = source(&mut graph, &registry);
        let replicator = SubgraphReplicator::new(&registry);

        let err = replicator
            .replicate(&mut graph, src, 2, &ProceduralSpread::default(), Position::default())
            .unwrap_err();
        assert_eq!(err, RewriteError::TemplateUnresolved(library::COLOR_MATCH.to_string()));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_map_identifier() {
        assert_eq!(map_identifier("textures/denim-twill-normal.png").as_deref(), Some("NORMAL"));
        assert_eq!(map_identifier("C:/scans/roughness.tif").as_deref(), Some("ROUGHNESS"));
        assert_eq!(map_identifier("fabric-.png"), None);
        assert_eq!(map_identifier(""), None);
    }

    #[test]
    fn test_expose_source_maps() {
        let (mut graph, registry) = fixture();
        let src = source(&mut graph, &registry);
        let bitmap = registry.get(library::BITMAP).unwrap();
        let normal = graph.instantiate(bitmap, Position::new(0.0, 300.0));
        graph
            .set_input(normal, "resource_path", PropertyValue::String("denim-normal.png".into()))
            .unwrap();
        let unnamed = graph.instantiate(bitmap, Position::new(0.0, 600.0));
        let replicator = SubgraphReplicator::new(&registry);

        let report = replicator.expose_source_maps(&mut graph, src);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].node, Some(unnamed));

        let sink = graph.node(report.created[0]).unwrap();
        assert_eq!(sink.identifier(), Some("NORMAL"));
        assert_eq!(sink.position, Position::new(200.0, 300.0));
        assert_eq!(graph.incoming(sink.id, "inputNodeOutput").unwrap().from_node, normal);
        assert!(graph.outgoing(src, "unique_filter_output").next().is_none());
    }
}
