// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end pipelines over one graph.

use crate::color::ColorResolver;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::passes::{cleanup, displacement, naming, physical_size};
use crate::replicator::{OutputHandle, SubgraphReplicator};
use crate::report::{PassReport, SessionReport};
use crate::rewriter::{ColorSwitchPolicy, GraphRewriter};
use texprep_graph::{Graph, NodeId, Position, TemplateProvider};

/// Parameters of a color mix
#[derive(Debug, Clone, PartialEq)]
pub struct MixRequest {
    /// Node whose output feeds every replica
    pub source: NodeId,
    /// Number of replicas
    pub count: usize,
    /// Replication anchor, the source position when unset
    pub anchor: Option<Position>,
    /// Give the other bitmaps their own outputs as well
    pub expose_maps: bool,
}

impl MixRequest {
    /// Mix `count` variants of `source`
    pub fn new(source: NodeId, count: usize) -> Self {
        Self {
            source,
            count,
            anchor: None,
            expose_maps: true,
        }
    }
}

/// Result of a color mix
#[derive(Debug, Clone, PartialEq)]
pub struct MixOutcome {
    /// Pass reports
    pub report: SessionReport,
    /// Generated replicas
    pub outputs: Vec<OutputHandle>,
}

/// Runs the preparation and mixing pipelines with one configuration
pub struct Session<'t> {
    templates: &'t dyn TemplateProvider,
    config: EngineConfig,
}

impl<'t> Session<'t> {
    /// Create a session
    pub fn new(templates: &'t dyn TemplateProvider, config: EngineConfig) -> Self {
        Self { templates, config }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rewriter using the configured adapter
    pub fn rewriter(&self) -> GraphRewriter<'t> {
        GraphRewriter::new(self.templates).with_adapter_type(&self.config.adapter_type)
    }

    /// Replicator using the configured row template
    pub fn replicator(&self) -> SubgraphReplicator<'t> {
        SubgraphReplicator::new(self.templates).with_template(self.config.replication.clone())
    }

    /// Physical size, cleanup, displacement and naming, between two computes
    pub fn prepare_material(&self, graph: &mut Graph) -> Result<SessionReport> {
        graph.compute()?;
        let rewriter = self.rewriter();
        let policy = ColorSwitchPolicy::new(&self.config.adapter_switch);
        let mut report = SessionReport::default();

        report.passes.push(physical_size::run(graph, &self.config));

        let outcome = cleanup::run(graph, &rewriter, &policy, &self.config);
        let anchor = outcome.displacement_anchor;
        report.passes.push(outcome.report);

        report
            .passes
            .push(displacement::run(graph, &rewriter, &self.config, anchor));
        report.passes.push(naming::run(graph, &rewriter, &self.config));

        graph.compute()?;
        log_summary(&graph.name, &report);
        Ok(report)
    }

    /// Physical size alone, between two computes
    pub fn adjust_size(&self, graph: &mut Graph) -> Result<SessionReport> {
        graph.compute()?;
        let report = SessionReport {
            passes: vec![physical_size::run(graph, &self.config)],
        };
        graph.compute()?;
        log_summary(&graph.name, &report);
        Ok(report)
    }

    /// Replicate `request.source` into color variants, then expose the other maps.
    ///
    /// Replication either creates every row or nothing; its failure is returned
    /// as an error before any other change is made.
    pub fn mix_colors(
        &self,
        graph: &mut Graph,
        request: &MixRequest,
        colors: &dyn ColorResolver,
    ) -> Result<MixOutcome> {
        graph.compute()?;
        let anchor = match request.anchor {
            Some(anchor) => anchor,
            None => graph.require(request.source)?.position,
        };
        let replicator = self.replicator();

        let outputs = replicator.replicate(graph, request.source, request.count, colors, anchor)?;
        let mut replicate = PassReport::new("replicate");
        for handle in &outputs {
            replicate
                .created
                .extend([handle.constant, handle.matcher, handle.sink]);
        }

        let mut report = SessionReport {
            passes: vec![replicate],
        };
        if request.expose_maps {
            report
                .passes
                .push(replicator.expose_source_maps(graph, request.source));
        }

        graph.compute()?;
        log_summary(&graph.name, &report);
        Ok(MixOutcome { report, outputs })
    }
}

fn log_summary(graph: &str, report: &SessionReport) {
    let skipped = report.skips().count();
    if skipped > 0 {
        tracing::warn!("'{graph}': {skipped} item(s) skipped");
    }
    for pass in report.aborted() {
        if let Some(err) = &pass.aborted {
            tracing::warn!("'{graph}': {} stopped early: {err}", pass.name);
        }
    }
    tracing::info!("'{graph}': {} passes finished", report.passes.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ProceduralSpread;
    use crate::error::RewriteError;
    use crate::test_support::{chain_to_output, fixture};
    use texprep_graph::{PropertyValue, PHYSICAL_SIZE};

    #[test]
    fn test_prepare_material_runs_every_pass() {
        let (mut graph, registry) = fixture();
        chain_to_output(&mut graph, &registry, "Height", 300.0);
        chain_to_output(&mut graph, &registry, "Normal", 0.0);
        chain_to_output(&mut graph, &registry, "Base Color", 600.0);
        let session = Session::new(&registry, EngineConfig::default());

        let report = session.prepare_material(&mut graph).unwrap();
        let names: Vec<_> = report.passes.iter().map(|p| p.name).collect();
        assert_eq!(names, ["physical-size", "cleanup", "displacement", "naming"]);
        assert!(report.is_clean(), "{report:?}");
        assert!(graph.is_computed());

        let mut codes: Vec<_> = graph.nodes().filter_map(|n| n.identifier()).collect();
        codes.sort_unstable();
        assert_eq!(codes, ["BASE", "DISP", "NRM"]);
    }

    #[test]
    fn test_adjust_size_touches_only_the_annotation() {
        let (mut graph, registry) = fixture();
        let (bitmap, _, _) = chain_to_output(&mut graph, &registry, "Height", 0.0);
        graph.set_input(bitmap, "$outputsize", PropertyValue::Int2([12, 12])).unwrap();
        let session = Session::new(&registry, EngineConfig::default());

        let report = session.adjust_size(&mut graph).unwrap();
        assert_eq!(report.passes.len(), 1);
        assert!(report.is_clean());
        assert_eq!(
            graph.graph_annotation(PHYSICAL_SIZE),
            Some(&PropertyValue::Float3([17.34, 17.34, 0.0]))
        );
        // Obsolete outputs are left for the full preparation
        assert_eq!(graph.node_count(), 3);
        assert!(graph.is_computed());
    }

    #[test]
    fn test_mix_colors() {
        let (mut graph, registry) = fixture();
        let (bitmap, _, _) = chain_to_output(&mut graph, &registry, "Base Color", 0.0);
        let session = Session::new(&registry, EngineConfig::default());

        let outcome = session
            .mix_colors(&mut graph, &MixRequest::new(bitmap, 2), &ProceduralSpread::default())
            .unwrap();
        assert_eq!(outcome.outputs.len(), 2);
        assert_eq!(outcome.report.pass("replicate").map(|p| p.created.len()), Some(6));
        // The only bitmap is the source, so nothing else is exposed
        assert_eq!(outcome.report.pass("expose-maps").map(|p| p.created.len()), Some(0));
        assert!(graph.is_computed());
    }

    #[test]
    fn test_mix_colors_unknown_source() {
        let (mut graph, registry) = fixture();
        let session = Session::new(&registry, EngineConfig::default());

        let err = session
            .mix_colors(&mut graph, &MixRequest::new(NodeId::new(), 2), &ProceduralSpread::default())
            .unwrap_err();
        assert!(matches!(err, RewriteError::InvariantViolation(_)));
        assert_eq!(graph.node_count(), 0);
    }
}
