// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export naming convention for output sinks.

use crate::config::EngineConfig;
use crate::matcher;
use crate::report::PassReport;
use crate::rewriter::{GraphRewriter, OutputTags};
use texprep_graph::{Graph, PropertyValue, Usage};

/// Pass name in reports
pub const NAME: &str = "naming";

/// Rename every output whose label has a channel code.
///
/// Label and identifier both become the code; group and usages are kept.
pub fn run(graph: &mut Graph, rewriter: &GraphRewriter<'_>, config: &EngineConfig) -> PassReport {
    let mut report = PassReport::new(NAME);
    let labels: Vec<&String> = config.channel_codes.keys().collect();

    for sink in matcher::find_outputs_by_label(graph, labels.as_slice()) {
        let Some(node) = graph.node(sink) else {
            continue;
        };
        let Some(code) = config.channel_codes.get(node.label()) else {
            continue;
        };
        let group = node
            .value("group")
            .and_then(PropertyValue::as_str)
            .unwrap_or_default()
            .to_string();
        let usages: Vec<Usage> = node
            .value("usages")
            .and_then(PropertyValue::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(|u| match u {
                PropertyValue::Usage(usage) => Some(usage.clone()),
                _ => None,
            })
            .collect();

        let mut tags = OutputTags::new(code, code).with_group(group);
        tags.usages = usages;
        match rewriter.tag_output(graph, sink, &tags) {
            Ok(()) => tracing::debug!("Named output '{code}'"),
            Err(err) => report.skip(graph, sink, err),
        }
    }
    report
}
