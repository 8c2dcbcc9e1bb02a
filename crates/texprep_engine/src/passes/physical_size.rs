// SPDX-License-Identifier: MIT OR Apache-2.0
//! Physical size of the material from its bitmap resolution.

use crate::config::EngineConfig;
use crate::error::RewriteError;
use crate::matcher;
use crate::report::PassReport;
use texprep_graph::{library, Graph, PropertyValue, PHYSICAL_SIZE};

/// Pass name in reports
pub const NAME: &str = "physical-size";

/// Edge length for a bitmap of `2^log2_size` pixels, rounded to two decimals
pub fn physical_size(log2_size: i32, pixels_per_unit: f32) -> f32 {
    let pixels = 2f64.powi(log2_size);
    let size = pixels / f64::from(pixels_per_unit);
    ((size * 100.0).round() / 100.0) as f32
}

/// Set the graph's physical size annotation from the last bitmap found
pub fn run(graph: &mut Graph, config: &EngineConfig) -> PassReport {
    let mut report = PassReport::new(NAME);

    let Some(bitmap) = matcher::find_nodes_by_type(graph, &[library::BITMAP]).pop() else {
        report.skip_unit(PHYSICAL_SIZE, RewriteError::pattern("graph has no bitmap"));
        return report;
    };
    let Some([width, _]) = graph
        .node(bitmap)
        .and_then(|n| n.value("$outputsize"))
        .and_then(PropertyValue::as_int2)
    else {
        report.skip(graph, bitmap, RewriteError::pattern("bitmap has no output size"));
        return report;
    };

    let size = physical_size(width, config.pixels_per_unit);
    if let Err(err) = graph.set_graph_annotation(PHYSICAL_SIZE, PropertyValue::Float3([size, size, 0.0])) {
        report.skip_unit(PHYSICAL_SIZE, err.into());
        return report;
    }
    tracing::info!("Physical size set to {size}");
    report
}
