// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pass outcomes surfaced to the caller.

use crate::error::RewriteError;
use std::fmt;
use texprep_graph::{Graph, NodeId};

/// A unit of work a pass could not process
#[derive(Debug, Clone, PartialEq)]
pub struct Skip {
    /// Node the failure concerns, when there is one
    pub node: Option<NodeId>,
    /// Human-readable name of what was skipped
    pub label: String,
    /// Why it was skipped
    pub error: RewriteError,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.label, self.error)
    }
}

/// What one pass did
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Pass name
    pub name: &'static str,
    /// Nodes created
    pub created: Vec<NodeId>,
    /// Nodes removed
    pub removed: Vec<NodeId>,
    /// Units of work skipped
    pub skipped: Vec<Skip>,
    /// Fatal error that stopped the pass early
    pub aborted: Option<RewriteError>,
}

impl PassReport {
    /// Empty report for the named pass
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            created: Vec::new(),
            removed: Vec::new(),
            skipped: Vec::new(),
            aborted: None,
        }
    }

    /// Record a skipped node, labelled from the graph if it still exists
    pub fn skip(&mut self, graph: &Graph, node: NodeId, error: RewriteError) {
        let label = graph
            .node(node)
            .map_or_else(|| node.to_string(), |n| n.label().to_string());
        tracing::warn!("Skipped '{label}' in {}: {error}", self.name);
        self.skipped.push(Skip {
            node: Some(node),
            label,
            error,
        });
    }

    /// Record a skip that concerns no particular node
    pub fn skip_unit(&mut self, label: impl Into<String>, error: RewriteError) {
        let label = label.into();
        tracing::warn!("Skipped '{label}' in {}: {error}", self.name);
        self.skipped.push(Skip {
            node: None,
            label,
            error,
        });
    }

    /// Stop the pass with a fatal error
    pub fn abort(mut self, error: RewriteError) -> Self {
        tracing::warn!("Aborted {}: {error}", self.name);
        self.aborted = Some(error);
        self
    }

    /// Record an error: fatal ones abort, the rest become skips.
    /// Returns `false` when the pass must stop.
    pub fn absorb(&mut self, graph: &Graph, node: NodeId, error: RewriteError) -> bool {
        if error.is_fatal() {
            tracing::warn!("Aborted {}: {error}", self.name);
            self.aborted = Some(error);
            false
        } else {
            self.skip(graph, node, error);
            true
        }
    }

    /// Whether the pass ran to the end without skips
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.aborted.is_none()
    }
}

/// Reports of every pass run by a session pipeline, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    /// Pass reports
    pub passes: Vec<PassReport>,
}

impl SessionReport {
    /// Report of the named pass
    pub fn pass(&self, name: &str) -> Option<&PassReport> {
        self.passes.iter().find(|p| p.name == name)
    }

    /// Every skip across all passes
    pub fn skips(&self) -> impl Iterator<Item = &Skip> {
        self.passes.iter().flat_map(|p| &p.skipped)
    }

    /// Passes that stopped early
    pub fn aborted(&self) -> impl Iterator<Item = &PassReport> {
        self.passes.iter().filter(|p| p.aborted.is_some())
    }

    /// Whether every pass completed without skips
    pub fn is_clean(&self) -> bool {
        self.passes.iter().all(PassReport::is_clean)
    }
}
