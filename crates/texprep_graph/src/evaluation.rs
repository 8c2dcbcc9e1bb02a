// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compute checkpoints.
//!
//! The host re-evaluates cached results on `compute`. Here that means
//! validating the graph and recording the order nodes would be evaluated in,
//! stamped with the revision it was computed at.

use crate::graph::{Graph, GraphError};
use crate::node::NodeId;

/// Result of a compute checkpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Nodes in evaluation order, producers first
    pub order: Vec<NodeId>,
    /// Graph revision the order was computed at
    pub revision: u64,
}

impl Graph {
    /// Validate the graph and record a fresh evaluation order
    pub fn compute(&mut self) -> Result<&Evaluation, GraphError> {
        self.validate()?;
        let order = self.topological_order()?;
        let revision = self.revision();
        Ok(self.evaluation.insert(Evaluation { order, revision }))
    }

    /// Whether the last evaluation reflects the current revision
    pub fn is_computed(&self) -> bool {
        self.evaluation
            .as_ref()
            .is_some_and(|e| e.revision == self.revision())
    }
}

#[cfg(test)]
mod tests {
    use crate::library::{self, create_compositing_registry};
    use crate::{Graph, Position};

    #[test]
    fn test_compute_orders_producers_first() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Test");
        let sink = graph.instantiate(registry.get(library::OUTPUT_SINK).unwrap(), Position::default());
        let bitmap = graph.instantiate(registry.get(library::BITMAP).unwrap(), Position::default());
        graph.connect(bitmap, "unique_filter_output", sink, "inputNodeOutput").unwrap();

        let order = &graph.compute().unwrap().order;
        assert_eq!(order, &[bitmap, sink]);
        assert!(graph.is_computed());

        graph.set_position(sink, Position::new(10.0, 0.0)).unwrap();
        assert!(!graph.is_computed());
    }
}
