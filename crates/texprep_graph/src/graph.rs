// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and connections.

use crate::connection::{Connection, ConnectionId};
use crate::evaluation::Evaluation;
use crate::node::{Node, NodeDefinition, NodeId, Position};
use crate::property::{Property, PropertyCategory, PropertyValue, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Graph-level annotation holding the physical size of the material
pub const PHYSICAL_SIZE: &str = "physical_size";

/// A texture composite graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
    /// Graph-level annotations
    annotations: IndexMap<String, Property>,
    /// Bumped on every mutation
    #[serde(default)]
    revision: u64,
    /// Result of the last `compute`
    #[serde(skip)]
    pub(crate) evaluation: Option<Evaluation>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        let mut annotations = IndexMap::new();
        annotations.insert(
            PHYSICAL_SIZE.to_string(),
            Property::annotation(PHYSICAL_SIZE, ValueType::Float3),
        );

        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            annotations,
            revision: 0,
            evaluation: None,
        }
    }

    /// Mutation counter
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        self.touch();
        id
    }

    /// Create a node from a definition at the given position
    pub fn instantiate(&mut self, definition: &NodeDefinition, position: Position) -> NodeId {
        self.add_node(Node::new(definition).with_position(position))
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.shift_remove(&node_id)?;
        self.connections.retain(|_, c| !c.involves_node(node_id));
        self.touch();
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a node by ID or fail
    pub fn require(&self, node_id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))
    }

    /// Whether the node exists
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Move a node
    pub fn set_position(&mut self, node_id: NodeId, position: Position) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.position = position;
        self.touch();
        Ok(())
    }

    /// Read a property value, checking its category
    pub fn value(
        &self,
        node_id: NodeId,
        property: &str,
        category: PropertyCategory,
    ) -> Result<Option<&PropertyValue>, GraphError> {
        let node = self.require(node_id)?;
        let prop = Self::checked_property(node, property, category)?;
        Ok(prop.value.as_ref())
    }

    /// Write a property value, validated against the node's schema
    pub fn set_value(
        &mut self,
        node_id: NodeId,
        property: &str,
        category: PropertyCategory,
        value: PropertyValue,
    ) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let prop = node.properties.get_mut(property).ok_or_else(|| GraphError::PropertyNotFound {
            node: node_id,
            property: property.to_string(),
        })?;
        store_value(prop, category, value)?;
        self.touch();
        Ok(())
    }

    /// Write an input value
    pub fn set_input(&mut self, node_id: NodeId, property: &str, value: PropertyValue) -> Result<(), GraphError> {
        self.set_value(node_id, property, PropertyCategory::Input, value)
    }

    /// Write an annotation value
    pub fn set_annotation(&mut self, node_id: NodeId, property: &str, value: PropertyValue) -> Result<(), GraphError> {
        self.set_value(node_id, property, PropertyCategory::Annotation, value)
    }

    /// Read a graph-level annotation
    pub fn graph_annotation(&self, property: &str) -> Option<&PropertyValue> {
        self.annotations.get(property)?.value.as_ref()
    }

    /// Write a graph-level annotation
    pub fn set_graph_annotation(&mut self, property: &str, value: PropertyValue) -> Result<(), GraphError> {
        let prop = self
            .annotations
            .get_mut(property)
            .ok_or_else(|| GraphError::GraphPropertyNotFound(property.to_string()))?;
        store_value(prop, PropertyCategory::Annotation, value)?;
        self.touch();
        Ok(())
    }

    fn checked_property<'n>(
        node: &'n Node,
        property: &str,
        category: PropertyCategory,
    ) -> Result<&'n Property, GraphError> {
        let prop = node.property(property).ok_or_else(|| GraphError::PropertyNotFound {
            node: node.id,
            property: property.to_string(),
        })?;
        if prop.category != category {
            return Err(GraphError::CategoryMismatch {
                property: property.to_string(),
                expected: prop.category,
                found: category,
            });
        }
        Ok(prop)
    }

    /// Add a connection between an output and an input
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_property: &str,
        to_node: NodeId,
        to_property: &str,
    ) -> Result<ConnectionId, GraphError> {
        let source = self.require(from_node)?;
        let target = self.require(to_node)?;
        let source_prop = Self::checked_property(source, from_property, PropertyCategory::Output)?;
        let target_prop = Self::checked_property(target, to_property, PropertyCategory::Input)?;

        if !source_prop.can_connect(target_prop) {
            return Err(GraphError::IncompatibleProperties {
                from: from_property.to_string(),
                to: to_property.to_string(),
            });
        }

        if self.incoming(to_node, to_property).is_some() {
            return Err(GraphError::InputAlreadyConnected {
                node: to_node,
                property: to_property.to_string(),
            });
        }

        if from_node == to_node {
            return Err(GraphError::SelfLoop);
        }

        // The new edge closes a cycle iff the producer is already downstream of the consumer
        if self.reaches(to_node, from_node) {
            return Err(GraphError::CycleDetected);
        }

        let connection = Connection::new(from_node, from_property, to_node, to_property);
        let id = connection.id;
        self.connections.insert(id, connection);
        self.touch();
        Ok(id)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let removed = self.connections.shift_remove(&connection_id)?;
        self.touch();
        Some(removed)
    }

    /// Remove the connection feeding an input, if any
    pub fn disconnect_input(&mut self, node_id: NodeId, property: &str) -> Option<Connection> {
        let id = self.incoming(node_id, property)?.id;
        self.disconnect(id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// The single connection feeding an input
    pub fn incoming(&self, node_id: NodeId, property: &str) -> Option<&Connection> {
        self.connections.values().find(|c| c.feeds(node_id, property))
    }

    /// Connections leaving an output
    pub fn outgoing<'a>(&'a self, node_id: NodeId, property: &'a str) -> impl Iterator<Item = &'a Connection> {
        self.connections.values().filter(move |c| c.leaves(node_id, property))
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether `to` is reachable from `from` by following connections downstream
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.extend(
                self.connections
                    .values()
                    .filter(|c| c.from_node == current)
                    .map(|c| c.to_node),
            );
        }
        false
    }

    /// Get nodes in topological order (producers first)
    pub fn topological_order(&self) -> Result<Vec<NodeId>, GraphError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), GraphError> {
        if temp_mark.contains(&node_id) {
            return Err(GraphError::CycleDetected);
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit all nodes that this node depends on
        for connection in self.connections_for_node(node_id) {
            if connection.to_node == node_id {
                self.visit(connection.from_node, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }

    /// Check the structural invariants: endpoints exist, one connection per input, no cycles
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut fed = HashSet::new();
        for connection in self.connections.values() {
            self.require(connection.from_node)?;
            let target = self.require(connection.to_node)?;
            Self::checked_property(target, &connection.to_property, PropertyCategory::Input)?;
            if !fed.insert((connection.to_node, connection.to_property.as_str())) {
                return Err(GraphError::InputAlreadyConnected {
                    node: connection.to_node,
                    property: connection.to_property.clone(),
                });
            }
        }
        self.topological_order().map(|_| ())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn store_value(prop: &mut Property, category: PropertyCategory, value: PropertyValue) -> Result<(), GraphError> {
    if prop.category != category {
        return Err(GraphError::CategoryMismatch {
            property: prop.id.clone(),
            expected: prop.category,
            found: category,
        });
    }
    if !value.matches(&prop.value_type) {
        return Err(GraphError::TypeMismatch {
            property: prop.id.clone(),
            expected: prop.value_type.clone(),
            found: value.kind(),
        });
    }
    prop.value = Some(value);
    Ok(())
}

/// Error raised by graph operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Property not found on a node
    #[error("Property '{property}' not found on node {node}")]
    PropertyNotFound {
        /// Node that was searched
        node: NodeId,
        /// Missing property identifier
        property: String,
    },

    /// Graph-level property not found
    #[error("Graph property '{0}' not found")]
    GraphPropertyNotFound(String),

    /// Property addressed with the wrong category
    #[error("Property '{property}' is an {expected} property, not {found}")]
    CategoryMismatch {
        /// Property identifier
        property: String,
        /// Declared category
        expected: PropertyCategory,
        /// Category used by the caller
        found: PropertyCategory,
    },

    /// Value does not match the declared type
    #[error("Property '{property}' expects {expected}, got {found}")]
    TypeMismatch {
        /// Property identifier
        property: String,
        /// Declared type
        expected: ValueType,
        /// Kind of the rejected value
        found: &'static str,
    },

    /// Incompatible property types
    #[error("Cannot connect '{from}' to '{to}'")]
    IncompatibleProperties {
        /// Output identifier
        from: String,
        /// Input identifier
        to: String,
    },

    /// Input already has an incoming connection
    #[error("Input '{property}' on node {node} is already connected")]
    InputAlreadyConnected {
        /// Consuming node
        node: NodeId,
        /// Input identifier
        property: String,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Connection would create a cycle
    #[error("Graph contains a cycle")]
    CycleDetected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{self, create_compositing_registry};
    use crate::node::NodeRegistry;

    fn add(graph: &mut Graph, registry: &NodeRegistry, key: &str) -> NodeId {
        graph.instantiate(registry.get(key).unwrap(), Position::default())
    }

    #[test]
    fn test_connect_and_remove() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Test");
        let bitmap = add(&mut graph, &registry, library::BITMAP);
        let levels = add(&mut graph, &registry, library::LEVELS);

        graph.connect(bitmap, "unique_filter_output", levels, "input1").unwrap();
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.incoming(levels, "input1").unwrap().from_node, bitmap);

        graph.remove_node(bitmap);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.incoming(levels, "input1").is_none());
    }

    #[test]
    fn test_input_accepts_one_connection() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Test");
        let a = add(&mut graph, &registry, library::BITMAP);
        let b = add(&mut graph, &registry, library::BITMAP);
        let levels = add(&mut graph, &registry, library::LEVELS);

        graph.connect(a, "unique_filter_output", levels, "input1").unwrap();
        let err = graph.connect(b, "unique_filter_output", levels, "input1").unwrap_err();
        assert!(matches!(err, GraphError::InputAlreadyConnected { .. }));

        graph.disconnect_input(levels, "input1");
        graph.connect(b, "unique_filter_output", levels, "input1").unwrap();
    }

    #[test]
    fn test_output_fans_out() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Test");
        let bitmap = add(&mut graph, &registry, library::BITMAP);
        let first = add(&mut graph, &registry, library::LEVELS);
        let second = add(&mut graph, &registry, library::LEVELS);

        graph.connect(bitmap, "unique_filter_output", first, "input1").unwrap();
        graph.connect(bitmap, "unique_filter_output", second, "input1").unwrap();
        assert_eq!(graph.outgoing(bitmap, "unique_filter_output").count(), 2);
    }

    #[test]
    fn test_cycle_rejected() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Test");
        let a = add(&mut graph, &registry, library::LEVELS);
        let b = add(&mut graph, &registry, library::LEVELS);
        let c = add(&mut graph, &registry, library::LEVELS);

        graph.connect(a, "unique_filter_output", b, "input1").unwrap();
        graph.connect(b, "unique_filter_output", c, "input1").unwrap();
        let err = graph.connect(c, "unique_filter_output", a, "input1").unwrap_err();
        assert_eq!(err, GraphError::CycleDetected);
        assert_eq!(graph.connection_count(), 2);
        assert!(graph.validate().is_ok());

        let err = graph.connect(a, "unique_filter_output", a, "input1").unwrap_err();
        assert_eq!(err, GraphError::SelfLoop);
    }

    #[test]
    fn test_typed_property_writes() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Test");
        let safe = add(&mut graph, &registry, library::SAFE_TRANSFORM);

        graph.set_input(safe, "tile", PropertyValue::Int(4)).unwrap();
        assert_eq!(
            graph.value(safe, "tile", PropertyCategory::Input).unwrap(),
            Some(&PropertyValue::Int(4))
        );

        let err = graph.set_input(safe, "tile", PropertyValue::Float(4.0)).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { .. }));

        let err = graph.set_annotation(safe, "tile", PropertyValue::Int(4)).unwrap_err();
        assert!(matches!(err, GraphError::CategoryMismatch { .. }));

        let err = graph.set_input(safe, "missing", PropertyValue::Int(1)).unwrap_err();
        assert!(matches!(err, GraphError::PropertyNotFound { .. }));
    }

    #[test]
    fn test_annotations_cannot_be_connected() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Test");
        let bitmap = add(&mut graph, &registry, library::BITMAP);
        let sink = add(&mut graph, &registry, library::OUTPUT_SINK);

        let err = graph.connect(bitmap, "unique_filter_output", sink, "label").unwrap_err();
        assert!(matches!(err, GraphError::CategoryMismatch { .. }));
    }

    #[test]
    fn test_graph_annotation_typed() {
        let mut graph = Graph::new("Test");
        graph
            .set_graph_annotation(PHYSICAL_SIZE, PropertyValue::Float3([17.34, 17.34, 0.0]))
            .unwrap();
        assert!(graph.set_graph_annotation(PHYSICAL_SIZE, PropertyValue::Float(1.0)).is_err());
        assert!(graph.set_graph_annotation("missing", PropertyValue::Float(1.0)).is_err());
    }

    #[test]
    fn test_ron_snapshot_round_trip() {
        let registry = create_compositing_registry();
        let mut graph = Graph::new("Fabric");
        let bitmap = add(&mut graph, &registry, library::BITMAP);
        let sink = add(&mut graph, &registry, library::OUTPUT_SINK);
        graph.connect(bitmap, "unique_filter_output", sink, "inputNodeOutput").unwrap();

        let text = ron::ser::to_string_pretty(&graph, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: Graph = ron::from_str(&text).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.incoming(sink, "inputNodeOutput").unwrap().from_node, bitmap);
    }
}
