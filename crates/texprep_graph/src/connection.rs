// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A connection from an output property to an input property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Producing node
    pub from_node: NodeId,
    /// Output property on the producing node
    pub from_property: String,
    /// Consuming node
    pub to_node: NodeId,
    /// Input property on the consuming node
    pub to_property: String,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        from_node: NodeId,
        from_property: impl Into<String>,
        to_node: NodeId,
        to_property: impl Into<String>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            from_node,
            from_property: from_property.into(),
            to_node,
            to_property: to_property.into(),
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Check if this connection feeds the given input
    pub fn feeds(&self, node_id: NodeId, property: &str) -> bool {
        self.to_node == node_id && self.to_property == property
    }

    /// Check if this connection leaves the given output
    pub fn leaves(&self, node_id: NodeId, property: &str) -> bool {
        self.from_node == node_id && self.from_property == property
    }
}
