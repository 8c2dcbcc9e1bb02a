// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions, node instances and the definition registry.

use crate::property::{Property, PropertyCategory, PropertyValue, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a node in the graph view. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Position {
    /// Create a position
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Position shifted by the given offsets
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Node category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Source nodes (bitmaps, uniform colors)
    Input,
    /// Output sinks
    Output,
    /// Atomic filters
    Filter,
    /// Instances of template resources
    Instance,
}

/// Node definition: type key, display name and property schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Stable type key
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Input properties
    pub inputs: Vec<Property>,
    /// Output properties
    pub outputs: Vec<Property>,
    /// Annotation properties
    pub annotations: Vec<Property>,
}

impl NodeDefinition {
    /// Identifier of the first image input
    pub fn primary_input(&self) -> Option<&str> {
        self.inputs
            .iter()
            .find(|p| p.value_type == ValueType::Image)
            .map(|p| p.id.as_str())
    }

    /// Identifier of the first output
    pub fn primary_output(&self) -> Option<&str> {
        self.outputs.first().map(|p| p.id.as_str())
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Definition type key
    pub definition: String,
    /// Definition display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Position in the graph view
    pub position: Position,
    /// Properties in schema order
    pub(crate) properties: IndexMap<String, Property>,
}

impl Node {
    /// Create a new node from a definition
    pub fn new(definition: &NodeDefinition) -> Self {
        let properties = definition
            .inputs
            .iter()
            .chain(&definition.outputs)
            .chain(&definition.annotations)
            .map(|p| (p.id.clone(), p.clone()))
            .collect();

        Self {
            id: NodeId::new(),
            definition: definition.id.clone(),
            name: definition.name.clone(),
            category: definition.category,
            position: Position::default(),
            properties,
        }
    }

    /// Set the position
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Get a property by identifier
    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.get(id)
    }

    /// Get a property by identifier, only if it has the given category
    pub fn property_in(&self, id: &str, category: PropertyCategory) -> Option<&Property> {
        self.property(id).filter(|p| p.category == category)
    }

    /// All properties in schema order
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Properties of one category
    pub fn properties_in(&self, category: PropertyCategory) -> impl Iterator<Item = &Property> {
        self.properties.values().filter(move |p| p.category == category)
    }

    /// Current value of a property, whatever its category
    pub fn value(&self, id: &str) -> Option<&PropertyValue> {
        self.property(id)?.value.as_ref()
    }

    /// Identifier of the first image input
    pub fn primary_input(&self) -> Option<&str> {
        self.properties_in(PropertyCategory::Input)
            .find(|p| p.value_type == ValueType::Image)
            .map(|p| p.id.as_str())
    }

    /// Identifier of the first output
    pub fn primary_output(&self) -> Option<&str> {
        self.properties_in(PropertyCategory::Output)
            .next()
            .map(|p| p.id.as_str())
    }

    /// The `label` annotation when set, otherwise the definition name
    pub fn label(&self) -> &str {
        self.property_in("label", PropertyCategory::Annotation)
            .and_then(|p| p.value.as_ref())
            .and_then(PropertyValue::as_str)
            .unwrap_or(&self.name)
    }

    /// The `identifier` annotation, if set
    pub fn identifier(&self) -> Option<&str> {
        self.property_in("identifier", PropertyCategory::Annotation)
            .and_then(|p| p.value.as_ref())
            .and_then(PropertyValue::as_str)
    }

    /// Whether this node is an output sink
    pub fn is_output(&self) -> bool {
        self.category == NodeCategory::Output
    }
}

/// Resolves template keys to instantiable node definitions
pub trait TemplateProvider {
    /// Look up a definition by key
    fn resolve(&self, key: &str) -> Option<&NodeDefinition>;
}

/// Registry of available node definitions and templates
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    /// Registered definitions by key
    definitions: IndexMap<String, NodeDefinition>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            definitions: IndexMap::new(),
        }
    }

    /// Register a definition, replacing any previous one with the same key
    pub fn register(&mut self, definition: NodeDefinition) {
        self.definitions.insert(definition.id.clone(), definition);
    }

    /// Remove a definition
    pub fn unregister(&mut self, key: &str) -> Option<NodeDefinition> {
        self.definitions.shift_remove(key)
    }

    /// Get a definition by key
    pub fn get(&self, key: &str) -> Option<&NodeDefinition> {
        self.definitions.get(key)
    }

    /// Get definitions by category
    pub fn definitions_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.values().filter(move |d| d.category == category)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateProvider for NodeRegistry {
    fn resolve(&self, key: &str) -> Option<&NodeDefinition> {
        self.get(key)
    }
}
